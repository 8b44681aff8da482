#![allow(dead_code)]

use async_trait::async_trait;
use observable_loaders::app::ports::{HttpClientPort, HttpResponse};
use observable_loaders::error::{LoaderError, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded outbound request
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Serves scripted replies in order; once the script runs out every
/// request fails as a refused connection.
#[derive(Default)]
pub struct ScriptedHttp {
    replies: Mutex<VecDeque<Result<HttpResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse {
            status,
            bytes: body.to_string().into_bytes(),
        }))
    }

    pub fn status(self, status: u16, times: usize) -> Self {
        (0..times).fold(self, |s, _| s.reply(status, Value::Null))
    }

    pub fn refuse(self) -> Self {
        self.push(Err(refused()))
    }

    fn push(self, reply: Result<HttpResponse>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(call);
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Err(refused()))
    }
}

fn refused() -> LoaderError {
    LoaderError::Transport {
        message: "connection refused".to_string(),
        timed_out: false,
    }
}

#[async_trait]
impl HttpClientPort for ScriptedHttp {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse> {
        self.next(Call {
            url: url.to_string(),
            query: query.to_vec(),
            body: None,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        self.next(Call {
            url: url.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        })
    }
}

/// `{"resultType": "vector"}` response with a single sample
pub fn prometheus_vector(value: &str) -> Value {
    serde_json::json!({
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": [{"metric": {}, "value": [1_700_000_000.0, value]}]
        }
    })
}
