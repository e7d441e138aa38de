//! Scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{Transport, TransportError};
use crate::http::{HttpRequest, HttpResponse};

/// Transport that replays queued responses in order and records every request.
///
/// Sending with an empty queue fails with [`TransportError::Unavailable`].
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Creates a transport with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with a raw body.
    pub fn push(&self, status: u16, body: impl Into<String>) {
        let body: String = body.into();
        let response = HttpResponse::new(status, body);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Queues a response with a JSON body.
    pub fn push_json(&self, status: u16, body: &Value) {
        self.push(status, body.to_string());
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let description = format!("{} {}", request.method, request.url);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| TransportError::Unavailable(format!("no scripted response for {description}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let mock = MockTransport::new();
        mock.push(201, "first");
        mock.push(200, "second");

        let first = mock.send(HttpRequest::post("http://x/a")).await.unwrap();
        let second = mock.send(HttpRequest::get("http://x/a/1")).await.unwrap();
        assert_eq!((first.status, first.text().as_str()), (201, "first"));
        assert_eq!((second.status, second.text().as_str()), (200, "second"));
        assert_eq!(mock.requests().len(), 2);
        assert!(mock.send(HttpRequest::get("http://x")).await.is_err());
    }
}
