// File: transfer.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ConfigParameter;
use crate::errors::{ProbeError, ProbeResult};
use log::{debug, trace};
use std::future::Future;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const FETCH_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Abort,
}

/// Callbacks a transfer drives while the body arrives.
pub trait ProgressHook: Send + Sync {
    fn on_status(&self, code: u16);
    fn on_data(&self, len: usize);
    /// Polled before the first read and after every chunk.
    fn on_progress(&self) -> Control;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    TimedOut,
    AbortedByCallback,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub url: String,
    pub timeout: Duration,
    pub stall_timeout: Option<Duration>,
}

pub trait Transfer: Send + Sync + 'static {
    /// Plain GET returning the body as text. Redirects are followed.
    fn fetch_text(&self, url: &str) -> impl Future<Output = ProbeResult<String>> + Send;

    /// Bounded GET that reports every chunk to `hook` and stops as soon as
    /// the hook asks for it. Redirects are not followed.
    fn perform<H: ProgressHook>(
        &self,
        request: &TransferRequest,
        hook: &H,
    ) -> impl Future<Output = TransferOutcome> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTransfer {
    probe_client: reqwest::Client,
    fetch_client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new(config: &ConfigParameter) -> ProbeResult<Self> {
        let probe_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent())
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProbeError::ClientBuild(e.to_string()))?;

        let fetch_client = reqwest::Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ProbeError::ClientBuild(e.to_string()))?;

        Ok(Self {
            probe_client,
            fetch_client,
        })
    }

    async fn drive<H: ProgressHook>(&self, request: &TransferRequest, hook: &H) -> TransferOutcome {
        if hook.on_progress() == Control::Abort {
            return TransferOutcome::AbortedByCallback;
        }

        let mut response = match self.probe_client.get(&request.url).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };
        hook.on_status(response.status().as_u16());
        trace!("{} answered {}", request.url, response.status());

        loop {
            if hook.on_progress() == Control::Abort {
                return TransferOutcome::AbortedByCallback;
            }

            let next = match request.stall_timeout {
                Some(window) => match tokio::time::timeout(window, response.chunk()).await {
                    Ok(next) => next,
                    Err(_) => {
                        debug!("{} stalled for {:?}", request.url, window);
                        return TransferOutcome::TimedOut;
                    }
                },
                None => response.chunk().await,
            };

            match next {
                Ok(Some(chunk)) => hook.on_data(chunk.len()),
                Ok(None) => return TransferOutcome::Completed,
                Err(e) => return classify_error(&e),
            }
        }
    }
}

impl Transfer for HttpTransfer {
    async fn fetch_text(&self, url: &str) -> ProbeResult<String> {
        let response = self
            .fetch_client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Fetch(error_chain(&e)))?;

        let response = response
            .error_for_status()
            .map_err(|e| ProbeError::Fetch(error_chain(&e)))?;

        response
            .text()
            .await
            .map_err(|e| ProbeError::Fetch(error_chain(&e)))
    }

    async fn perform<H: ProgressHook>(&self, request: &TransferRequest, hook: &H) -> TransferOutcome {
        match tokio::time::timeout(request.timeout, self.drive(request, hook)).await {
            Ok(outcome) => outcome,
            Err(_) => TransferOutcome::TimedOut,
        }
    }
}

fn classify_error(error: &reqwest::Error) -> TransferOutcome {
    if error.is_timeout() {
        TransferOutcome::TimedOut
    } else {
        TransferOutcome::Failed(error_chain(error))
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct CountingHook {
        status: AtomicU16,
        bytes: AtomicUsize,
        stop_after: Option<usize>,
    }

    impl ProgressHook for CountingHook {
        fn on_status(&self, code: u16) {
            self.status.store(code, Ordering::SeqCst);
        }

        fn on_data(&self, len: usize) {
            self.bytes.fetch_add(len, Ordering::SeqCst);
        }

        fn on_progress(&self) -> Control {
            match self.stop_after {
                Some(limit) if self.bytes.load(Ordering::SeqCst) >= limit => Control::Abort,
                _ => Control::Continue,
            }
        }
    }

    fn request(url: String, timeout_ms: u64) -> TransferRequest {
        TransferRequest {
            url,
            timeout: Duration::from_millis(timeout_ms),
            stall_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_perform_completes_and_counts_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 1000]))
            .mount(&server)
            .await;

        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let hook = CountingHook::default();
        let outcome = transfer
            .perform(&request(format!("{}/blob", server.uri()), 2000), &hook)
            .await;

        assert_eq!(outcome, TransferOutcome::Completed);
        assert_eq!(hook.bytes.load(Ordering::SeqCst), 1000);
        assert_eq!(hook.status.load(Ordering::SeqCst), 200);
    }

    #[tokio::test]
    async fn test_perform_does_not_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(
                ResponseTemplate::new(301).append_header("location", format!("{}/blob", server.uri())),
            )
            .mount(&server)
            .await;

        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let hook = CountingHook::default();
        let outcome = transfer
            .perform(&request(format!("{}/moved", server.uri()), 2000), &hook)
            .await;

        assert_eq!(outcome, TransferOutcome::Completed);
        assert_eq!(hook.status.load(Ordering::SeqCst), 301);
    }

    #[tokio::test]
    async fn test_perform_times_out_with_status_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let hook = CountingHook::default();
        let outcome = transfer.perform(&request(server.uri(), 100), &hook).await;

        assert_eq!(outcome, TransferOutcome::TimedOut);
        assert_eq!(hook.bytes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_perform_aborts_when_hook_asks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 256 * 1024]))
            .mount(&server)
            .await;

        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let hook = CountingHook {
            stop_after: Some(1),
            ..CountingHook::default()
        };
        let outcome = transfer.perform(&request(server.uri(), 2000), &hook).await;

        assert_eq!(outcome, TransferOutcome::AbortedByCallback);
        assert!(hook.bytes.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_perform_reports_connection_failure() {
        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let hook = CountingHook::default();
        let outcome = transfer
            .perform(&request("http://127.0.0.1:1/".to_string(), 2000), &hook)
            .await;

        assert!(matches!(outcome, TransferOutcome::Failed(_)));
        assert_eq!(hook.status.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_text_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).append_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("suite body"))
            .mount(&server)
            .await;

        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let body = transfer.fetch_text(&format!("{}/old", server.uri())).await.unwrap();
        assert_eq!(body, "suite body");
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let transfer = HttpTransfer::new(&ConfigParameter::new()).unwrap();
        let result = transfer.fetch_text(&server.uri()).await;
        assert!(matches!(result, Err(ProbeError::Fetch(_))));
    }
}
