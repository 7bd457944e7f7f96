// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use dpicheck::errors::{ProbeError, ProbeResult};
use dpicheck::transfer::{Control, ProgressHook, Transfer, TransferOutcome, TransferRequest};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_body_response(len: usize) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(vec![b'a'; len])
        .append_header("content-type", "application/octet-stream")
}

pub fn create_suite_response(document: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(document)
        .append_header("content-type", "text/plain")
}

pub fn suite_document(entries: &[(&str, &str, u32)]) -> String {
    let records: Vec<String> = entries
        .iter()
        .map(|(id, url, times)| {
            format!(
                "  {{ id: \"{}\", provider: \"Mock\", url: \"{}\", times: {} }}",
                id, url, times
            )
        })
        .collect();
    format!("const TEST_SUITE = [\n{}\n];\n", records.join(",\n"))
}

/// Output sink the reporter can own while the test keeps reading it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Simulated transfer: waits `delay`, then delivers `bytes` in 16 KiB
/// chunks while honoring the hook. Tracks peak concurrency.
pub struct SimulatedTransfer {
    pub delay: Duration,
    pub bytes: usize,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl SimulatedTransfer {
    pub fn new(delay: Duration, bytes: usize) -> Self {
        Self {
            delay,
            bytes,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Transfer for SimulatedTransfer {
    async fn fetch_text(&self, url: &str) -> ProbeResult<String> {
        Err(ProbeError::Fetch(format!("offline: {}", url)))
    }

    async fn perform<H: ProgressHook>(&self, _request: &TransferRequest, hook: &H) -> TransferOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        hook.on_status(200);

        let mut outcome = TransferOutcome::Completed;
        let mut sent = 0;
        while sent < self.bytes {
            let chunk = (self.bytes - sent).min(16 * 1024);
            hook.on_data(chunk);
            sent += chunk;
            if hook.on_progress() == Control::Abort {
                outcome = TransferOutcome::AbortedByCallback;
                break;
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
