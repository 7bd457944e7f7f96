// File: executor.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::classify::{classify, Diagnosis};
use crate::config::ConfigParameter;
use crate::errors::{ProbeError, ProbeResult};
use crate::reporter::ReportHandle;
use crate::suite::TestCase;
use crate::transfer::{Control, ProgressHook, Transfer, TransferOutcome, TransferRequest};
use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use url::Url;

/// Cancellation signal handed into a transfer. Cloned handles share state.
/// The threshold check cancels it; any other holder may cancel it too.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    cancelled: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-attempt telemetry written by the transfer callbacks.
///
/// `received` is the only byte counter of an attempt; the data path adds to
/// it and the progress path compares it against the threshold.
#[derive(Debug)]
pub struct ProgressSink {
    received: AtomicU64,
    http_code: AtomicU16,
    aborted_by_threshold: AtomicBool,
    threshold: u64,
    token: AbortToken,
}

impl ProgressSink {
    pub fn new(threshold: u64, token: AbortToken) -> Self {
        Self {
            received: AtomicU64::new(0),
            http_code: AtomicU16::new(0),
            aborted_by_threshold: AtomicBool::new(false),
            threshold,
            token,
        }
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Acquire)
    }

    pub fn http_code(&self) -> u16 {
        self.http_code.load(Ordering::Acquire)
    }

    pub fn aborted_by_threshold(&self) -> bool {
        self.aborted_by_threshold.load(Ordering::Acquire)
    }
}

impl ProgressHook for ProgressSink {
    fn on_status(&self, code: u16) {
        self.http_code.store(code, Ordering::Release);
    }

    fn on_data(&self, len: usize) {
        self.received.fetch_add(len as u64, Ordering::AcqRel);
    }

    fn on_progress(&self) -> Control {
        if self.received() >= self.threshold {
            self.aborted_by_threshold.store(true, Ordering::Release);
            self.token.cancel();
            return Control::Abort;
        }
        if self.token.is_cancelled() {
            return Control::Abort;
        }
        Control::Continue
    }
}

/// Finished, read-only record of one probe attempt.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub id: String,
    pub provider: String,
    pub url: String,
    pub http_code: u16,
    pub received: u64,
    pub diagnosis: Diagnosis,
    pub detail: String,
    pub elapsed_ms: f64,
    pub aborted_by_threshold: bool,
}

impl ProbeReport {
    pub fn status(&self) -> &'static str {
        self.diagnosis.label()
    }
}

/// Short per-attempt value for the `t` query parameter. Not collision-proof.
pub fn cache_bust_token(id: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let digest = Sha256::digest(format!("{}{}", id, nanos).as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

/// Appends `t=<token>` to `raw` after checking that it is an http(s) URL.
/// The text of `raw` is kept as written; a fragment stays last.
pub fn cache_busted_url(raw: &str, token: &str) -> ProbeResult<String> {
    let raw = raw.trim();
    let url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProbeError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            raw
        )));
    }

    let (base, fragment) = raw.split_at(raw.find('#').unwrap_or(raw.len()));
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    Ok(format!("{}{}t={}{}", base, separator, token, fragment))
}

pub struct ProbeExecutor<T: Transfer> {
    transfer: Arc<T>,
    reporter: ReportHandle,
    timeout: Duration,
    stall_timeout: Option<Duration>,
    threshold: u64,
}

impl<T: Transfer> Clone for ProbeExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transfer: Arc::clone(&self.transfer),
            reporter: self.reporter.clone(),
            timeout: self.timeout,
            stall_timeout: self.stall_timeout,
            threshold: self.threshold,
        }
    }
}

impl<T: Transfer> ProbeExecutor<T> {
    pub fn new(transfer: Arc<T>, reporter: ReportHandle, config: &ConfigParameter) -> Self {
        Self {
            transfer,
            reporter,
            timeout: config.timeout(),
            stall_timeout: config.stall_timeout(),
            threshold: config.threshold_bytes(),
        }
    }

    pub async fn run(&self, test: &TestCase, index: u32) -> ProbeReport {
        self.run_with_token(test, index, AbortToken::new()).await
    }

    /// Runs exactly one transfer for repetition `index` of `test` and
    /// reports exactly one result. A URL that cannot be probed is reported
    /// as a transport failure without touching the network.
    pub async fn run_with_token(&self, test: &TestCase, index: u32, token: AbortToken) -> ProbeReport {
        let id = test.attempt_id(index);

        let url = match cache_busted_url(&test.url, &cache_bust_token(&id)) {
            Ok(url) => url,
            Err(e) => {
                debug!("{} not probed: {}", id, e);
                let classification = classify(&TransferOutcome::Failed(e.to_string()), 0, false);
                let report = ProbeReport {
                    id,
                    provider: test.provider.clone(),
                    url: test.url.clone(),
                    http_code: 0,
                    received: 0,
                    diagnosis: classification.diagnosis,
                    detail: classification.detail,
                    elapsed_ms: 0.0,
                    aborted_by_threshold: false,
                };
                self.reporter.finished(report.clone());
                return report;
            }
        };

        let request = TransferRequest {
            url: url.clone(),
            timeout: self.timeout,
            stall_timeout: self.stall_timeout,
        };
        let sink = ProgressSink::new(self.threshold, token);

        self.reporter.started(&id, &url);
        let start = Instant::now();
        let outcome = self.transfer.perform(&request, &sink).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!("{} finished with {:?} after {:.1} ms", id, outcome, elapsed_ms);

        let classification = classify(&outcome, sink.received(), sink.aborted_by_threshold());
        let report = ProbeReport {
            id,
            provider: test.provider.clone(),
            url,
            http_code: sink.http_code(),
            received: sink.received(),
            diagnosis: classification.diagnosis,
            detail: classification.detail,
            elapsed_ms,
            aborted_by_threshold: sink.aborted_by_threshold(),
        };

        self.reporter.finished(report.clone());
        report
    }
}
