// File: runner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ConfigParameter;
use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::executor::ProbeExecutor;
use crate::report::{ReportGenerator, RunReport};
use crate::reporter::{Reporter, RunTotals, MAIN_PREFIX};
use crate::stats::{now_millis, RunStats};
use crate::suite::{LoadOutcome, TestSuite};
use crate::transfer::Transfer;
use log::{info, warn};
use std::sync::Arc;

pub const FINISHED_MARKER: &str = "All tests finished.";

#[derive(Debug)]
pub struct BatchOutcome {
    pub load: LoadOutcome,
    pub suite: TestSuite,
    pub summary: DispatchSummary,
    pub stats: RunStats,
}

/// One full batch: refresh the suite, probe every attempt, print the
/// summary and the final marker, then write the optional JSON report.
pub async fn run_batch<T: Transfer>(
    transfer: Arc<T>,
    config: &ConfigParameter,
    mut suite: TestSuite,
    reporter: Reporter,
) -> BatchOutcome {
    let load = suite.load_from_url(transfer.as_ref(), config.suite_url()).await;
    info!(
        "Running {} tests ({} attempts), timeout {} ms",
        suite.len(),
        suite.attempt_count(),
        config.timeout_ms()
    );

    let start_time = now_millis();
    let executor = ProbeExecutor::new(transfer, reporter.handle(), config);
    let summary = Dispatcher::new(executor).work(suite.tests()).await;
    let end_time = now_millis();

    let handle = reporter.handle();
    handle.summary(RunTotals {
        launched: summary.launched as u64,
        failed_tasks: summary.failed_tasks as u64,
        start_time,
        end_time,
    });
    handle.message(MAIN_PREFIX, FINISHED_MARKER);
    drop(handle);
    let stats = reporter.finish().await;

    if let Some(path) = config.report_path() {
        let report = RunReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            suite_url: config.suite_url(),
            timeout_ms: config.timeout_ms(),
            threshold_bytes: config.threshold_bytes(),
            stats: &stats,
            probes: &summary.reports,
        };
        match ReportGenerator::write_json_report(&report, path) {
            Ok(()) => info!("Report written to {}", path.display()),
            Err(e) => warn!("Could not write report: {:#}", e),
        }
    }

    BatchOutcome {
        load,
        suite,
        summary,
        stats,
    }
}
