// File: dispatch.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::executor::{ProbeExecutor, ProbeReport};
use crate::suite::TestCase;
use crate::transfer::Transfer;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub launched: usize,
    pub reports: Vec<ProbeReport>,
    pub failed_tasks: usize,
}

/// Fans out one task per (test, repetition) with no concurrency cap and
/// joins all of them before returning.
pub struct Dispatcher<T: Transfer> {
    executor: ProbeExecutor<T>,
}

impl<T: Transfer> Dispatcher<T> {
    pub fn new(executor: ProbeExecutor<T>) -> Self {
        Self { executor }
    }

    pub async fn work(&self, tests: &[TestCase]) -> DispatchSummary {
        let mut futures = FuturesUnordered::new();

        for test in tests {
            if test.times == 0 {
                debug!("Skipping {}: zero repetitions", test.id);
                continue;
            }
            let test = Arc::new(test.clone());
            for index in 0..test.times {
                let executor = self.executor.clone();
                let test = Arc::clone(&test);
                futures.push(tokio::spawn(async move { executor.run(&test, index).await }));
            }
        }

        let mut summary = DispatchSummary {
            launched: futures.len(),
            ..DispatchSummary::default()
        };
        debug!("Dispatched {} probe tasks", summary.launched);

        while let Some(joined) = futures.next().await {
            match joined {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    error!("Probe task did not complete: {}", e);
                    summary.failed_tasks += 1;
                }
            }
        }

        summary
    }
}
