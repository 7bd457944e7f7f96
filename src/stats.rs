// File: stats.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::classify::Diagnosis;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    launched: u64,
    failed_tasks: u64,
    reported: u64,
    messages: u64,
    by_diagnosis: BTreeMap<Diagnosis, u64>,
    start_time: u64,
    end_time: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnosis: Diagnosis) {
        self.reported += 1;
        *self.by_diagnosis.entry(diagnosis).or_insert(0) += 1;
    }

    pub fn add_message(&mut self) {
        self.messages += 1;
    }

    pub fn set_launched(&mut self, launched: u64) {
        self.launched = launched;
    }

    pub fn launched(&self) -> u64 {
        self.launched
    }

    pub fn set_failed_tasks(&mut self, failed_tasks: u64) {
        self.failed_tasks = failed_tasks;
    }

    pub fn failed_tasks(&self) -> u64 {
        self.failed_tasks
    }

    pub fn reported(&self) -> u64 {
        self.reported
    }

    pub fn messages(&self) -> u64 {
        self.messages
    }

    pub fn count(&self, diagnosis: Diagnosis) -> u64 {
        self.by_diagnosis.get(&diagnosis).copied().unwrap_or(0)
    }

    pub fn interference_count(&self) -> u64 {
        self.by_diagnosis
            .iter()
            .filter(|(d, _)| d.is_interference())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn set_start_time(&mut self, start_time: u64) {
        self.start_time = start_time;
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn set_end_time(&mut self, end_time: u64) {
        self.end_time = end_time;
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    pub fn summary_line(&self) -> String {
        let counts: Vec<String> = Diagnosis::ALL
            .iter()
            .map(|d| format!("{}: {}", d.label(), self.count(*d)))
            .collect();
        format!(
            "{} probes, {} reported, {} lost. Started at {} / Ended at {}. {} ms. {}. Interference signals: {}.",
            self.launched,
            self.reported,
            self.failed_tasks,
            human_readable_time(self.start_time),
            human_readable_time(self.end_time),
            self.elapsed_ms(),
            counts.join(", "),
            self.interference_count()
        )
    }
}

pub fn now_millis() -> u64 {
    Local::now().timestamp_millis().max(0) as u64
}

fn human_readable_time(millis: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut stats = RunStats::new();
        stats.record(Diagnosis::NotDetected);
        stats.record(Diagnosis::Detected);
        stats.record(Diagnosis::Detected);
        stats.record(Diagnosis::ProbablyDetected);
        stats.add_message();

        assert_eq!(stats.reported(), 4);
        assert_eq!(stats.count(Diagnosis::Detected), 2);
        assert_eq!(stats.count(Diagnosis::Inconclusive), 0);
        assert_eq!(stats.interference_count(), 3);
        assert_eq!(stats.messages(), 1);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let mut stats = RunStats::new();
        stats.set_start_time(2000);
        stats.set_end_time(1500);
        assert_eq!(stats.elapsed_ms(), 0);

        stats.set_end_time(2750);
        assert_eq!(stats.elapsed_ms(), 750);
    }

    #[test]
    fn test_summary_line_lists_every_diagnosis() {
        let mut stats = RunStats::new();
        stats.set_launched(2);
        stats.record(Diagnosis::NotDetected);
        let line = stats.summary_line();

        assert!(line.starts_with("2 probes, 1 reported, 0 lost."));
        for diagnosis in Diagnosis::ALL {
            assert!(line.contains(diagnosis.label()));
        }
        assert!(line.contains("Not detected: 1"));
        assert!(line.ends_with("Interference signals: 0."));
    }
}
