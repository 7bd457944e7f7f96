// File: report.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::executor::ProbeReport;
use crate::stats::RunStats;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: String,
    pub suite_url: &'a str,
    pub timeout_ms: u64,
    pub threshold_bytes: u64,
    pub stats: &'a RunStats,
    pub probes: &'a [ProbeReport],
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate_json(report: &RunReport<'_>) -> Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| anyhow::anyhow!("Failed to serialize report to JSON: {}", e))
    }

    pub fn write_json_report(report: &RunReport<'_>, output_path: &Path) -> Result<()> {
        let json = Self::generate_json(report)?;
        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Diagnosis;
    use tempfile::TempDir;

    fn probe(id: &str) -> ProbeReport {
        ProbeReport {
            id: id.to_string(),
            provider: "Hetzner".to_string(),
            url: "https://h.example/100MB.bin?t=00ff".to_string(),
            http_code: 200,
            received: 70000,
            diagnosis: Diagnosis::NotDetected,
            detail: "Early abort: threshold reached".to_string(),
            elapsed_ms: 42.0,
            aborted_by_threshold: true,
        }
    }

    #[test]
    fn test_write_json_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let mut stats = RunStats::new();
        stats.set_launched(1);
        stats.record(Diagnosis::NotDetected);
        let probes = vec![probe("HZ-01")];
        let report = RunReport {
            generated_at: "2025-01-01T00:00:00Z".to_string(),
            suite_url: "https://suite.example/",
            timeout_ms: 5000,
            threshold_bytes: 65536,
            stats: &stats,
            probes: &probes,
        };

        ReportGenerator::write_json_report(&report, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["probes"][0]["id"], "HZ-01");
        assert_eq!(value["probes"][0]["diagnosis"], "NotDetected");
        assert_eq!(value["stats"]["by_diagnosis"]["NotDetected"], 1);
        assert_eq!(value["threshold_bytes"], 65536);
    }

    #[test]
    fn test_write_json_report_bad_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let stats = RunStats::new();
        let report = RunReport {
            generated_at: String::new(),
            suite_url: "",
            timeout_ms: 0,
            threshold_bytes: 0,
            stats: &stats,
            probes: &[],
        };

        assert!(ReportGenerator::write_json_report(&report, &path).is_err());
    }
}
