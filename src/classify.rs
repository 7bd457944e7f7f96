// File: classify.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::OK_THRESHOLD_BYTES;
use crate::transfer::TransferOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Diagnosis {
    NotDetected,
    PossiblyDetected,
    ProbablyDetected,
    Detected,
    Inconclusive,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 5] = [
        Diagnosis::NotDetected,
        Diagnosis::PossiblyDetected,
        Diagnosis::ProbablyDetected,
        Diagnosis::Detected,
        Diagnosis::Inconclusive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Diagnosis::NotDetected => "Not detected",
            Diagnosis::PossiblyDetected => "Possibly detected",
            Diagnosis::ProbablyDetected => "Detected (probable)",
            Diagnosis::Detected => "Detected",
            Diagnosis::Inconclusive => "Failed to complete",
        }
    }

    /// True for outcomes that point at interference on the path.
    pub fn is_interference(&self) -> bool {
        matches!(self, Diagnosis::ProbablyDetected | Diagnosis::Detected)
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub diagnosis: Diagnosis,
    pub detail: String,
}

impl Classification {
    fn new(diagnosis: Diagnosis, detail: impl Into<String>) -> Self {
        Self {
            diagnosis,
            detail: detail.into(),
        }
    }
}

/// Maps one transfer's telemetry to a diagnosis. Pure: equal inputs always
/// give equal outputs.
pub fn classify(outcome: &TransferOutcome, received: u64, aborted_by_threshold: bool) -> Classification {
    match outcome {
        TransferOutcome::Completed if received >= OK_THRESHOLD_BYTES => {
            Classification::new(Diagnosis::NotDetected, "Received >= threshold")
        }
        TransferOutcome::Completed => {
            Classification::new(Diagnosis::PossiblyDetected, "Stream ended, data too small")
        }
        TransferOutcome::TimedOut if received == 0 => Classification::new(
            Diagnosis::ProbablyDetected,
            "Timeout with zero bytes (likely connection blocked)",
        ),
        TransferOutcome::TimedOut => Classification::new(
            Diagnosis::Detected,
            "Timeout after partial data (read blocked)",
        ),
        TransferOutcome::AbortedByCallback if aborted_by_threshold => {
            Classification::new(Diagnosis::NotDetected, "Early abort: threshold reached")
        }
        TransferOutcome::AbortedByCallback => {
            Classification::new(Diagnosis::Detected, "Unexpected abort before threshold")
        }
        TransferOutcome::Failed(reason) => {
            Classification::new(Diagnosis::Inconclusive, format!("transport error: {}", reason))
        }
    }
}
