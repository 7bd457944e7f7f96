// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::path::PathBuf;
use std::time::Duration;

/// Bytes that must arrive before a path is considered clean.
pub const OK_THRESHOLD_BYTES: u64 = 64 * 1024;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_SUITE_URL: &str =
    "https://raw.githubusercontent.com/hyperion-cs/dpi-checkers/refs/heads/main/ru/tcp-16-20/suite.json";

pub const SUITE_URL_ENV: &str = "DPICHECK_SUITE_URL";
pub const REPORT_PATH_ENV: &str = "DPICHECK_REPORT";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ConfigParameter {
    timeout_ms: u64,
    suite_url: String,
    user_agent: String,
    report_path: Option<PathBuf>,
    inline_progress: bool,
}

impl Default for ConfigParameter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParameter {
    pub fn new() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            suite_url: DEFAULT_SUITE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            report_path: None,
            inline_progress: false,
        }
    }

    /// Applies `DPICHECK_*` overrides through `lookup` (usually the process
    /// environment). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SUITE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.suite_url = url.trim().to_string();
        }
        if let Some(path) = lookup(REPORT_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.report_path = Some(PathBuf::from(path.trim()));
        }
    }

    pub fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Low-speed window: a body that delivers nothing for this long is
    /// treated as timed out. Whole seconds of the timeout, none below 1 s.
    pub fn stall_timeout(&self) -> Option<Duration> {
        match self.timeout_ms / 1000 {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn threshold_bytes(&self) -> u64 {
        OK_THRESHOLD_BYTES
    }

    pub fn set_suite_url(&mut self, suite_url: String) {
        self.suite_url = suite_url;
    }

    pub fn suite_url(&self) -> &str {
        &self.suite_url
    }

    pub fn set_user_agent(&mut self, user_agent: String) {
        self.user_agent = user_agent;
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_report_path(&mut self, report_path: Option<PathBuf>) {
        self.report_path = report_path;
    }

    pub fn report_path(&self) -> Option<&PathBuf> {
        self.report_path.as_ref()
    }

    pub fn set_inline_progress(&mut self, inline_progress: bool) {
        self.inline_progress = inline_progress;
    }

    pub fn inline_progress(&self) -> bool {
        self.inline_progress
    }
}
