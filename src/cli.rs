// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::DEFAULT_TIMEOUT_MS;
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;

#[derive(Parser, Debug, Default)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[arg(
        value_name = "TIMEOUT_MS",
        allow_hyphen_values = true,
        help = "Per-probe timeout in milliseconds (default 5000)"
    )]
    pub timeout: Option<String>,
}

impl Cli {
    /// Parses the command line without ever failing. Help and version
    /// requests are printed and exit; anything else unusable falls back to
    /// the defaults.
    pub fn parse_lenient<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let _ = e.print();
                std::process::exit(0);
            }
            Err(e) => {
                log::debug!("Ignoring unusable arguments: {}", e);
                Cli::default()
            }
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        parse_timeout(self.timeout.as_deref())
    }
}

/// Positive decimal milliseconds, otherwise the default.
pub fn parse_timeout(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_TIMEOUT_MS)
}
