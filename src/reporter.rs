// File: reporter.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::classify::Diagnosis;
use crate::executor::ProbeReport;
use crate::stats::RunStats;
use colored::*;
use log::{debug, warn};
use std::io::{self, Write};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

const STATUS_WIDTH: usize = 17;
const STATUS_MAX: usize = 20;
const CLEAR_LINE: &str = "\x1b[K";
pub const MAIN_PREFIX: &str = "MAIN";

#[derive(Debug)]
pub enum ReportEvent {
    Started { id: String, url: String },
    Finished(ProbeReport),
    Message { prefix: String, text: String },
    Summary(RunTotals),
}

/// Batch-level figures only the runner knows. The reporter merges them into
/// its own counts and prints the summary line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub launched: u64,
    pub failed_tasks: u64,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Rewrite the current terminal line for start events.
    pub inline: bool,
    pub color: bool,
}

/// Cheap sending side handed to every probe task.
#[derive(Debug, Clone)]
pub struct ReportHandle {
    tx: UnboundedSender<ReportEvent>,
}

impl ReportHandle {
    pub fn started(&self, id: &str, url: &str) {
        self.send(ReportEvent::Started {
            id: id.to_string(),
            url: url.to_string(),
        });
    }

    pub fn finished(&self, report: ProbeReport) {
        self.send(ReportEvent::Finished(report));
    }

    pub fn message(&self, prefix: &str, text: impl Into<String>) {
        self.send(ReportEvent::Message {
            prefix: prefix.to_string(),
            text: text.into(),
        });
    }

    pub fn summary(&self, totals: RunTotals) {
        self.send(ReportEvent::Summary(totals));
    }

    fn send(&self, event: ReportEvent) {
        if self.tx.send(event).is_err() {
            warn!("Reporter is gone, dropping event");
        }
    }
}

/// Single writer that owns the output. Every event becomes one
/// `write_all`, so lines from concurrent tasks never interleave.
pub struct Reporter {
    handle: ReportHandle,
    task: JoinHandle<RunStats>,
}

impl Reporter {
    pub fn spawn<W>(writer: W, options: RenderOptions) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drain(rx, writer, options));
        Self {
            handle: ReportHandle { tx },
            task,
        }
    }

    pub fn stdout(inline: bool) -> Self {
        Self::spawn(
            io::stdout(),
            RenderOptions {
                inline,
                color: true,
            },
        )
    }

    /// Reporter that discards output but still keeps statistics.
    pub fn sink() -> Self {
        Self::spawn(io::sink(), RenderOptions::default())
    }

    pub fn handle(&self) -> ReportHandle {
        self.handle.clone()
    }

    /// Closes this reporter's own sender and waits until every other handle
    /// is dropped and all queued events are written.
    pub async fn finish(self) -> RunStats {
        let Reporter { handle, task } = self;
        drop(handle);
        match task.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Reporter task failed: {}", e);
                RunStats::new()
            }
        }
    }
}

async fn drain<W: Write>(
    mut rx: UnboundedReceiver<ReportEvent>,
    mut writer: W,
    options: RenderOptions,
) -> RunStats {
    let mut stats = RunStats::new();

    while let Some(event) = rx.recv().await {
        let rendered = match &event {
            ReportEvent::Started { id, url } => {
                if !options.inline {
                    debug!("{} - Starting request -> {}", id, url);
                    continue;
                }
                format!(
                    "\r{}{}",
                    render_message(&timestamp(), id, &format!("Starting request -> {}", url)),
                    CLEAR_LINE
                )
            }
            ReportEvent::Finished(report) => {
                stats.record(report.diagnosis);
                let line = render_result(&timestamp(), report, options.color);
                finish_line(&line, options.inline)
            }
            ReportEvent::Message { prefix, text } => {
                stats.add_message();
                finish_line(&render_message(&timestamp(), prefix, text), options.inline)
            }
            ReportEvent::Summary(totals) => {
                stats.set_launched(totals.launched);
                stats.set_failed_tasks(totals.failed_tasks);
                stats.set_start_time(totals.start_time);
                stats.set_end_time(totals.end_time);
                stats.add_message();
                finish_line(
                    &render_message(&timestamp(), MAIN_PREFIX, &stats.summary_line()),
                    options.inline,
                )
            }
        };

        if let Err(e) = writer
            .write_all(rendered.as_bytes())
            .and_then(|_| writer.flush())
        {
            warn!("Failed to write report line: {}", e);
        }
    }

    stats
}

fn finish_line(line: &str, inline: bool) -> String {
    if inline {
        format!("\r{}{}\n", line, CLEAR_LINE)
    } else {
        format!("{}\n", line)
    }
}

pub fn timestamp() -> String {
    chrono::Local::now().format("[%H:%M:%S%.3f]").to_string()
}

pub fn render_message(timestamp: &str, prefix: &str, text: &str) -> String {
    if prefix.is_empty() {
        format!("{} {}", timestamp, text)
    } else {
        format!("{} {} - {}", timestamp, prefix, text)
    }
}

pub fn render_result(timestamp: &str, report: &ProbeReport, color: bool) -> String {
    let status = format!(
        "{:<width$}",
        truncate_status(report.status()),
        width = STATUS_WIDTH
    );
    let status = if color {
        paint(&status, report.diagnosis)
    } else {
        status
    };

    format!(
        "{} {:<15} {:>4} {:>8} {:>10.1} ms {} {}",
        timestamp, report.id, report.http_code, report.received, report.elapsed_ms, status, report.detail
    )
}

fn truncate_status(status: &str) -> String {
    if status.chars().count() > STATUS_MAX {
        let head: String = status.chars().take(STATUS_WIDTH).collect();
        format!("{}...", head)
    } else {
        status.to_string()
    }
}

fn paint(status: &str, diagnosis: Diagnosis) -> String {
    match diagnosis {
        Diagnosis::NotDetected => status.green().to_string(),
        Diagnosis::PossiblyDetected => status.yellow().to_string(),
        Diagnosis::ProbablyDetected | Diagnosis::Detected => status.red().bold().to_string(),
        Diagnosis::Inconclusive => status.bright_black().to_string(),
    }
}
