// File: suite.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::scanner::{extract_array, object_spans};
use crate::transfer::Transfer;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::Serialize;

pub const SUITE_MARKER: &str = "TEST_SUITE";

const BUILTIN_SUITE_DOCUMENT: &str = r#"
const TEST_SUITE = [
  { id: "CF-01", provider: "Cloudflare", url: "https://speed.cloudflare.com/__down?bytes=131072", times: 1 },
  { id: "HZ-01", provider: "Hetzner", url: "https://fsn1-speed.hetzner.com/100MB.bin", times: 1 },
  { id: "HZ-02", provider: "Hetzner", url: "https://hel1-speed.hetzner.com/100MB.bin", times: 1 },
  { id: "DO-01", provider: "DigitalOcean", url: "https://speedtest-fra1.digitalocean.com/10mb.test", times: 1 },
  { id: "DO-02", provider: "DigitalOcean", url: "https://speedtest-ams3.digitalocean.com/10mb.test", times: 1 },
  { id: "OVH-01", provider: "OVH", url: "https://proof.ovh.net/files/1Mb.dat", times: 1 },
  { id: "LN-01", provider: "Akamai (Linode)", url: "https://speedtest.frankfurt.linode.com/100MB-frankfurt.bin", times: 1 },
];
"#;

/// Fallback list used when the remote suite cannot be loaded.
pub static BUILTIN_SUITE: Lazy<Vec<TestCase>> =
    Lazy::new(|| parse_document(BUILTIN_SUITE_DOCUMENT).unwrap_or_default());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub id: String,
    pub provider: String,
    pub url: String,
    pub times: u32,
}

impl TestCase {
    /// Identity of one repetition. Only suffixed when the test repeats.
    pub fn attempt_id(&self, index: u32) -> String {
        if self.times > 1 {
            format!("{}@{}", self.id, index)
        } else {
            self.id.clone()
        }
    }
}

/// Best-effort field lookup over one object literal.
///
/// Never fails: a missing or malformed field yields its default (`""` or
/// `0`). Escape sequences, comments and nested values are not interpreted.
pub struct FieldScanner<'a> {
    text: &'a str,
}

impl<'a> FieldScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Content between the first two `"` after `key:`.
    pub fn string(&self, key: &str) -> String {
        self.value_start(key)
            .and_then(|start| {
                let rest = &self.text[start..];
                let open = rest.find('"')?;
                let body = &rest[open + 1..];
                let close = body.find('"')?;
                Some(body[..close].to_string())
            })
            .unwrap_or_default()
    }

    /// Leading decimal digits after `key:`, skipping whitespace.
    pub fn integer(&self, key: &str) -> u32 {
        self.value_start(key)
            .and_then(|start| {
                let rest = self.text[start..].trim_start();
                let digits = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .map_or(rest, |end| &rest[..end]);
                digits.parse().ok()
            })
            .unwrap_or(0)
    }

    /// Byte offset just past the colon of the first `key:` (or `"key":`)
    /// that is not the tail of a longer identifier.
    fn value_start(&self, key: &str) -> Option<usize> {
        let text = self.text;
        let mut from = 0;
        while let Some(rel) = text[from..].find(key) {
            let start = from + rel;
            let end = start + key.len();
            from = end;

            let bounded = text[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_ident_char(c));
            if !bounded {
                continue;
            }

            let rest = &text[end..];
            let rest = rest.strip_prefix('"').unwrap_or(rest).trim_start();
            if let Some(value) = rest.strip_prefix(':') {
                return Some(text.len() - value.len());
            }
        }
        None
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Parses one `{...}` record. Records without an `id` are dropped.
pub fn parse_object(text: &str) -> Option<TestCase> {
    let fields = FieldScanner::new(text);
    let id = fields.string("id");
    if id.is_empty() {
        return None;
    }

    Some(TestCase {
        id,
        provider: fields.string("provider"),
        url: fields.string("url"),
        times: fields.integer("times"),
    })
}

/// Parses every top-level object inside an extracted array literal.
pub fn parse_suite(array: &str) -> Vec<TestCase> {
    object_spans(array)
        .filter_map(|object| {
            let parsed = parse_object(object);
            if parsed.is_none() {
                debug!("Dropping suite record without id: {}", object);
            }
            parsed
        })
        .collect()
}

/// Extracts the `TEST_SUITE` array from a document and parses it.
pub fn parse_document(document: &str) -> Option<Vec<TestCase>> {
    extract_array(document, SUITE_MARKER).map(parse_suite)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepReason {
    FetchFailed(String),
    ArrayNotFound,
    NoRecords,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Replaced(usize),
    Kept(KeepReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(tests: Vec<TestCase>) -> Self {
        Self { tests }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_SUITE.clone())
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Number of probe attempts the suite expands to.
    pub fn attempt_count(&self) -> usize {
        self.tests.iter().map(|t| t.times as usize).sum()
    }

    /// Fetches `url` and replaces the list with the suite found there. On any
    /// failure the current list stays exactly as it was.
    pub async fn load_from_url<T: Transfer>(&mut self, transfer: &T, url: &str) -> LoadOutcome {
        match transfer.fetch_text(url).await {
            Ok(document) => self.load_from_document(&document),
            Err(e) => {
                warn!("Keeping current test suite, fetch of {} failed: {}", url, e);
                LoadOutcome::Kept(KeepReason::FetchFailed(e.to_string()))
            }
        }
    }

    pub fn load_from_document(&mut self, document: &str) -> LoadOutcome {
        let Some(parsed) = parse_document(document) else {
            warn!("Keeping current test suite, no {} array found", SUITE_MARKER);
            return LoadOutcome::Kept(KeepReason::ArrayNotFound);
        };

        if parsed.is_empty() {
            warn!("Keeping current test suite, remote suite has no usable records");
            return LoadOutcome::Kept(KeepReason::NoRecords);
        }

        info!("Loaded {} tests from remote suite", parsed.len());
        let count = parsed.len();
        self.tests = parsed;
        LoadOutcome::Replaced(count)
    }
}
