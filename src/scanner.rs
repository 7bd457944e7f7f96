// File: scanner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Balanced-delimiter scanning over untrusted text.
//!
//! This is not a JSON parser. It counts one pair of delimiters and ignores
//! everything else, so delimiters inside string literals are counted too.

/// Returns the span starting at `start` (which must hold `open`) through the
/// `close` at which the nesting depth returns to zero.
pub fn balanced_span(text: &str, start: usize, open: u8, close: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&open) {
        return None;
    }

    let mut depth = 0usize;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[start..=start + offset]);
            }
        }
    }
    None
}

/// Finds `marker`, then the first `[` after it, and returns the balanced
/// array literal that starts there.
pub fn extract_array<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let marker_pos = text.find(marker)?;
    let open = marker_pos + text[marker_pos..].find('[')?;
    balanced_span(text, open, b'[', b']')
}

/// Iterator over the top-level `{...}` objects in a piece of text.
///
/// An object that never closes ends the iteration.
pub struct ObjectSpans<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for ObjectSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.text.get(self.pos..)?;
        let open = self.pos + rest.find('{')?;
        match balanced_span(self.text, open, b'{', b'}') {
            Some(span) => {
                self.pos = open + span.len();
                Some(span)
            }
            None => {
                self.pos = self.text.len();
                None
            }
        }
    }
}

pub fn object_spans(text: &str) -> ObjectSpans<'_> {
    ObjectSpans { text, pos: 0 }
}
