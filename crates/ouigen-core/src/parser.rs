//! Streaming parser for the textual OUI registry.
//!
//! The registry lists each assignment on several lines; the one of interest
//! carries six hex digits, the literal marker `(base 16)`, and the
//! organization name. Everything else (the `(hex)` form, address lines,
//! headers, blanks) is skipped silently.

use std::{
    io::{BufRead, BufReader, Lines, Read},
    sync::LazyLock,
};

use regex::Regex;

use crate::error::{ErrorContext, Result};

// Hex digits are case-insensitive; the marker text is not.
static REGISTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9A-Fa-f]{6})\s+\(base 16\)\s+(.*)$").expect("valid registry line pattern")
});

/// One parsed registry assignment: a 3-byte organizationally unique
/// identifier and the organization name it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuiRecord {
    pub prefix: [u8; 3],
    pub organization: String,
}

/// Lazy, single-pass iterator over the records of a registry text stream.
///
/// Yields one record per matching line in input order; duplicate prefixes
/// are preserved. I/O errors from the underlying reader surface as `Err`
/// items.
pub struct Records<R> {
    lines: Lines<BufReader<R>>,
}

/// Parses a registry text stream into a sequence of [`OuiRecord`]s.
pub fn parse<R: Read>(input: R) -> Records<R> {
    Records {
        lines: BufReader::new(input).lines(),
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<OuiRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => {
                    return Some(Err(err).with_context(|| "reading registry line".to_string()))
                }
            };
            if let Some(caps) = REGISTRY_LINE.captures(&line) {
                return Some(Ok(OuiRecord {
                    prefix: prefix_bytes(&caps[1]),
                    organization: caps[2].to_string(),
                }));
            }
        }
    }
}

/// Converts six hex digits into the three prefix bytes, pairwise in order.
/// The pattern guarantees the input is exactly six hex digits.
fn prefix_bytes(digits: &str) -> [u8; 3] {
    let bytes = digits.as_bytes();
    let mut prefix = [0u8; 3];
    for (i, out) in prefix.iter_mut().enumerate() {
        *out = (hex_value(bytes[2 * i]) << 4) | hex_value(bytes[2 * i + 1]);
    }
    prefix
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
