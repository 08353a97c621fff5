//! Locating and checking digest lines in free text.

use crate::accumulator::DigestResult;
use crate::{DigestFormat, EngineError};

/// Lazy iterator over the lines of a text, without line terminators.
///
/// A trailing `\r` is kept; the hex value is trimmed later anyway.
pub struct DigestLines<'t> {
    rest: Option<&'t str>,
}

impl<'t> DigestLines<'t> {
    pub fn new(text: &'t str) -> Self {
        Self { rest: Some(text) }
    }
}

impl<'t> Iterator for DigestLines<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        let rest = self.rest?;
        match rest.split_once('\n') {
            Some((line, tail)) => {
                self.rest = Some(tail);
                Some(line)
            }
            None => {
                self.rest = None;
                // No phantom empty line after a final newline.
                (!rest.is_empty()).then_some(rest)
            }
        }
    }
}

/// A digest line found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLine {
    pub prefix: String,
    /// The value after the prefix, surrounding whitespace removed.
    pub hex: String,
    /// The whole line as it appeared.
    pub line: String,
}

/// Checks recorded digest lines against freshly computed digests.
pub struct Verifier<'t> {
    text: &'t str,
}

impl<'t> Verifier<'t> {
    pub fn new(text: &'t str) -> Self {
        Self { text }
    }

    pub fn lines(&self) -> DigestLines<'t> {
        DigestLines::new(self.text)
    }

    /// The first line starting with `prefix`.
    pub fn find(&self, prefix: &str) -> Result<VerificationLine, EngineError> {
        let line = self
            .lines()
            .find(|line| line.starts_with(prefix))
            .ok_or_else(|| EngineError::PrefixNotFound {
                prefix: prefix.to_string(),
            })?;
        parse_line(prefix, line)
    }

    /// Check the line recorded for `actual`'s format against `actual`.
    ///
    /// The format is taken from the result, so a digest can only be checked
    /// against the line of the rule that produced it.
    pub fn verify(&self, actual: &DigestResult) -> Result<VerificationLine, EngineError> {
        let recorded = self.find(actual.format.prefix())?;
        if recorded.hex != actual.hex {
            return Err(EngineError::DigestMismatch {
                expected: recorded.hex,
                actual: actual.hex.clone(),
            });
        }
        Ok(recorded)
    }

    /// Formats with a line in the text, in [`DigestFormat::ALL`] order.
    pub fn detect(&self) -> Vec<DigestFormat> {
        DigestFormat::ALL
            .into_iter()
            .filter(|format| self.lines().any(|line| line.starts_with(format.prefix())))
            .collect()
    }
}

fn parse_line(prefix: &str, line: &str) -> Result<VerificationLine, EngineError> {
    let malformed = |reason| EngineError::MalformedVerificationLine {
        line: line.to_string(),
        reason,
    };
    let hex = line[prefix.len()..].trim();
    if hex.is_empty() {
        return Err(malformed("no digest after prefix"));
    }
    if hex.contains(char::is_whitespace) {
        return Err(malformed("whitespace inside digest"));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed("digest is not hexadecimal"));
    }
    Ok(VerificationLine {
        prefix: prefix.to_string(),
        hex: hex.to_string(),
        line: line.to_string(),
    })
}
