//! Warning types for non-fatal errors during JSONL loading.
//!
//! When a data file is partially damaged the loader keeps every line it can
//! parse and reports the rest as [`Warning`]s, so a single bad record does not
//! take the whole tracker offline.

use std::fmt;

/// A non-fatal problem found while reading a JSONL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A non-empty line did not deserialize into the expected record type.
    MalformedJson {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the parsing error.
        error: String,
    },

    /// A line was skipped before JSON parsing was attempted.
    SkippedLine {
        /// The 1-based line number that was skipped.
        line_number: usize,
        /// The reason the line was skipped.
        reason: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use pesticide_jsonl::Warning;
    ///
    /// let warning = Warning::MalformedJson {
    ///     line_number: 42,
    ///     error: "unexpected token".to_string(),
    /// };
    /// assert_eq!(warning.line_number(), 42);
    /// ```
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => write!(f, "line {line_number}: skipped: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_and_detail() {
        let warning = Warning::SkippedLine {
            line_number: 10,
            reason: "line is not valid UTF-8".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "line 10: skipped: line is not valid UTF-8"
        );
    }
}
