//! JSONL reading operations.
//!
//! This module provides async functionality for reading JSONL data line-by-line
//! with line number tracking for error reporting, plus a resilient loader that
//! collects [`Warning`]s for damaged lines instead of aborting.

use crate::error::{Error, Result};
use crate::warning::Warning;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// Blank lines are skipped. Line numbers are 1-based and count every physical
/// line, including skipped blank ones, so they match what an editor shows.
///
/// # Examples
///
/// ```no_run
/// use pesticide_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("issues.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_line::<serde_json::Value>().await? {
///     println!("{value}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// Number of physical lines consumed so far.
    line_number: usize,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: Vec::new(),
        }
    }

    /// Returns the line number of the last line read (0 before any reads).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads and deserializes the next non-blank line.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the underlying reader fails
    /// - [`Error::InvalidUtf8`] if the line is not valid UTF-8
    /// - [`Error::Json`] if the line does not deserialize into `T`
    pub async fn read_line<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            self.buffer.clear();
            let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let text = std::str::from_utf8(&self.buffer)
                .map_err(|_| Error::InvalidUtf8(self.line_number))?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|source| Error::Json {
                    line_number: self.line_number,
                    source,
                });
        }
    }

    /// Reads the next line that deserializes successfully.
    ///
    /// Lines that fail to parse are recorded in `warnings` and skipped. Only
    /// I/O errors abort the read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying reader fails.
    pub async fn read_line_resilient<T: DeserializeOwned>(
        &mut self,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<T>> {
        loop {
            match self.read_line().await {
                Err(Error::Json {
                    line_number,
                    source,
                }) => warnings.push(Warning::MalformedJson {
                    line_number,
                    error: source.to_string(),
                }),
                Err(Error::InvalidUtf8(line_number)) => warnings.push(Warning::SkippedLine {
                    line_number,
                    reason: "line is not valid UTF-8".to_string(),
                }),
                other => return other,
            }
        }
    }
}

/// Reads every record of a JSONL file, skipping lines that cannot be parsed.
///
/// Returns the parsed records in file order together with one [`Warning`] per
/// skipped line.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).await?;
    let mut reader = JsonlReader::new(file);

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    while let Some(record) = reader.read_line_resilient(&mut warnings).await? {
        records.push(record);
    }

    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        warnings = warnings.len(),
        "Loaded JSONL file"
    );

    Ok((records, warnings))
}
