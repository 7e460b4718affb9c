//! JSONL writing operations.

use crate::error::{Error, Result};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Async buffered writer for JSONL (JSON Lines) data.
///
/// Each value is serialized to a single line followed by `\n`. Call
/// [`flush`](Self::flush) before dropping the writer; buffered data is
/// otherwise lost.
pub struct JsonlWriter<W> {
    writer: BufWriter<W>,
    records: usize,
}

impl<W: AsyncWrite + Unpin> JsonlWriter<W> {
    /// Creates a new `JsonlWriter` wrapping the given async writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            records: 0,
        }
    }

    /// Serializes `value` as one line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails or [`Error::Io`] if the
    /// write fails.
    pub async fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let line = serde_json::to_vec(value).map_err(|source| Error::Json {
            line_number: self.records + 1,
            source,
        })?;
        self.writer.write_all(&line).await?;
        self.writer.write_all(b"\n").await?;
        self.records += 1;
        Ok(())
    }

    /// Serializes every value of `values`, one per line.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first serialization or I/O error.
    pub async fn write_all<T, I>(&mut self, values: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.write(&value).await?;
        }
        Ok(())
    }

    /// Flushes buffered data to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the flush fails.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Consumes the writer, returning the underlying writer.
    ///
    /// Does not flush; call [`flush`](Self::flush) first.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn writes_one_line_per_value() {
        let mut writer = JsonlWriter::new(Cursor::new(Vec::new()));
        writer.write_all([1, 2, 3]).await.unwrap();
        writer.flush().await.unwrap();

        assert_eq!(writer.records_written(), 3);
        let bytes = writer.into_inner().into_inner();
        assert_eq!(String::from_utf8(bytes).unwrap(), "1\n2\n3\n");
    }

    #[tokio::test]
    async fn escapes_embedded_newlines() {
        let mut writer = JsonlWriter::new(Cursor::new(Vec::new()));
        writer.write("first\nsecond").await.unwrap();
        writer.flush().await.unwrap();

        let text = String::from_utf8(writer.into_inner().into_inner()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
