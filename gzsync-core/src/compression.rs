/*!
Compression adapters for derived artifacts.

Sources are never loaded into memory as a whole: the adapter pulls bytes from
a reader and pushes the encoded stream into a writer until the reader is
exhausted. gzip is the only codec.
*/

use std::io::{self, Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::config::DEFAULT_LEVEL;
use crate::{Result, SyncError};

/// Byte counts for one finished compression stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Bytes read from the source
    pub bytes_in: u64,
    /// Bytes written to the artifact
    pub bytes_out: u64,
}

/// Compression abstraction used by the sync engine
///
/// Implementations must be shareable across worker threads.
pub trait CompressionAdapter: Send + Sync {
    /// Stream the whole of `reader` through the encoder into `writer`
    ///
    /// The encoder is finished before returning, so on `Ok` the writer holds a
    /// complete stream. On `Err` whatever was already written stays written.
    fn compress_stream(&self, reader: &mut dyn Read, writer: &mut dyn Write)
        -> io::Result<StreamStats>;

    /// Decompress a complete encoded buffer
    fn decompress(&self, compressed_data: &[u8]) -> Result<Vec<u8>>;

    /// Get the name of the compression algorithm
    fn algorithm_name(&self) -> &str;
}

/// Gzip compression adapter
///
/// # Example
/// ```rust
/// use gzsync_core::{CompressionAdapter, GzipCompressor};
///
/// let compressor = GzipCompressor::new();
/// let mut compressed = Vec::new();
/// compressor.compress_stream(&mut &b"some file contents"[..], &mut compressed).unwrap();
/// let decompressed = compressor.decompress(&compressed).unwrap();
/// assert_eq!(decompressed, b"some file contents");
/// ```
#[derive(Debug, Clone)]
pub struct GzipCompressor {
    compression_level: Compression,
}

impl GzipCompressor {
    /// Create a new gzip compressor with default compression level (6)
    pub fn new() -> Self {
        Self::with_level(DEFAULT_LEVEL)
    }

    /// Create a new gzip compressor with the specified compression level (0-9)
    pub fn with_level(level: u32) -> Self {
        Self {
            compression_level: Compression::new(level),
        }
    }

    /// Create a compressor for fast compression (level 1)
    pub fn fast() -> Self {
        Self::with_level(1)
    }

    /// Create a compressor for maximum compression (level 9)
    pub fn max() -> Self {
        Self::with_level(9)
    }

    /// The configured level
    pub fn level(&self) -> u32 {
        self.compression_level.level()
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer adapter that counts the bytes passing through it
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl CompressionAdapter for GzipCompressor {
    fn compress_stream(
        &self,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
    ) -> io::Result<StreamStats> {
        let counter = CountingWriter {
            inner: writer,
            written: 0,
        };
        let mut encoder = GzEncoder::new(counter, self.compression_level);

        let bytes_in = io::copy(reader, &mut encoder)?;
        let mut counter = encoder.finish()?;
        counter.flush()?;

        Ok(StreamStats {
            bytes_in,
            bytes_out: counter.written,
        })
    }

    fn decompress(&self, compressed_data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(compressed_data);
        let mut decompressed = Vec::new();

        decoder
            .read_to_end(&mut decompressed)
            .map_err(SyncError::Io)?;

        Ok(decompressed)
    }

    fn algorithm_name(&self) -> &str {
        "gzip"
    }
}
