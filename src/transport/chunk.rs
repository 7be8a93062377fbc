//! # Chunked BLE Writes
//!
//! BLE characteristic writes are capped at a small payload, so a print job
//! is split into fixed-size chunks and written one at a time.
//!
//! ```text
//! job (250 bytes), chunk size 100
//!
//! ┌──── 100 ────┐ 5ms ┌──── 100 ────┐ 5ms ┌── 50 ──┐
//! │   chunk 1   │ ──► │   chunk 2   │ ──► │ chunk 3│
//! └─────────────┘     └─────────────┘     └────────┘
//! ```
//!
//! Each write is awaited before the next starts, with a short pause between
//! chunks so the printer's input buffer is not overrun. A failed write
//! aborts the job; nothing is retried here.
//!
//! Chunks carry a base64 rendering for backends and logs that need a
//! text-safe payload.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, trace, warn};
use tokio::time::sleep;

use crate::ble::{GattLink, WriteTarget};
use crate::error::{Result, SudsyError};

/// Default bytes per write.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default pause between writes.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(5);

/// Chunk size and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub size: usize,
    pub delay: Duration,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            delay: DEFAULT_CHUNK_DELAY,
        }
    }
}

/// One write-sized piece of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub bytes: &'a [u8],
}

impl Chunk<'_> {
    /// Base64 (standard alphabet, padded).
    pub fn encoded(&self) -> String {
        STANDARD.encode(self.bytes)
    }
}

/// Split `data` into `ceil(len / size)` chunks. A `size` of 0 is treated as 1.
///
/// ```
/// use sudsy::transport::split_chunks;
///
/// let chunks = split_chunks(&[0u8; 250], 100);
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[2].bytes.len(), 50);
/// ```
pub fn split_chunks(data: &[u8], size: usize) -> Vec<Chunk<'_>> {
    data.chunks(size.max(1)).map(|bytes| Chunk { bytes }).collect()
}

/// Write `data` to `target` chunk by chunk.
///
/// Returns the number of chunks written. On failure the error names the
/// 1-based chunk that failed; earlier chunks have already reached the
/// printer.
pub async fn send<L>(
    link: &L,
    target: &WriteTarget,
    data: &[u8],
    config: &ChunkConfig,
) -> Result<usize>
where
    L: GattLink + ?Sized,
{
    let chunks = split_chunks(data, config.size);
    let total = chunks.len();
    debug!("Sending {} bytes in {} chunks", data.len(), total);

    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 && !config.delay.is_zero() {
            sleep(config.delay).await;
        }

        trace!("chunk {}/{}: {}", i + 1, total, chunk.encoded());

        if let Err(err) = link.write(target, chunk.bytes).await {
            warn!("Write failed at chunk {} of {}: {}", i + 1, total, err);
            return Err(SudsyError::TransportWriteFailed {
                chunk: i + 1,
                total,
                reason: err.to_string(),
            });
        }
    }

    Ok(total)
}
