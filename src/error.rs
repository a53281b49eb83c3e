//! Crate error type.

use thiserror::Error;

use crate::rail::orders::ExecStatus;

/// Failures surfaced by the synchronizer core.
///
/// Per-update failures (`IconCacheBounds`, `IconDecode`, unknown-window
/// misses) are warnings at the dispatch layer, never fatal to the session;
/// `ExecFailed` is the one session-fatal variant.
#[derive(Debug, Error)]
pub enum RailError {
    #[error("window 0x{0:08x} is already registered")]
    WindowExists(u64),

    #[error("window id 0x{0:x} does not fit the 32-bit order range")]
    WindowIdRange(u64),

    #[error("icon cache slot {cache_id:02X}:{cache_entry:04X} is out of bounds")]
    IconCacheBounds { cache_id: u8, cache_entry: u16 },

    #[error("malformed icon bitmap: {0}")]
    IconDecode(String),

    #[error("remote execute failed: {0:?}")]
    ExecFailed(ExecStatus),

    /// Failure reported by a collaborator (window backend or transport).
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}
