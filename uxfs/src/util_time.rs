//! Timestamp helper, the 32-bit Unix-seconds fields `atime`/`mtime`/`ctime`
//! expect on disk.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as seconds since the Unix epoch, truncated to `u32` (the
/// on-disk field width; this image format predates Y2038 fixes by
/// construction, matching the original).
pub fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
