//! Block device adapter: a thin wrapper giving scoped access to 512-byte
//! blocks of any seekable byte store.
//!
//! There is no buffer cache here — each acquire reads straight through to
//! the backing store and each release (on `Drop`) writes back if the
//! handle was marked dirty. This still gives the filesystem the
//! acquire/mark-dirty/release shape it needs without requiring an actual
//! cache implementation from the host.

use crate::format::BLOCK_SIZE;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Anything a uxfs image can be stored on.
pub trait BlockStore: Read + Write + Seek {}
impl<T: Read + Write + Seek> BlockStore for T {}

/// Owns the backing store and turns absolute block numbers into I/O.
pub struct Device<S: BlockStore> {
    store: S,
}

impl<S: BlockStore> Device<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consumes the device, returning the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Reads block `n` into a fresh handle.
    pub fn read(&mut self, n: u64) -> io::Result<BlockHandle> {
        let mut buf = [0u8; BLOCK_SIZE];
        self.store.seek(SeekFrom::Start(n * BLOCK_SIZE as u64))?;
        self.store.read_exact(&mut buf)?;
        Ok(BlockHandle {
            block: n,
            data: buf,
            dirty: false,
        })
    }

    /// Reads block `n`, intending to modify it; identical to `read` here
    /// since there is no cache to distinguish a read-intent from a
    /// write-intent acquire.
    pub fn get_for_write(&mut self, n: u64) -> io::Result<BlockHandle> {
        self.read(n)
    }

    /// Writes a handle's data back if dirty, then consumes it. A handle
    /// holds no reference back to its `Device`, so letting one drop without
    /// calling this silently discards any pending write — every call site
    /// must route through `release` on every exit path, including errors.
    pub fn release(&mut self, mut handle: BlockHandle) -> io::Result<()> {
        if handle.dirty {
            self.store.seek(SeekFrom::Start(handle.block * BLOCK_SIZE as u64))?;
            self.store.write_all(&handle.data)?;
            handle.dirty = false;
        }
        Ok(())
    }
}

/// A scoped, owned view of one 512-byte block.
///
/// The original buffer-cache contract requires every acquire to be matched
/// by exactly one release on every exit path. A handle holds no reference
/// back to its `Device` and has no `Drop` impl, so that release must be
/// explicit — every call site in this crate threads the handle through
/// `device.release(handle)` on every exit path, including error returns.
pub struct BlockHandle {
    block: u64,
    data: [u8; BLOCK_SIZE],
    dirty: bool,
}

impl BlockHandle {
    pub fn data(&self) -> &[u8; BLOCK_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; BLOCK_SIZE] {
        &mut self.data
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn block_no(&self) -> u64 {
        self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn blank_device(blocks: u64) -> Device<Cursor<Vec<u8>>> {
        Device::new(Cursor::new(vec![0u8; (blocks * BLOCK_SIZE as u64) as usize]))
    }

    #[test]
    fn read_write_round_trip() {
        let mut dev = blank_device(4);
        let mut h = dev.get_for_write(2).unwrap();
        h.data_mut()[0] = 0xAB;
        h.mark_dirty();
        dev.release(h).unwrap();

        let h2 = dev.read(2).unwrap();
        assert_eq!(h2.data()[0], 0xAB);
    }

    #[test]
    fn non_dirty_release_does_not_write() {
        let mut dev = blank_device(4);
        let mut h = dev.get_for_write(1).unwrap();
        h.data_mut()[0] = 0xFF;
        // not marked dirty
        dev.release(h).unwrap();

        let h2 = dev.read(1).unwrap();
        assert_eq!(h2.data()[0], 0);
    }
}
