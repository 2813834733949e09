//! Superblock lifecycle: mount, unmount, statfs, sync.
//!
//! [`Filesystem`] is the single entry point the CLI tools and the test
//! suite drive; it owns the device and the in-core superblock behind one
//! mutex, satisfying the requirement that bitmap mutations and the
//! `nifree`/`nbfree` counters stay atomic with respect to each other.

use crate::device::{BlockStore, Device};
use crate::error::{Error, Result};
use crate::format::{FIRST_DATA_BLOCK, INODE_BLOCK, MAGIC, MOD_CLEAN, MOD_DIRTY, ROOT_INO, Superblock};
use std::sync::Mutex;

pub(crate) struct FsState<S: BlockStore> {
    pub device: Device<S>,
    pub superblock: Superblock,
}

/// A mounted uxfs image.
pub struct Filesystem<S: BlockStore> {
    pub(crate) state: Mutex<FsState<S>>,
}

/// Snapshot of free-space counters, as reported by `statfs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    pub nifree: u32,
    pub nbfree: u32,
    pub maxfiles: u32,
    pub maxblocks: u32,
}

impl<S: BlockStore> Filesystem<S> {
    /// Reads block 0, validates the magic and clean flag, and returns a
    /// mounted filesystem handle.
    pub fn mount(store: S) -> Result<Self> {
        let mut device = Device::new(store);
        let block0 = device.read(0)?;
        let sb = Superblock::from_block(block0.data());
        device.release(block0)?;

        if sb.magic != MAGIC {
            return Err(Error::Invalid("bad magic"));
        }
        if sb.r#mod == MOD_DIRTY {
            return Err(Error::Invalid("dirty image, run fsck"));
        }

        let fs = Self {
            state: Mutex::new(FsState {
                device,
                superblock: sb,
            }),
        };
        fs.mark_dirty_mount()?;
        Ok(fs)
    }

    /// Marks the mounted image dirty, as the original does for a
    /// read-write mount.
    fn mark_dirty_mount(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.superblock.r#mod = MOD_DIRTY;
        write_superblock(&mut state)
    }

    /// Flushes the superblock and writes `mod = CLEAN`, unlike the
    /// original (which leaves every subsequent mount refusing with "dirty
    /// image").
    pub fn unmount(self) -> Result<()> {
        self.unmount_and_take().map(|_| ())
    }

    /// Like [`Self::unmount`], but also returns the backing store — mainly
    /// useful for tests that want to inspect or remount the same bytes.
    pub fn unmount_and_take(self) -> Result<S> {
        {
            let mut state = self.state.lock().unwrap();
            state.superblock.r#mod = MOD_CLEAN;
            write_superblock(&mut state)?;
        }
        let state = self.state.into_inner().unwrap();
        Ok(state.device.into_store())
    }

    /// Flushes any in-core superblock mutation to disk without unmounting.
    pub fn sync(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        write_superblock(&mut state)
    }

    /// Reports free-space counters under the same lock the allocator uses.
    pub fn statfs(&self) -> StatFs {
        let state = self.state.lock().unwrap();
        StatFs {
            nifree: state.superblock.nifree,
            nbfree: state.superblock.nbfree,
            maxfiles: crate::format::MAXFILES as u32,
            maxblocks: crate::format::MAXBLOCKS as u32,
        }
    }

    /// The root directory's inode number, fixed at `ROOT_INO`.
    pub fn root_ino(&self) -> u32 {
        ROOT_INO
    }
}

/// Writes the in-core superblock back to block 0.
pub(crate) fn write_superblock<S: BlockStore>(state: &mut FsState<S>) -> Result<()> {
    let mut handle = state.device.get_for_write(0)?;
    *handle.data_mut() = state.superblock.to_block();
    handle.mark_dirty();
    state.device.release(handle)?;
    Ok(())
}

/// Absolute block number holding inode `ino`.
pub(crate) fn inode_block(ino: u32) -> u64 {
    INODE_BLOCK + ino as u64
}

/// Absolute block number for data block slot `slot` counted from
/// `FIRST_DATA_BLOCK`.
pub(crate) fn data_block(slot: u32) -> u64 {
    FIRST_DATA_BLOCK + slot as u64
}
