//! Directory layer: fixed-size entries, linear add/remove/lookup by name,
//! and readdir iteration.
//!
//! Directory contents are a sequence of 32-byte [`Dirent`] records packed
//! [`DIRS_PER_BLOCK`] per block. Deleted entries are left as tombstones
//! (`ino == 0`) rather than compacted, which keeps `readdir` offsets stable
//! at the cost of directories that never shrink — acceptable at the
//! 32-inode ceiling this format targets.

use crate::alloc::balloc;
use crate::device::BlockStore;
use crate::error::{Error, Result};
use crate::format::{BLOCK_SIZE, DIRECT_BLOCKS, DIRS_PER_BLOCK, Dirent};
use crate::fs::Filesystem;
use crate::inode::InCoreInode;

impl<S: BlockStore> Filesystem<S> {
    fn read_data_block(&self, phys: u32) -> Result<[u8; BLOCK_SIZE]> {
        let mut state = self.state.lock().unwrap();
        let handle = state.device.read(phys as u64)?;
        let data = *handle.data();
        state.device.release(handle)?;
        Ok(data)
    }

    fn write_data_block(&self, phys: u32, data: &[u8; BLOCK_SIZE]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut handle = state.device.get_for_write(phys as u64)?;
        *handle.data_mut() = *data;
        handle.mark_dirty();
        state.device.release(handle)?;
        Ok(())
    }

    /// Linear scan across all of `dir`'s blocks for an exact name match.
    /// Returns the matching inode number, or `None`.
    pub fn find_entry(&self, dir: &InCoreInode, name: &str) -> Result<Option<u32>> {
        for i in 0..dir.disk.blocks as usize {
            let phys = dir.disk.addr[i];
            if phys == 0 {
                continue;
            }
            let block = self.read_data_block(phys)?;
            for slot in 0..DIRS_PER_BLOCK {
                let off = slot * Dirent::SIZE;
                let entry = Dirent::from_bytes(&block[off..off + Dirent::SIZE]);
                if !entry.is_tombstone() && entry.name_str() == name {
                    return Ok(Some(entry.ino));
                }
            }
        }
        Ok(None)
    }

    /// Adds `name -> ino` to `dir`: reuses a tombstone slot if one exists,
    /// otherwise extends the directory with a new block if room remains.
    /// Returns `Err(Error::NoSpace)` if the directory already holds
    /// `DIRECT_BLOCKS` blocks with no free slot.
    pub fn diradd(&self, dir: &mut InCoreInode, name: &str, ino: u32) -> Result<()> {
        let entry = Dirent::new(ino, name).ok_or(Error::NameTooLong)?;

        for i in 0..dir.disk.blocks as usize {
            let phys = dir.disk.addr[i];
            if phys == 0 {
                continue;
            }
            let mut block = self.read_data_block(phys)?;
            for slot in 0..DIRS_PER_BLOCK {
                let off = slot * Dirent::SIZE;
                let existing = Dirent::from_bytes(&block[off..off + Dirent::SIZE]);
                if existing.is_tombstone() {
                    block[off..off + Dirent::SIZE].copy_from_slice(&entry.to_bytes());
                    self.write_data_block(phys, &block)?;
                    self.write_inode(dir)?;
                    return Ok(());
                }
            }
        }

        if dir.disk.blocks as usize >= DIRECT_BLOCKS {
            return Err(Error::NoSpace);
        }

        let phys = {
            let mut state = self.state.lock().unwrap();
            let blk = balloc(&mut state.superblock)?;
            crate::fs::write_superblock(&mut state)?;
            blk
        };
        let mut block = [0u8; BLOCK_SIZE];
        block[..Dirent::SIZE].copy_from_slice(&entry.to_bytes());
        self.write_data_block(phys, &block)?;

        let slot = dir.disk.blocks as usize;
        dir.disk.addr[slot] = phys;
        dir.disk.blocks += 1;
        dir.disk.size += BLOCK_SIZE as u32;
        self.write_inode(dir)?;
        Ok(())
    }

    /// Removes the entry named `name` from `dir`, leaving a tombstone.
    /// Returns whether an entry was found. Does not touch `dir.nlink`;
    /// that bookkeeping belongs to the namespace operation calling this,
    /// since only the caller knows whether the removed entry was a
    /// subdirectory.
    pub fn dirdel(&self, dir: &InCoreInode, name: &str) -> Result<bool> {
        for i in 0..dir.disk.blocks as usize {
            let phys = dir.disk.addr[i];
            if phys == 0 {
                continue;
            }
            let mut block = self.read_data_block(phys)?;
            for slot in 0..DIRS_PER_BLOCK {
                let off = slot * Dirent::SIZE;
                let existing = Dirent::from_bytes(&block[off..off + Dirent::SIZE]);
                if !existing.is_tombstone() && existing.name_str() == name {
                    block[off..off + Dirent::SIZE].copy_from_slice(&Dirent::empty().to_bytes());
                    self.write_data_block(phys, &block)?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Lists all live entries in `dir`, in on-disk order.
    pub fn readdir(&self, dir: &InCoreInode) -> Result<Vec<(String, u32)>> {
        let mut out = Vec::new();
        for i in 0..dir.disk.blocks as usize {
            let phys = dir.disk.addr[i];
            if phys == 0 {
                continue;
            }
            let block = self.read_data_block(phys)?;
            for slot in 0..DIRS_PER_BLOCK {
                let off = slot * Dirent::SIZE;
                let entry = Dirent::from_bytes(&block[off..off + Dirent::SIZE]);
                if !entry.is_tombstone() {
                    out.push((entry.name_str().to_string(), entry.ino));
                }
            }
        }
        Ok(out)
    }
}
