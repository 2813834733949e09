//! In-core inode materialization, write-back, deletion, and block mapping.
//!
//! There is no separate inode cache here — that layer is explicitly a host
//! concern this crate plugs into, not something uxfs itself provides,
//! so [`Filesystem::iget`] simply materializes a fresh [`InCoreInode`] on
//! every call rather than returning a shared, reference-counted handle.
//! Lifecycle rules (free on `nlink == 0`) are still upheld: namespace
//! operations call [`Filesystem::delete_inode`] themselves the moment a
//! link count reaches zero, since there is no open-file-handle layer here
//! to defer it to a "last close".

use crate::alloc::{balloc, bfree};
use crate::device::BlockStore;
use crate::error::{Error, Result};
use crate::format::{DIRECT_BLOCKS, Inode, MAXFILES, ROOT_INO};
use crate::fs::{Filesystem, data_block, inode_block};
use std::io;

/// Type tag bits within `mode`, mirroring POSIX `S_IFMT`.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;

/// An in-core inode: an inode number plus its embedded on-disk payload,
/// the source of truth for `addr[]`/`blocks` until written back.
#[derive(Clone)]
pub struct InCoreInode {
    pub ino: u32,
    pub disk: Inode,
}

impl InCoreInode {
    pub fn is_dir(&self) -> bool {
        self.disk.mode & S_IFMT == S_IFDIR
    }
}

fn check_ino_range(ino: u32) -> Result<()> {
    if ino < ROOT_INO || ino as usize >= MAXFILES {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "inode number out of range",
        )));
    }
    Ok(())
}

impl<S: BlockStore> Filesystem<S> {
    /// Materializes the in-core inode for slot `ino` from disk.
    pub fn iget(&self, ino: u32) -> Result<InCoreInode> {
        check_ino_range(ino)?;
        let mut state = self.state.lock().unwrap();
        let handle = state.device.read(inode_block(ino))?;
        let disk = Inode::from_block(handle.data());
        state.device.release(handle)?;
        Ok(InCoreInode { ino, disk })
    }

    /// Serializes `inode`'s embedded payload back to its inode block.
    pub fn write_inode(&self, inode: &InCoreInode) -> Result<()> {
        check_ino_range(inode.ino)?;
        let mut state = self.state.lock().unwrap();
        let mut handle = state.device.get_for_write(inode_block(inode.ino))?;
        *handle.data_mut() = inode.disk.to_block();
        handle.mark_dirty();
        state.device.release(handle)?;
        Ok(())
    }

    /// Frees every data block the inode holds, then frees the inode slot
    /// itself. Called when `nlink` reaches zero.
    pub fn delete_inode(&self, inode: InCoreInode) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for i in 0..inode.disk.blocks as usize {
            let blk = inode.disk.addr[i];
            if blk != 0 {
                bfree(&mut state.superblock, blk);
            }
        }
        crate::alloc::ifree(&mut state.superblock, inode.ino);
        crate::fs::write_superblock(&mut state)?;
        Ok(())
    }

    /// Maps a logical block index to a physical block number, allocating a
    /// new block on `create` if the slot was unused. Returns 0 (a hole)
    /// when `!create` and the slot is unallocated.
    pub fn get_block(&self, inode: &mut InCoreInode, logical: usize, create: bool) -> Result<u32> {
        if logical >= DIRECT_BLOCKS {
            return Err(Error::FileTooBig);
        }
        if create && inode.disk.addr[logical] == 0 {
            let mut state = self.state.lock().unwrap();
            let blk = balloc(&mut state.superblock)?;
            crate::fs::write_superblock(&mut state)?;
            drop(state);
            inode.disk.addr[logical] = blk;
            inode.disk.blocks += 1;
            self.write_inode(inode)?;
        }
        Ok(inode.disk.addr[logical])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkfs::write_image;
    use std::io::Cursor;

    fn fresh_fs() -> Filesystem<Cursor<Vec<u8>>> {
        let buf = write_image();
        Filesystem::mount(Cursor::new(buf)).unwrap()
    }

    #[test]
    fn iget_root_is_directory() {
        let fs = fresh_fs();
        let root = fs.iget(ROOT_INO).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.disk.nlink, 3);
        assert_eq!(root.disk.blocks, 1);
        assert_eq!(root.disk.addr[0], data_block(0) as u32);
    }

    #[test]
    fn iget_rejects_out_of_range() {
        let fs = fresh_fs();
        assert!(fs.iget(0).is_err());
        assert!(fs.iget(1).is_err());
        assert!(fs.iget(32).is_err());
    }

    #[test]
    fn write_inode_round_trip() {
        let fs = fresh_fs();
        let mut root = fs.iget(ROOT_INO).unwrap();
        root.disk.mtime = 12345;
        fs.write_inode(&root).unwrap();
        let back = fs.iget(ROOT_INO).unwrap();
        assert_eq!(back.disk.mtime, 12345);
    }

    #[test]
    fn get_block_beyond_direct_is_too_big() {
        let fs = fresh_fs();
        let mut root = fs.iget(ROOT_INO).unwrap();
        assert!(matches!(
            fs.get_block(&mut root, DIRECT_BLOCKS, true),
            Err(Error::FileTooBig)
        ));
    }

    #[test]
    fn get_block_allocates_on_create() {
        let fs = fresh_fs();
        let lf = fs.iget(crate::format::LOST_FOUND_INO).unwrap();
        let mut fresh = InCoreInode {
            ino: lf.ino,
            disk: Inode::zeroed(),
        };
        let blk = fs.get_block(&mut fresh, 1, true).unwrap();
        assert!(blk != 0);
        assert_eq!(fresh.disk.blocks, 1);
    }
}
