//! Namespace operations: lookup, create, mkdir, rmdir, link, unlink.
//!
//! Each coordinates the allocator, inode, and directory layers. Partial
//! failures during `create`/`mkdir` unwind any allocation already made
//! before returning the error — the original leaks an inode or block on
//! this path; a correct implementation must not.

use crate::alloc::{bfree, ifree};
use crate::device::BlockStore;
use crate::error::{Error, Result};
use crate::format::{BLOCK_SIZE, NAMELEN};
use crate::fs::Filesystem;
use crate::inode::{InCoreInode, S_IFDIR, S_IFMT, S_IFREG};
use std::io;

fn check_name(name: &str) -> Result<()> {
    if name.len() > NAMELEN - 1 {
        return Err(Error::NameTooLong);
    }
    Ok(())
}

fn not_found() -> Error {
    Error::Io(io::Error::new(io::ErrorKind::NotFound, "no such file or directory"))
}

impl<S: BlockStore> Filesystem<S> {
    /// Resolves `name` within `dip`. Returns `Ok(None)` for a negative
    /// lookup (no entry by that name), matching a VFS negative dentry.
    pub fn lookup(&self, dip: &InCoreInode, name: &str) -> Result<Option<InCoreInode>> {
        check_name(name)?;
        match self.find_entry(dip, name)? {
            Some(ino) => Ok(Some(self.iget(ino)?)),
            None => Ok(None),
        }
    }

    /// Creates a regular file named `name` in `dip`.
    pub fn create(&self, dip: &mut InCoreInode, name: &str, mode: u32, uid: u32, gid: u32) -> Result<InCoreInode> {
        check_name(name)?;
        if self.find_entry(dip, name)?.is_some() {
            return Err(Error::Exists);
        }

        let ino = {
            let mut state = self.state.lock().unwrap();
            let ino = crate::alloc::ialloc(&mut state.superblock)?;
            crate::fs::write_superblock(&mut state)?;
            ino
        };

        let gid = if dip.disk.mode & 0o2000 != 0 { dip.disk.gid } else { gid };
        let now = crate::util_time::now_secs();
        let mut new_inode = InCoreInode {
            ino,
            disk: crate::format::Inode::zeroed(),
        };
        new_inode.disk.mode = S_IFREG | (mode & !S_IFMT);
        new_inode.disk.nlink = 1;
        new_inode.disk.uid = uid;
        new_inode.disk.gid = gid;
        new_inode.disk.atime = now;
        new_inode.disk.mtime = now;
        new_inode.disk.ctime = now;

        if let Err(e) = self.diradd(dip, name, ino) {
            let mut state = self.state.lock().unwrap();
            ifree(&mut state.superblock, ino);
            let _ = crate::fs::write_superblock(&mut state);
            return Err(e);
        }
        self.write_inode(&new_inode)?;
        Ok(new_inode)
    }

    /// Creates a directory named `name` in `dip`.
    pub fn mkdir(&self, dip: &mut InCoreInode, name: &str, mode: u32, uid: u32, gid: u32) -> Result<InCoreInode> {
        check_name(name)?;
        if self.find_entry(dip, name)?.is_some() {
            return Err(Error::Exists);
        }

        let ino = {
            let mut state = self.state.lock().unwrap();
            let ino = crate::alloc::ialloc(&mut state.superblock)?;
            crate::fs::write_superblock(&mut state)?;
            ino
        };

        let block = {
            let mut state = self.state.lock().unwrap();
            match crate::alloc::balloc(&mut state.superblock) {
                Ok(b) => {
                    crate::fs::write_superblock(&mut state)?;
                    b
                }
                Err(e) => {
                    ifree(&mut state.superblock, ino);
                    let _ = crate::fs::write_superblock(&mut state);
                    return Err(e);
                }
            }
        };

        let gid = if dip.disk.mode & 0o2000 != 0 { dip.disk.gid } else { gid };
        let now = crate::util_time::now_secs();
        let mut new_inode = InCoreInode {
            ino,
            disk: crate::format::Inode::zeroed(),
        };
        new_inode.disk.mode = S_IFDIR | (mode & !S_IFMT);
        new_inode.disk.nlink = 2;
        new_inode.disk.uid = uid;
        new_inode.disk.gid = gid;
        new_inode.disk.size = BLOCK_SIZE as u32;
        new_inode.disk.blocks = 1;
        new_inode.disk.addr[0] = block;
        new_inode.disk.atime = now;
        new_inode.disk.mtime = now;
        new_inode.disk.ctime = now;

        let dot = crate::format::Dirent::new(ino, ".").unwrap();
        let dotdot = crate::format::Dirent::new(dip.ino, "..").unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        buf[..crate::format::Dirent::SIZE].copy_from_slice(&dot.to_bytes());
        buf[crate::format::Dirent::SIZE..2 * crate::format::Dirent::SIZE]
            .copy_from_slice(&dotdot.to_bytes());
        if let Err(e) = self.write_new_dir_block(block, &buf) {
            let mut state = self.state.lock().unwrap();
            bfree(&mut state.superblock, block);
            ifree(&mut state.superblock, ino);
            let _ = crate::fs::write_superblock(&mut state);
            return Err(e);
        }

        if let Err(e) = self.diradd(dip, name, ino) {
            let mut state = self.state.lock().unwrap();
            bfree(&mut state.superblock, block);
            ifree(&mut state.superblock, ino);
            let _ = crate::fs::write_superblock(&mut state);
            return Err(e);
        }
        self.write_inode(&new_inode)?;

        dip.disk.nlink += 1;
        self.write_inode(dip)?;

        Ok(new_inode)
    }

    fn write_new_dir_block(&self, phys: u32, data: &[u8; BLOCK_SIZE]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut handle = state.device.get_for_write(phys as u64)?;
        *handle.data_mut() = *data;
        handle.mark_dirty();
        state.device.release(handle)?;
        Ok(())
    }

    /// Removes the empty directory named `name` from `dip`.
    pub fn rmdir(&self, dip: &mut InCoreInode, name: &str) -> Result<()> {
        let ino = self.find_entry(dip, name)?.ok_or(Error::NotADirectory)?;
        let target = self.iget(ino)?;

        if target.disk.nlink > 2 || self.has_live_children(&target)? {
            return Err(Error::NotEmpty);
        }

        self.dirdel(dip, name)?;
        dip.disk.nlink -= 1;
        self.write_inode(dip)?;

        // Frees the target's inode slot, not the parent's — the original
        // frees `dip`'s slot here by mistake.
        self.delete_inode(target)?;
        Ok(())
    }

    /// Whether `dir` has any live entry besides `.`/`..`. `nlink <= 2`
    /// alone cannot rule this out: a directory can hold stray entries
    /// while still reporting `nlink == 2`, so emptiness is always
    /// confirmed by enumeration.
    fn has_live_children(&self, dir: &InCoreInode) -> Result<bool> {
        let entries = self.readdir(dir)?;
        Ok(entries.iter().any(|(n, _)| n != "." && n != ".."))
    }

    /// Adds a new name for `target` in `dip`, bumping its link count.
    pub fn link(&self, dip: &mut InCoreInode, name: &str, target: &mut InCoreInode) -> Result<()> {
        check_name(name)?;
        if self.find_entry(dip, name)?.is_some() {
            return Err(Error::Exists);
        }
        self.diradd(dip, name, target.ino)?;
        target.disk.nlink += 1;
        self.write_inode(target)?;
        Ok(())
    }

    /// Removes `name` from `dip`; frees the target inode once its link
    /// count reaches zero.
    pub fn unlink(&self, dip: &mut InCoreInode, name: &str) -> Result<()> {
        let ino = self.find_entry(dip, name)?.ok_or_else(not_found)?;
        let mut target = self.iget(ino)?;

        self.dirdel(dip, name)?;
        target.disk.nlink -= 1;
        if target.disk.nlink == 0 {
            self.delete_inode(target)?;
        } else {
            self.write_inode(&target)?;
        }
        Ok(())
    }
}
