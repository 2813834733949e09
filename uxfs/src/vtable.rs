//! VFS-shaped operation traits. uxfs has no host VFS of its own to plug
//! into (that integration point is explicitly someone else's concern);
//! these traits exist so a future host binding implements against the same
//! seams a real kernel would dispatch through, named after the originals:
//! `super_operations`, `inode_operations`, `file_operations`, and
//! `address_space_operations`.

use crate::error::Result;
use crate::fs::StatFs;
use crate::inode::InCoreInode;

/// Superblock-wide operations.
pub trait SuperOps {
    fn write_inode(&self, inode: &InCoreInode) -> Result<()>;
    fn delete_inode(&self, inode: InCoreInode) -> Result<()>;
    fn put_super(self) -> Result<()>;
    fn write_super(&self) -> Result<()>;
    fn statfs(&self) -> StatFs;
}

/// Operations on a directory inode.
pub trait DirInodeOps {
    fn create(&self, dip: &mut InCoreInode, name: &str, mode: u32, uid: u32, gid: u32) -> Result<InCoreInode>;
    fn lookup(&self, dip: &InCoreInode, name: &str) -> Result<Option<InCoreInode>>;
    fn mkdir(&self, dip: &mut InCoreInode, name: &str, mode: u32, uid: u32, gid: u32) -> Result<InCoreInode>;
    fn rmdir(&self, dip: &mut InCoreInode, name: &str) -> Result<()>;
    fn link(&self, dip: &mut InCoreInode, name: &str, target: &mut InCoreInode) -> Result<()>;
    fn unlink(&self, dip: &mut InCoreInode, name: &str) -> Result<()>;
}

/// Operations on an open directory file (readdir).
pub trait DirFileOps {
    fn readdir(&self, dir: &InCoreInode) -> Result<Vec<(String, u32)>>;
}

/// Operations on a regular-file inode. The original registers the same
/// `link`/`unlink` functions here as on the directory inode_operations
/// struct (`ux_file_inops`/`ux_dir_inops` both point at `ux_link`/
/// `ux_unlink`); this trait exists as the separate named seam spec.md
/// §6.3 calls out, even though it delegates to the same namespace
/// operations.
pub trait RegularFileInodeOps {
    fn link(&self, dip: &mut InCoreInode, name: &str, target: &mut InCoreInode) -> Result<()>;
    fn unlink(&self, dip: &mut InCoreInode, name: &str) -> Result<()>;
}

/// Block-mapping, parameterizing the read/write/mmap path a real page
/// cache would drive.
pub trait AddressSpaceOps {
    fn get_block(&self, inode: &mut InCoreInode, logical: usize, create: bool) -> Result<u32>;
}

mod impls {
    use super::*;
    use crate::device::BlockStore;
    use crate::fs::Filesystem;

    impl<S: BlockStore> SuperOps for Filesystem<S> {
        fn write_inode(&self, inode: &InCoreInode) -> Result<()> {
            Filesystem::write_inode(self, inode)
        }

        fn delete_inode(&self, inode: InCoreInode) -> Result<()> {
            Filesystem::delete_inode(self, inode)
        }

        fn put_super(self) -> Result<()> {
            self.unmount()
        }

        fn write_super(&self) -> Result<()> {
            self.sync()
        }

        fn statfs(&self) -> StatFs {
            Filesystem::statfs(self)
        }
    }

    impl<S: BlockStore> DirInodeOps for Filesystem<S> {
        fn create(&self, dip: &mut InCoreInode, name: &str, mode: u32, uid: u32, gid: u32) -> Result<InCoreInode> {
            Filesystem::create(self, dip, name, mode, uid, gid)
        }

        fn lookup(&self, dip: &InCoreInode, name: &str) -> Result<Option<InCoreInode>> {
            Filesystem::lookup(self, dip, name)
        }

        fn mkdir(&self, dip: &mut InCoreInode, name: &str, mode: u32, uid: u32, gid: u32) -> Result<InCoreInode> {
            Filesystem::mkdir(self, dip, name, mode, uid, gid)
        }

        fn rmdir(&self, dip: &mut InCoreInode, name: &str) -> Result<()> {
            Filesystem::rmdir(self, dip, name)
        }

        fn link(&self, dip: &mut InCoreInode, name: &str, target: &mut InCoreInode) -> Result<()> {
            Filesystem::link(self, dip, name, target)
        }

        fn unlink(&self, dip: &mut InCoreInode, name: &str) -> Result<()> {
            Filesystem::unlink(self, dip, name)
        }
    }

    impl<S: BlockStore> DirFileOps for Filesystem<S> {
        fn readdir(&self, dir: &InCoreInode) -> Result<Vec<(String, u32)>> {
            Filesystem::readdir(self, dir)
        }
    }

    impl<S: BlockStore> RegularFileInodeOps for Filesystem<S> {
        fn link(&self, dip: &mut InCoreInode, name: &str, target: &mut InCoreInode) -> Result<()> {
            Filesystem::link(self, dip, name, target)
        }

        fn unlink(&self, dip: &mut InCoreInode, name: &str) -> Result<()> {
            Filesystem::unlink(self, dip, name)
        }
    }

    impl<S: BlockStore> AddressSpaceOps for Filesystem<S> {
        fn get_block(&self, inode: &mut InCoreInode, logical: usize, create: bool) -> Result<u32> {
            Filesystem::get_block(self, inode, logical, create)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ROOT_INO;
    use crate::fs::Filesystem;
    use std::io::Cursor;

    fn fresh_fs() -> Filesystem<Cursor<Vec<u8>>> {
        let buf = crate::mkfs::write_image();
        Filesystem::mount(Cursor::new(buf)).unwrap()
    }

    #[test]
    fn regular_file_inode_ops_link_and_unlink() {
        let fs = fresh_fs();
        let mut root = fs.iget(ROOT_INO).unwrap();
        let mut a = fs.create(&mut root, "a", 0o644, 0, 0).unwrap();

        RegularFileInodeOps::link(&fs, &mut root, "b", &mut a).unwrap();
        assert_eq!(a.disk.nlink, 2);

        RegularFileInodeOps::unlink(&fs, &mut root, "a").unwrap();
        assert!(fs.lookup(&root, "a").unwrap().is_none());
        let b = fs.lookup(&root, "b").unwrap().unwrap();
        assert_eq!(b.ino, a.ino);
        assert_eq!(b.disk.nlink, 1);
    }
}
