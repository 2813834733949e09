//! uxfs: a minimal block-oriented Unix-like filesystem.
//!
//! Stores a hierarchy of directories and regular files on a raw block
//! device using the classic Unix on-disk layout: superblock, inode array,
//! data blocks. No indirect blocks, no journaling — see [`mod@alloc`] and
//! [`mod@dir`] for the allocator and directory layers that do the real
//! work, and [`fs::Filesystem`] for the mount/unmount entry point.

pub mod alloc;
pub mod device;
pub mod dir;
pub mod error;
pub mod format;
pub mod fs;
pub mod inode;
pub mod mkfs;
pub mod namespace;
mod util_time;
pub mod vtable;

pub use error::{Error, Result};
pub use fs::{Filesystem, StatFs};
pub use inode::InCoreInode;
