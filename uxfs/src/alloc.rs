//! Inode and data-block allocator: linear scans over the in-core
//! superblock's bitmaps.
//!
//! These functions only mutate the in-core [`Superblock`]; callers are
//! responsible for writing the superblock block back to the device and for
//! serializing concurrent access (a single filesystem-wide lock, per the
//! concurrency model).

use crate::error::{Error, Result};
use crate::format::{FIRST_DATA_BLOCK, FREE, INUSE, MAXBLOCKS, MAXFILES, Superblock};

/// First inode slot a regular allocation may land on; slots 0-3 are
/// reserved (0 and 1 unused sentinels, 2 root, 3 lost+found).
const FIRST_ALLOCATABLE_INODE: usize = 3;
/// First data block slot a regular allocation may land on; slot 0 is
/// reserved for the root directory's first block and slot 1 for
/// `lost+found`'s.
const FIRST_ALLOCATABLE_BLOCK: usize = 1;

/// Allocates a free inode slot, returning its number.
pub fn ialloc(sb: &mut Superblock) -> Result<u32> {
    if sb.nifree == 0 {
        return Err(Error::NoSpace);
    }
    for (i, slot) in sb.inode.iter_mut().enumerate().skip(FIRST_ALLOCATABLE_INODE) {
        if *slot == FREE {
            *slot = INUSE;
            sb.nifree -= 1;
            return Ok(i as u32);
        }
    }
    Err(Error::NoSpace)
}

/// Allocates a free data block, returning its absolute block number.
pub fn balloc(sb: &mut Superblock) -> Result<u32> {
    if sb.nbfree == 0 {
        return Err(Error::NoSpace);
    }
    for (i, slot) in sb.block.iter_mut().enumerate().skip(FIRST_ALLOCATABLE_BLOCK) {
        if *slot == FREE {
            *slot = INUSE;
            sb.nbfree -= 1;
            return Ok(FIRST_DATA_BLOCK as u32 + i as u32);
        }
    }
    Err(Error::NoSpace)
}

/// Frees inode slot `ino`. Freeing an already-free slot is a caller bug and
/// is not checked here, matching the original's undefined behavior on that
/// path — callers must only free slots they hold.
pub fn ifree(sb: &mut Superblock, ino: u32) {
    sb.inode[ino as usize] = FREE;
    sb.nifree += 1;
}

/// Frees data block `blkno`.
pub fn bfree(sb: &mut Superblock, blkno: u32) {
    let i = blkno - FIRST_DATA_BLOCK as u32;
    sb.block[i as usize] = FREE;
    sb.nbfree += 1;
}
