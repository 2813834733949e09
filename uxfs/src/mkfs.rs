//! Initial image construction, shared by the `mkfs` binary and the test
//! suite. Writing the image is the only thing `mkfs` itself needs to do —
//! per the design, it "simply writes a valid initial image"; there is no
//! further complexity worth hiding behind a factory abstraction the way
//! other on-disk formats might need.

use crate::device::{BlockHandle, BlockStore, Device};
use crate::error::Result;
use crate::format::{
    BLOCK_SIZE, Dirent, FIRST_DATA_BLOCK, Inode, LOST_FOUND_INO, ROOT_INO, Superblock,
};
use crate::inode::S_IFDIR;
use std::io::Cursor;

/// Total number of blocks a minimal uxfs image spans: the reserved header
/// blocks, the inode table, and the full data region.
pub const IMAGE_BLOCKS: u64 = FIRST_DATA_BLOCK + crate::format::MAXBLOCKS as u64;

fn write_dirent_block(block: &mut [u8; BLOCK_SIZE], entries: &[Dirent]) {
    for (i, entry) in entries.iter().enumerate() {
        let off = i * Dirent::SIZE;
        block[off..off + Dirent::SIZE].copy_from_slice(&entry.to_bytes());
    }
}

/// Formats `store` with a fresh uxfs image: superblock, root directory
/// (inode 2) and `lost+found` (inode 3), and their data blocks.
pub fn format<S: BlockStore>(store: S) -> Result<()> {
    let mut device = Device::new(store);

    zero_device(&mut device)?;

    let sb = Superblock::fresh();
    write_block(&mut device, 0, sb.to_block())?;

    let now = crate::util_time::now_secs();

    let mut root = Inode::zeroed();
    root.mode = S_IFDIR | 0o755;
    root.nlink = 3;
    root.blocks = 1;
    root.size = BLOCK_SIZE as u32;
    root.addr[0] = FIRST_DATA_BLOCK as u32;
    root.atime = now;
    root.mtime = now;
    root.ctime = now;
    write_inode_block(&mut device, ROOT_INO, root)?;

    let mut lost_found = Inode::zeroed();
    lost_found.mode = S_IFDIR | 0o755;
    lost_found.nlink = 2;
    lost_found.blocks = 1;
    lost_found.size = BLOCK_SIZE as u32;
    lost_found.addr[0] = FIRST_DATA_BLOCK as u32 + 1;
    lost_found.atime = now;
    lost_found.mtime = now;
    lost_found.ctime = now;
    write_inode_block(&mut device, LOST_FOUND_INO, lost_found)?;

    let mut root_dir_block = [0u8; BLOCK_SIZE];
    write_dirent_block(
        &mut root_dir_block,
        &[
            Dirent::new(ROOT_INO, ".").unwrap(),
            Dirent::new(ROOT_INO, "..").unwrap(),
            Dirent::new(LOST_FOUND_INO, "lost+found").unwrap(),
        ],
    );
    write_block(&mut device, FIRST_DATA_BLOCK, root_dir_block)?;

    let mut lost_found_block = [0u8; BLOCK_SIZE];
    write_dirent_block(
        &mut lost_found_block,
        &[
            Dirent::new(LOST_FOUND_INO, ".").unwrap(),
            Dirent::new(ROOT_INO, "..").unwrap(),
        ],
    );
    write_block(&mut device, FIRST_DATA_BLOCK + 1, lost_found_block)?;

    Ok(())
}

/// Zeroes every block of the image, reserved slots and data blocks alike,
/// so stale bytes from whatever previously occupied the device never
/// survive a format (e.g. a prior image's leftover inode 0/1 slots or
/// unused data blocks, visible through `fsdb` otherwise).
fn zero_device<S: BlockStore>(device: &mut Device<S>) -> Result<()> {
    let zero = [0u8; BLOCK_SIZE];
    for n in 0..IMAGE_BLOCKS {
        write_block(device, n, zero)?;
    }
    Ok(())
}

fn write_block<S: BlockStore>(device: &mut Device<S>, n: u64, data: [u8; BLOCK_SIZE]) -> Result<()> {
    let mut handle: BlockHandle = device.get_for_write(n)?;
    *handle.data_mut() = data;
    handle.mark_dirty();
    device.release(handle)?;
    Ok(())
}

fn write_inode_block<S: BlockStore>(device: &mut Device<S>, ino: u32, inode: Inode) -> Result<()> {
    write_block(device, crate::format::INODE_BLOCK + ino as u64, inode.to_block())
}

/// Builds a minimal fresh image entirely in memory, for tests.
pub fn write_image() -> Vec<u8> {
    let mut cursor = Cursor::new(vec![0u8; (IMAGE_BLOCKS * BLOCK_SIZE as u64) as usize]);
    format(&mut cursor).expect("in-memory format cannot fail");
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{INODE_BLOCK, INUSE, MAXFILES};

    #[test]
    fn format_zeroes_stale_bytes() {
        let mut stale = vec![0xA5u8; (IMAGE_BLOCKS * BLOCK_SIZE as u64) as usize];
        let mut cursor = Cursor::new(&mut stale);
        format(&mut cursor).unwrap();
        drop(cursor);

        // Reserved-but-never-written inode slot 0 must read as all-zero,
        // not whatever garbage previously lived on the device.
        let slot0_off = (INODE_BLOCK * BLOCK_SIZE as u64) as usize;
        assert!(stale[slot0_off..slot0_off + BLOCK_SIZE].iter().all(|&b| b == 0));

        // A data block never allocated by mkfs (e.g. the one right after
        // lost+found's) must also read as all-zero.
        let unused_block_off = ((FIRST_DATA_BLOCK + 2) * BLOCK_SIZE as u64) as usize;
        assert!(
            stale[unused_block_off..unused_block_off + BLOCK_SIZE]
                .iter()
                .all(|&b| b == 0)
        );
    }

    #[test]
    fn format_leaves_only_reserved_slots_in_use() {
        let image = write_image();
        let sb = Superblock::from_block((&image[..BLOCK_SIZE]).try_into().unwrap());
        assert_eq!(&sb.inode[0..4], &[INUSE; 4]);
        assert_eq!(&sb.inode[4..], &[crate::format::FREE; MAXFILES - 4][..]);
    }
}
