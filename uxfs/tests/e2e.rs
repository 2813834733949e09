//! End-to-end scenarios driving `Filesystem` the way `mkfs`+`fsdb`+a host
//! VFS would: format, mount, perform namespace operations, remount.

use std::io::Cursor;
use uxfs::format::{DIRECT_BLOCKS, FIRST_DATA_BLOCK, LOST_FOUND_INO, MAXBLOCKS, MAXFILES, ROOT_INO};
use uxfs::inode::S_IFDIR;
use uxfs::{Error, Filesystem};

fn fresh_image() -> Vec<u8> {
    uxfs::mkfs::write_image()
}

/// Scenario A: mkfs on a fresh device, then inspect inode 2.
#[test]
fn scenario_a_mkfs_root_layout() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let root = fs.iget(ROOT_INO).unwrap();

    assert_eq!(root.disk.mode & S_IFDIR, S_IFDIR);
    assert_eq!(root.disk.nlink, 3);
    assert_eq!(root.disk.blocks, 1);
    assert_eq!(root.disk.addr[0], FIRST_DATA_BLOCK as u32);

    let entries = fs.readdir(&root).unwrap();
    assert_eq!(
        entries,
        vec![
            (".".to_string(), ROOT_INO),
            ("..".to_string(), ROOT_INO),
            ("lost+found".to_string(), LOST_FOUND_INO),
        ]
    );
}

/// Scenario B: create, unmount, remount, lookup.
#[test]
fn scenario_b_create_survives_remount() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    let created = fs.create(&mut root, "a", 0o644, 0, 0).unwrap();
    let ino = created.ino;
    fs.sync().unwrap();

    // Simulate unmount/remount by tearing down and rebuilding over the
    // same backing bytes.
    let image = extract_bytes(fs);
    let fs2 = Filesystem::mount(Cursor::new(image)).unwrap();
    let root2 = fs2.iget(ROOT_INO).unwrap();
    let found = fs2.lookup(&root2, "a").unwrap().unwrap();
    assert_eq!(found.ino, ino);
    assert_eq!(found.disk.nlink, 1);
    assert_eq!(found.disk.size, 0);
    assert_eq!(found.disk.blocks, 0);
}

/// Scenario C: mkdir, create inside it, statfs and readdir ordering.
#[test]
fn scenario_c_mkdir_create_statfs_readdir() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    let mut d = fs.mkdir(&mut root, "d", 0o755, 0, 0).unwrap();
    fs.create(&mut d, "x", 0o644, 0, 0).unwrap();

    let stat = fs.statfs();
    assert_eq!(stat.nifree, MAXFILES as u32 - 6);
    assert_eq!(stat.nbfree, MAXBLOCKS as u32 - 3);

    let entries = fs.readdir(&d).unwrap();
    assert_eq!(
        entries,
        vec![
            (".".to_string(), d.ino),
            ("..".to_string(), ROOT_INO),
            ("x".to_string(), entries[2].1),
        ]
    );
}

/// Scenario D: create, link, unlink the original name, check the new name
/// still resolves with the right link count.
#[test]
fn scenario_d_link_unlink() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    let mut a = fs.create(&mut root, "a", 0o644, 0, 0).unwrap();
    fs.link(&mut root, "b", &mut a).unwrap();
    fs.unlink(&mut root, "a").unwrap();

    assert!(fs.lookup(&root, "a").unwrap().is_none());
    let b = fs.lookup(&root, "b").unwrap().unwrap();
    assert_eq!(b.ino, a.ino);
    assert_eq!(b.disk.nlink, 1);
}

/// Scenario E: mkdir then rmdir frees the slot for reuse by `ialloc`.
#[test]
fn scenario_e_rmdir_frees_slot_for_reuse() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    let d = fs.mkdir(&mut root, "d", 0o755, 0, 0).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    fs.rmdir(&mut root, "d").unwrap();

    let mut root = fs.iget(ROOT_INO).unwrap();
    let reused = fs.create(&mut root, "e", 0o644, 0, 0).unwrap();
    assert_eq!(reused.ino, d.ino);
}

/// Scenario F: exhaust inodes; every reserved-onward slot ends up in use.
#[test]
fn scenario_f_exhaust_inodes() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();

    let available = MAXFILES - 4;
    for i in 0..available {
        fs.create(&mut root, &format!("f{i}"), 0o644, 0, 0).unwrap();
    }
    assert_eq!(fs.statfs().nifree, 0);
    assert!(matches!(
        fs.create(&mut root, "overflow", 0o644, 0, 0),
        Err(Error::NoSpace)
    ));
}

/// Boundary 9: the 29th file after an empty mkfs succeeds; the 29th
/// *attempt beyond that* (i.e. file number 29, 0-indexed overflow) fails.
#[test]
fn boundary_creating_up_to_capacity() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();

    for i in 0..(MAXFILES - 4) {
        assert!(fs.create(&mut root, &format!("f{i}"), 0o644, 0, 0).is_ok());
    }
    assert!(matches!(
        fs.create(&mut root, "one_too_many", 0o644, 0, 0),
        Err(Error::NoSpace)
    ));
}

/// Boundary 10: writing past the 16th direct block returns EFBIG.
#[test]
fn boundary_efbig_past_direct_blocks() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    let mut file = fs.create(&mut root, "big", 0o644, 0, 0).unwrap();
    assert!(matches!(
        fs.get_block(&mut file, DIRECT_BLOCKS, true),
        Err(Error::FileTooBig)
    ));
}

/// Boundary 11: a 27-byte name is accepted, 28 bytes is not.
#[test]
fn boundary_name_length() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let mut root = fs.iget(ROOT_INO).unwrap();
    assert!(fs.create(&mut root, &"n".repeat(27), 0o644, 0, 0).is_ok());
    assert!(matches!(
        fs.create(&mut root, &"n".repeat(28), 0o644, 0, 0),
        Err(Error::NameTooLong)
    ));
}

/// Round-trip 7: mkfs -> mount -> unmount -> mount produces identical bytes,
/// since a clean unmount resets `mod` back to CLEAN (unlike the original,
/// which leaves every subsequent mount refusing with "dirty image" — see
/// §9 bug #4).
#[test]
fn round_trip_mount_unmount_mount() {
    let image = fresh_image();
    let fs = Filesystem::mount(Cursor::new(image)).unwrap();
    let bytes_after_first_cycle = extract_bytes(fs);

    let fs2 = Filesystem::mount(Cursor::new(bytes_after_first_cycle.clone())).unwrap();
    let bytes_after_second_cycle = extract_bytes(fs2);

    assert_eq!(bytes_after_first_cycle, bytes_after_second_cycle);
}

fn extract_bytes(fs: Filesystem<Cursor<Vec<u8>>>) -> Vec<u8> {
    fs.unmount_and_take().expect("unmount").into_inner()
}
