//! `fsdb` is a read-only interactive inspector for a uxfs image: it reads
//! the superblock and inode table directly off the device without going
//! through [`uxfs::Filesystem::mount`], so inspecting an image never flips
//! its clean/dirty flag.

use std::env;
use std::fs::OpenOptions;
use std::process::exit;
use utils::prompt::prompt;
use uxfs::format::{
	BLOCK_SIZE, DIRECT_BLOCKS, DIRS_PER_BLOCK, Dirent, INUSE, INODE_BLOCK, Inode, MAGIC, MOD_CLEAN,
	Superblock,
};
use uxfs::inode::{S_IFDIR, S_IFMT};

fn main() {
	let mut args = env::args();
	let prog = args.next().unwrap_or_else(|| "fsdb".to_owned());
	let device_path = args.next().unwrap_or_else(|| {
		eprintln!("{prog}: specify path to a device");
		exit(1);
	});

	let mut file = OpenOptions::new()
		.read(true)
		.open(&device_path)
		.unwrap_or_else(|e| {
			eprintln!("{prog}: {device_path}: {e}");
			exit(1);
		});

	let sb = read_superblock(&mut file).unwrap_or_else(|| {
		println!("This is not a uxfs filesystem");
		exit(1);
	});

	while let Some(line) = prompt("uxfsdb > ", false) {
		let command = line.trim();
		let Some(first) = command.chars().next() else {
			continue;
		};
		match first {
			'q' => break,
			's' => print_superblock(&sb),
			'i' => match command[1..].trim().parse::<u32>() {
				Ok(inum) => print_inode(&mut file, &sb, inum),
				Err(_) => eprintln!("{prog}: bad inode number `{}`", &command[1..]),
			},
			_ => eprintln!("{prog}: unknown command `{command}`"),
		}
	}
}

/// Reads and validates block 0. Returns `None` if the magic does not match.
fn read_superblock(file: &mut std::fs::File) -> Option<Superblock> {
	use std::io::{Read, Seek, SeekFrom};

	let mut block = [0u8; BLOCK_SIZE];
	file.seek(SeekFrom::Start(0)).ok()?;
	file.read_exact(&mut block).ok()?;
	let sb = Superblock::from_block(&block);
	if sb.magic != MAGIC {
		return None;
	}
	Some(sb)
}

fn print_superblock(sb: &Superblock) {
	println!();
	println!("Superblock contents:");
	println!("  magic   = {:#x}", sb.magic);
	println!(
		"  mod     = {}",
		if sb.r#mod == MOD_CLEAN { "CLEAN" } else { "DIRTY" }
	);
	println!("  nifree  = {}", sb.nifree);
	println!("  nbfree  = {}", sb.nbfree);
	println!();
}

fn print_inode(file: &mut std::fs::File, sb: &Superblock, inum: u32) {
	if inum as usize >= sb.inode.len() || sb.inode[inum as usize] != INUSE {
		eprintln!("inode {inum} is not in use");
		return;
	}

	let Some(inode) = read_inode(file, inum) else {
		eprintln!("inode {inum}: read failed");
		return;
	};

	println!();
	println!("inode number {inum}");
	println!("  mode     = {:#o}", inode.mode);
	println!("  nlink    = {}", inode.nlink);
	println!("  atime    = {} (seconds since epoch)", inode.atime);
	println!("  mtime    = {} (seconds since epoch)", inode.mtime);
	println!("  ctime    = {} (seconds since epoch)", inode.ctime);
	println!("  uid      = {}", inode.uid);
	println!("  gid      = {}", inode.gid);
	println!("  size     = {}", inode.size);
	print!("  blocks   = {}", inode.blocks);
	for i in 0..DIRECT_BLOCKS {
		if i % 4 == 0 {
			println!();
		}
		print!("  addr[{i:2}] = {:3} ", inode.addr[i]);
	}
	println!();

	if inode.mode & S_IFMT == S_IFDIR {
		println!();
		println!("  Directory entries:");
		for i in 0..inode.blocks as usize {
			let phys = inode.addr[i];
			if phys == 0 {
				continue;
			}
			let Some(block) = read_block(file, phys as u64) else {
				continue;
			};
			for slot in 0..DIRS_PER_BLOCK {
				let off = slot * Dirent::SIZE;
				let entry = Dirent::from_bytes(&block[off..off + Dirent::SIZE]);
				if !entry.is_tombstone() {
					println!("    inum[{:2}], name[{}]", entry.ino, entry.name_str());
				}
			}
		}
	}
	println!();
}

fn read_inode(file: &mut std::fs::File, inum: u32) -> Option<Inode> {
	let block = read_block(file, INODE_BLOCK + inum as u64)?;
	Some(Inode::from_block(&block))
}

fn read_block(file: &mut std::fs::File, n: u64) -> Option<[u8; BLOCK_SIZE]> {
	use std::io::{Read, Seek, SeekFrom};

	let mut block = [0u8; BLOCK_SIZE];
	file.seek(SeekFrom::Start(n * BLOCK_SIZE as u64)).ok()?;
	file.read_exact(&mut block).ok()?;
	Some(block)
}
