//! The `uxfs` [`FSFactory`] implementation: detects an existing uxfs image
//! and writes a fresh one.

use crate::FSFactory;
use std::fs::File;
use std::io;
use std::path::Path;
use uxfs::format::{BLOCK_SIZE, MAGIC};

/// Builds and detects uxfs images.
#[derive(Default)]
pub struct UxfsFactory {}

impl FSFactory for UxfsFactory {
	fn is_present(&self, _path: &Path, dev: &mut File) -> io::Result<bool> {
		use std::io::{Read, Seek, SeekFrom};

		let mut block = [0u8; BLOCK_SIZE];
		dev.seek(SeekFrom::Start(0))?;
		match dev.read_exact(&mut block) {
			Ok(()) => {}
			// A device shorter than one block cannot hold a superblock.
			Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
			Err(e) => return Err(e),
		}
		let magic = u32::from_ne_bytes(block[0..4].try_into().unwrap());
		Ok(magic == MAGIC)
	}

	fn create(&self, _path: &Path, dev: &mut File) -> io::Result<()> {
		let available = utils::disk::get_disk_size(&*dev)? * 512;
		let required = uxfs::mkfs::IMAGE_BLOCKS * BLOCK_SIZE as u64;
		if available > 0 && available < required {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("device too small for uxfs: needs {required} bytes, has {available}"),
			));
		}

		uxfs::mkfs::format(&mut *dev).map_err(|e| match e {
			uxfs::Error::Io(e) => e,
			other => io::Error::new(io::ErrorKind::Other, other.to_string()),
		})
	}
}
