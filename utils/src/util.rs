//! This module implements utility functions.

use std::fmt;
use std::mem::size_of;

/// Performs the log2 operatin on the given integer.
///
/// If the result is undefined, the function returns None.
pub fn log2(n: u64) -> Option<u64> {
	let num_bits = (size_of::<u64>() * 8) as u64;

	let n = num_bits - n.leading_zeros() as u64;
	if n > 0 {
		Some(n - 1)
	} else {
		None
	}
}

/// Structure representing a number of bytes.
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut order = log2(self.0).unwrap_or(0) / log2(1024).unwrap();

		let suffix = match order {
			0 => "bytes",
			1 => "KiB",
			2 => "MiB",
			3 => "GiB",
			4 => "TiB",
			5 => "PiB",
			6 => "EiB",
			7 => "ZiB",
			8 => "YiB",

			_ => {
				order = 0;
				"bytes"
			}
		};

		let unit = 1024usize.pow(order as u32);
		let nbr = self.0 / unit as u64;

		write!(fmt, "{} {}", nbr, suffix)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn bytesize() {
		assert_eq!(format!("{}", ByteSize(0)).as_str(), "0 bytes");
		assert_eq!(format!("{}", ByteSize(1)).as_str(), "1 bytes");
		assert_eq!(format!("{}", ByteSize(1023)).as_str(), "1023 bytes");
		assert_eq!(format!("{}", ByteSize(1024)).as_str(), "1 KiB");
		assert_eq!(format!("{}", ByteSize(1025)).as_str(), "1 KiB");
		assert_eq!(format!("{}", ByteSize(2048)).as_str(), "2 KiB");
		assert_eq!(format!("{}", ByteSize(1024 * 1024)).as_str(), "1 MiB");
		assert_eq!(
			format!("{}", ByteSize(1024 * 1024 * 1024)).as_str(),
			"1 GiB"
		);
		assert_eq!(
			format!("{}", ByteSize(1024 * 1024 * 1024 * 1024)).as_str(),
			"1 TiB"
		);
	}
}
