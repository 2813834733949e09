//! Error kinds surfaced by uxfs operations, per the error-handling design:
//! numeric-code-style errors, none retried internally.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// No free inode, no free data block, or a directory's 16 blocks are
    /// all full with no tombstone slot.
    NoSpace,
    /// `create`/`mkdir` target name already exists in the parent.
    Exists,
    /// `rmdir` target not found in its parent.
    NotADirectory,
    /// `rmdir` target has live entries besides `.`/`..`.
    NotEmpty,
    /// A name exceeds `NAMELEN - 1` visible bytes.
    NameTooLong,
    /// A write targets a logical block beyond `DIRECT_BLOCKS`.
    FileTooBig,
    /// An inode number falls outside `[ROOT_INO, MAXFILES)`, or a buffer
    /// read/write failed.
    Io(io::Error),
    /// Mounting a device whose block 0 lacks the magic, or is dirty.
    Invalid(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpace => write!(f, "no space left on device"),
            Self::Exists => write!(f, "file exists"),
            Self::NotADirectory => write!(f, "not a directory"),
            Self::NotEmpty => write!(f, "directory not empty"),
            Self::NameTooLong => write!(f, "file name too long"),
            Self::FileTooBig => write!(f, "file too large"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Invalid(msg) => write!(f, "invalid filesystem: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
