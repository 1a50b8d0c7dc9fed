/*
 * Copyright 2025 Luc Lenôtre
 *
 * This file is part of Maestro.
 *
 * Maestro is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * Maestro is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * Maestro. If not, see <https://www.gnu.org/licenses/>.
 */

//! Error taxonomy shared by every component of the core.
//!
//! Operations propagate this type with `?`; the CLI layer is the only place
//! it gets translated into an errno / exit status (see [`crate::cli`]).

use std::fmt;
use std::io;

/// An error produced by the core ext2 object manager.
#[derive(Debug)]
pub enum Error {
    /// A path or its parent does not exist, a non-directory was traversed as
    /// if it were one, or the path was not absolute.
    NoEntry,
    /// The target name already exists.
    Exists,
    /// The operation was refused because the target is (or would require)
    /// a directory.
    IsDirectory,
    /// No free inode or no free block was available.
    OutOfSpace,
    /// `restore` located the hidden entry, but its inode or one of its
    /// blocks has since been reused.
    NotRecoverable,
    /// A host-side I/O failure (opening the source file, stat, read, ...).
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEntry => write!(f, "no such file or directory"),
            Self::Exists => write!(f, "file exists"),
            Self::IsDirectory => write!(f, "is a directory"),
            Self::OutOfSpace => write!(f, "no space left on device"),
            Self::NotRecoverable => write!(f, "entry is not recoverable"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Convenience alias for results produced by the core.
pub type Result<T> = std::result::Result<T, Error>;
