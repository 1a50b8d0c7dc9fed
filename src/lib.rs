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

//! A userspace ext2 object manager: the core byte-level routines behind
//! `cp`, `ln`, `mkdir`, `rm`, `restore` and the consistency checker, plus
//! the `cli`/`readimage` scaffolding the binary builds on.
//!
//! Every routine here operates on a plain `&mut [u8]` through [`image`]'s
//! typed view rather than touching a mapping directly, so the whole core is
//! exercised in tests against in-memory fixtures without ever opening a
//! file.

pub mod bitmap;
pub mod checker;
pub mod cli;
pub mod dir;
pub mod dirent;
pub mod error;
#[cfg(test)]
pub(crate) mod fixture;
pub mod group_desc;
pub mod image;
pub mod inode;
pub mod layout;
pub mod ops;
pub mod path;
pub mod readimage;
pub mod superblock;
