//! The inode record and its block-enumeration iterator.

use crate::layout::{DIRECT_BLOCKS, INDIRECT_BLOCK_IDX, INDIRECT_ENTRIES};
use std::mem::size_of;

/// Mask isolating the object-kind nibble of `i_mode`.
pub const MODE_KIND_MASK: u16 = 0xf000;
/// `i_mode` kind: regular file.
pub const MODE_REGULAR: u16 = 0x8000;
/// `i_mode` kind: directory.
pub const MODE_DIRECTORY: u16 = 0x4000;
/// `i_mode` kind: symbolic link.
pub const MODE_SYMLINK: u16 = 0xa000;

/// The kind of filesystem object an inode describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

impl FileKind {
    /// Classifies a raw `i_mode` value.
    pub fn from_mode(mode: u16) -> Self {
        match mode & MODE_KIND_MASK {
            MODE_REGULAR => Self::Regular,
            MODE_DIRECTORY => Self::Directory,
            MODE_SYMLINK => Self::Symlink,
            _ => Self::Other,
        }
    }
}

/// The on-disk inode record (128 bytes).
#[repr(C, packed)]
pub struct Inode {
    pub i_mode: u16,
    pub i_uid: u16,
    pub i_size: u32,
    pub i_atime: u32,
    pub i_ctime: u32,
    pub i_mtime: u32,
    pub i_dtime: u32,
    pub i_gid: u16,
    pub i_links_count: u16,
    pub i_blocks: u32,
    pub i_flags: u32,
    pub i_osd1: u32,
    pub i_block: [u32; 15],
    pub i_generation: u32,
    pub i_file_acl: u32,
    pub i_dir_acl: u32,
    pub i_faddr: u32,
    pub i_osd2: [u8; 12],
}

const _: () = assert!(size_of::<Inode>() == 128);

impl Inode {
    /// Zeroes the record in place, as done when an inode is freshly
    /// allocated.
    pub fn reset(&mut self) {
        *self = unsafe { std::mem::zeroed() };
    }

    /// Returns this inode's kind.
    pub fn kind(&self) -> FileKind {
        FileKind::from_mode(self.i_mode)
    }

    /// Returns whether this inode is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Directory
    }

    /// The number of data blocks (direct + indirect index + indirect
    /// payload) this inode currently references, derived from `i_blocks`.
    pub fn data_block_count(&self) -> u32 {
        self.i_blocks / 2
    }
}

/// The role a block plays within an inode's data layout, as yielded by
/// [`blocks_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    /// One of the 12 direct slots, with its index.
    Direct(usize),
    /// The single-indirect index block itself.
    IndirectIndex,
    /// An entry within the indirect block, with its index into it.
    IndirectPayload(usize),
}

/// Iterates over the data blocks referenced by an inode, in on-disk order:
/// direct slots 0..12, then (if any blocks remain) the indirect index block
/// itself exactly once, then the blocks it points to.
///
/// Stops once `i_blocks / 2` blocks have been yielded, matching the
/// authoritative block count recorded in the inode rather than scanning
/// until a zero entry is found.
pub struct BlocksOf<'a> {
    direct: &'a [u32; 15],
    indirect: Option<&'a [u32; INDIRECT_ENTRIES]>,
    remaining: u32,
    idx: usize,
    indirect_idx: usize,
}

impl<'a> BlocksOf<'a> {
    pub(crate) fn new(
        direct: &'a [u32; 15],
        indirect: Option<&'a [u32; INDIRECT_ENTRIES]>,
        total_blocks: u32,
    ) -> Self {
        Self {
            direct,
            indirect,
            remaining: total_blocks,
            idx: 0,
            indirect_idx: 0,
        }
    }
}

impl Iterator for BlocksOf<'_> {
    type Item = (u32, BlockRole);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.idx < DIRECT_BLOCKS {
            let i = self.idx;
            self.idx += 1;
            self.remaining -= 1;
            return Some((self.direct[i], BlockRole::Direct(i)));
        }
        if self.idx == INDIRECT_BLOCK_IDX && self.indirect_idx == 0 {
            self.idx += 1;
            self.remaining -= 1;
            return Some((self.direct[INDIRECT_BLOCK_IDX], BlockRole::IndirectIndex));
        }
        let indirect = self.indirect?;
        let i = self.indirect_idx;
        self.indirect_idx += 1;
        self.remaining -= 1;
        Some((indirect[i], BlockRole::IndirectPayload(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_mode() {
        assert_eq!(FileKind::from_mode(MODE_REGULAR | 0o644), FileKind::Regular);
        assert_eq!(FileKind::from_mode(MODE_DIRECTORY | 0o755), FileKind::Directory);
        assert_eq!(FileKind::from_mode(MODE_SYMLINK | 0o777), FileKind::Symlink);
        assert_eq!(FileKind::from_mode(0), FileKind::Other);
    }

    #[test]
    fn blocks_of_direct_only() {
        let mut direct = [0u32; 15];
        for (i, slot) in direct.iter_mut().take(5).enumerate() {
            *slot = 100 + i as u32;
        }
        let roles: Vec<_> = BlocksOf::new(&direct, None, 5).collect();
        assert_eq!(roles.len(), 5);
        assert_eq!(roles[0], (100, BlockRole::Direct(0)));
        assert_eq!(roles[4], (104, BlockRole::Direct(4)));
    }

    #[test]
    fn blocks_of_spills_into_indirect() {
        let mut direct = [0u32; 15];
        for (i, slot) in direct.iter_mut().take(DIRECT_BLOCKS).enumerate() {
            *slot = 1 + i as u32;
        }
        direct[INDIRECT_BLOCK_IDX] = 200;
        let mut indirect = [0u32; INDIRECT_ENTRIES];
        indirect[0] = 300;
        indirect[1] = 301;

        let total = DIRECT_BLOCKS as u32 + 1 + 2;
        let roles: Vec<_> = BlocksOf::new(&direct, Some(&indirect), total).collect();

        assert_eq!(roles.len(), DIRECT_BLOCKS + 3);
        assert_eq!(roles[DIRECT_BLOCKS], (200, BlockRole::IndirectIndex));
        assert_eq!(roles[DIRECT_BLOCKS + 1], (300, BlockRole::IndirectPayload(0)));
        assert_eq!(roles[DIRECT_BLOCKS + 2], (301, BlockRole::IndirectPayload(1)));
    }
}
