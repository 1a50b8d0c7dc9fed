//! On-disk layout constants for the fixed 128 KiB / 1 KiB-block image this
//! toolkit operates on.
//!
//! Everything here describes the bootstrap layout baked into the images this
//! toolkit targets: one block group, a single indirect level, a 32-entry
//! inode table. None of it is negotiable at runtime.

/// Size of a block in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Total size of an image in bytes.
pub const IMAGE_SIZE: usize = 128 * BLOCK_SIZE;

/// Total number of blocks in an image.
pub const BLOCKS_COUNT: u32 = (IMAGE_SIZE / BLOCK_SIZE) as u32;

/// Byte offset of the superblock.
pub const SUPERBLOCK_OFFSET: usize = 1024;

/// Byte offset of the (sole) group descriptor.
pub const GROUP_DESC_OFFSET: usize = 2048;

/// Block number holding the block usage bitmap.
pub const BLOCK_BITMAP_BLOCK: u32 = 3;
/// Block number holding the inode usage bitmap.
pub const INODE_BITMAP_BLOCK: u32 = 4;
/// First block number of the inode table.
pub const INODE_TABLE_START_BLOCK: u32 = 5;

/// Size of one on-disk inode record, in bytes.
pub const INODE_SIZE: usize = 128;
/// Number of inodes in the (fixed-size) inode table.
pub const INODES_COUNT: u32 = 32;
/// Number of blocks occupied by the inode table (32 * 128 / 1024).
pub const INODE_TABLE_BLOCKS: u32 = (INODES_COUNT as usize * INODE_SIZE / BLOCK_SIZE) as u32;

/// The inode number of the root directory.
pub const ROOT_INODE: u32 = 2;
/// The first inode number available for allocation; 1..11 are reserved.
pub const FIRST_USER_INODE: u32 = 12;

/// Number of direct block pointers in an inode.
pub const DIRECT_BLOCKS: usize = 12;
/// Index of the single-indirect block pointer within `i_block`.
pub const INDIRECT_BLOCK_IDX: usize = 12;
/// Number of 32-bit block numbers held by one indirect block.
pub const INDIRECT_ENTRIES: usize = BLOCK_SIZE / 4;

/// Maximum length of a directory entry's name.
pub const NAME_MAX: usize = 255;

/// Rounds `n` up to the next multiple of 4.
pub const fn round4(n: usize) -> usize {
    (n + 3) & !3
}
