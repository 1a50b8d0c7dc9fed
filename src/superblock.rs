//! The ext2 superblock: a single fixed-size record describing the layout and
//! occupancy of the whole filesystem.

use std::mem::size_of;

/// The ext2 filesystem signature, stored in `s_magic`.
pub const EXT2_MAGIC: u16 = 0xef53;

/// Filesystem state: no errors recorded.
pub const FS_STATE_CLEAN: u16 = 1;
/// Filesystem state: errors recorded.
pub const FS_STATE_ERROR: u16 = 2;

/// On-error behavior: continue.
pub const ERR_ACTION_IGNORE: u16 = 1;
/// On-error behavior: remount read-only.
pub const ERR_ACTION_READ_ONLY: u16 = 2;
/// On-error behavior: panic.
pub const ERR_ACTION_PANIC: u16 = 3;

/// Creator OS: Linux.
pub const OS_LINUX: u32 = 0;

/// The ext2 superblock, at byte offset 1024 of the image.
///
/// This mirrors the standard on-disk layout (base fields plus the rev-1
/// extended fields) padded out to the full 1024 bytes it occupies on disk.
/// The core only ever reads or writes `s_inodes_count`, `s_blocks_count`,
/// `s_free_inodes_count`, and `s_free_blocks_count`; the rest is carried for
/// shape-completeness and is never interpreted.
#[repr(C, packed)]
pub struct Superblock {
    pub s_inodes_count: u32,
    pub s_blocks_count: u32,
    pub s_r_blocks_count: u32,
    pub s_free_blocks_count: u32,
    pub s_free_inodes_count: u32,
    pub s_first_data_block: u32,
    pub s_log_block_size: u32,
    pub s_log_frag_size: i32,
    pub s_blocks_per_group: u32,
    pub s_frags_per_group: u32,
    pub s_inodes_per_group: u32,
    pub s_mtime: u32,
    pub s_wtime: u32,
    pub s_mnt_count: u16,
    pub s_max_mnt_count: i16,
    pub s_magic: u16,
    pub s_state: u16,
    pub s_errors: u16,
    pub s_minor_rev_level: u16,
    pub s_lastcheck: u32,
    pub s_checkinterval: u32,
    pub s_creator_os: u32,
    pub s_rev_level: u32,
    pub s_def_resuid: u16,
    pub s_def_resgid: u16,

    // -- rev-1 extended fields --
    pub s_first_ino: u32,
    pub s_inode_size: u16,
    pub s_block_group_nr: u16,
    pub s_feature_compat: u32,
    pub s_feature_incompat: u32,
    pub s_feature_ro_compat: u32,
    pub s_uuid: [u8; 16],
    pub s_volume_name: [u8; 16],
    pub s_last_mounted: [u8; 64],
    pub s_algo_bitmap: u32,
    pub s_prealloc_blocks: u8,
    pub s_prealloc_dir_blocks: u8,
    _padding_0: u16,
    pub s_journal_uuid: [u8; 16],
    pub s_journal_inum: u32,
    pub s_journal_dev: u32,
    pub s_last_orphan: u32,
    pub s_hash_seed: [u32; 4],
    pub s_def_hash_version: u8,
    _reserved_0: [u8; 3],
    pub s_default_mount_opts: u32,
    pub s_first_meta_bg: u32,

    _reserved: [u8; 1024 - 264],
}

const _: () = assert!(size_of::<Superblock>() == 1024);

impl Superblock {
    /// Initializes a fresh, minimal superblock for this toolkit's fixed
    /// 128 KiB / 1 KiB-block layout.
    ///
    /// `free_inodes` and `free_blocks` are the counts matching a freshly
    /// formatted image's bitmaps (the caller is responsible for laying the
    /// bitmaps out consistently with these numbers).
    pub fn init(&mut self, free_inodes: u32, free_blocks: u32) {
        *self = unsafe { std::mem::zeroed() };
        self.s_inodes_count = crate::layout::INODES_COUNT;
        self.s_blocks_count = crate::layout::BLOCKS_COUNT;
        self.s_free_inodes_count = free_inodes;
        self.s_free_blocks_count = free_blocks;
        self.s_first_data_block = 1;
        self.s_log_block_size = 0;
        self.s_blocks_per_group = crate::layout::BLOCKS_COUNT;
        self.s_inodes_per_group = crate::layout::INODES_COUNT;
        self.s_magic = EXT2_MAGIC;
        self.s_state = FS_STATE_CLEAN;
        self.s_errors = ERR_ACTION_READ_ONLY;
        self.s_creator_os = OS_LINUX;
        self.s_rev_level = 1;
        self.s_first_ino = crate::layout::FIRST_USER_INODE;
        self.s_inode_size = crate::layout::INODE_SIZE as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_magic_and_counts() {
        let mut bytes = [0u8; 1024];
        let sb = unsafe { &mut *(bytes.as_mut_ptr() as *mut Superblock) };
        sb.init(21, 120);
        let magic = sb.s_magic;
        let state = sb.s_state;
        let free_inodes = sb.s_free_inodes_count;
        let free_blocks = sb.s_free_blocks_count;
        let inodes_count = sb.s_inodes_count;
        let blocks_count = sb.s_blocks_count;
        assert_eq!(magic, EXT2_MAGIC);
        assert_eq!(state, FS_STATE_CLEAN);
        assert_eq!(free_inodes, 21);
        assert_eq!(free_blocks, 120);
        assert_eq!(inodes_count, crate::layout::INODES_COUNT);
        assert_eq!(blocks_count, crate::layout::BLOCKS_COUNT);
    }
}
