//! The (sole) block group descriptor, at byte offset 2048 of the image.

use std::mem::size_of;

/// A block group descriptor.
#[repr(C, packed)]
pub struct GroupDescriptor {
    /// Block number of the block usage bitmap.
    pub bg_block_bitmap: u32,
    /// Block number of the inode usage bitmap.
    pub bg_inode_bitmap: u32,
    /// Starting block number of the inode table.
    pub bg_inode_table: u32,
    /// Number of unallocated blocks in the group.
    pub bg_free_blocks_count: u16,
    /// Number of unallocated inodes in the group.
    pub bg_free_inodes_count: u16,
    /// Number of directories in the group.
    pub bg_used_dirs_count: u16,
    _padding: u16,
    _reserved: [u32; 3],
}

const _: () = assert!(size_of::<GroupDescriptor>() == 32);

impl GroupDescriptor {
    /// Initializes the group descriptor for this toolkit's fixed layout.
    pub fn init(&mut self, free_inodes: u32, free_blocks: u32) {
        *self = unsafe { std::mem::zeroed() };
        self.bg_block_bitmap = crate::layout::BLOCK_BITMAP_BLOCK;
        self.bg_inode_bitmap = crate::layout::INODE_BITMAP_BLOCK;
        self.bg_inode_table = crate::layout::INODE_TABLE_START_BLOCK;
        self.bg_free_blocks_count = free_blocks as u16;
        self.bg_free_inodes_count = free_inodes as u16;
        self.bg_used_dirs_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_points_at_fixed_layout() {
        let mut bytes = [0u8; 32];
        let gd = unsafe { &mut *(bytes.as_mut_ptr() as *mut GroupDescriptor) };
        gd.init(21, 120);
        let block_bitmap = gd.bg_block_bitmap;
        let inode_bitmap = gd.bg_inode_bitmap;
        let inode_table = gd.bg_inode_table;
        let free_blocks_count = gd.bg_free_blocks_count;
        let free_inodes_count = gd.bg_free_inodes_count;
        let used_dirs_count = gd.bg_used_dirs_count;
        assert_eq!(block_bitmap, crate::layout::BLOCK_BITMAP_BLOCK);
        assert_eq!(inode_bitmap, crate::layout::INODE_BITMAP_BLOCK);
        assert_eq!(inode_table, crate::layout::INODE_TABLE_START_BLOCK);
        assert_eq!(free_blocks_count, 120);
        assert_eq!(free_inodes_count, 21);
        assert_eq!(used_dirs_count, 0);
    }
}
