//! The byte-buffer view: typed accessors over the mapped 128 KiB image.
//!
//! `Image` owns no bytes itself — it borrows the mapped region for as long
//! as the caller needs it, and every other component takes an `&Image` or
//! `&mut Image` as its first argument instead of reaching for global state.

use crate::group_desc::GroupDescriptor;
use crate::inode::{BlocksOf, Inode};
use crate::layout::{BLOCK_SIZE, INDIRECT_ENTRIES, INODE_SIZE, INODE_TABLE_START_BLOCK};
use crate::superblock::Superblock;
use std::mem::size_of;

/// Reinterprets a byte slice as a `&T`. Sound because every on-disk struct
/// here is `#[repr(C, packed)]` (alignment 1) and the slice is guaranteed
/// large enough by the caller.
unsafe fn cast<T>(bytes: &[u8]) -> &T {
    debug_assert!(bytes.len() >= size_of::<T>());
    unsafe { &*(bytes.as_ptr() as *const T) }
}

unsafe fn cast_mut<T>(bytes: &mut [u8]) -> &mut T {
    debug_assert!(bytes.len() >= size_of::<T>());
    unsafe { &mut *(bytes.as_mut_ptr() as *mut T) }
}

/// A typed view over a mapped ext2 image.
pub struct Image<'a> {
    buf: &'a mut [u8],
}

impl<'a> Image<'a> {
    /// Wraps a mutable byte buffer. The buffer must be exactly
    /// [`crate::layout::IMAGE_SIZE`] bytes; this is checked by every caller
    /// that owns the mapping, not here, so that tests can exercise smaller
    /// fixtures where convenient.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf }
    }

    pub fn super_block(&self) -> &Superblock {
        unsafe { cast(&self.buf[crate::layout::SUPERBLOCK_OFFSET..]) }
    }

    pub fn super_block_mut(&mut self) -> &mut Superblock {
        unsafe { cast_mut(&mut self.buf[crate::layout::SUPERBLOCK_OFFSET..]) }
    }

    pub fn group_desc(&self) -> &GroupDescriptor {
        unsafe { cast(&self.buf[crate::layout::GROUP_DESC_OFFSET..]) }
    }

    pub fn group_desc_mut(&mut self) -> &mut GroupDescriptor {
        unsafe { cast_mut(&mut self.buf[crate::layout::GROUP_DESC_OFFSET..]) }
    }

    /// Byte range of block `n` (1-indexed). Disallows block 0.
    fn block_range(n: u32) -> std::ops::Range<usize> {
        assert!(n != 0, "block 0 does not exist");
        let off = n as usize * BLOCK_SIZE;
        off..(off + BLOCK_SIZE)
    }

    pub fn block(&self, n: u32) -> &[u8] {
        &self.buf[Self::block_range(n)]
    }

    pub fn block_mut(&mut self, n: u32) -> &mut [u8] {
        let range = Self::block_range(n);
        &mut self.buf[range]
    }

    pub fn block_bitmap(&self) -> &[u8] {
        self.block(crate::layout::BLOCK_BITMAP_BLOCK)
    }

    pub fn block_bitmap_mut(&mut self) -> &mut [u8] {
        self.block_mut(crate::layout::BLOCK_BITMAP_BLOCK)
    }

    pub fn inode_bitmap(&self) -> &[u8] {
        self.block(crate::layout::INODE_BITMAP_BLOCK)
    }

    pub fn inode_bitmap_mut(&mut self) -> &mut [u8] {
        self.block_mut(crate::layout::INODE_BITMAP_BLOCK)
    }

    /// Byte offset of inode `i` (1-indexed) within the mapped image.
    fn inode_offset(i: u32) -> usize {
        assert!(i >= 1, "inode 0 does not exist");
        let table_off = INODE_TABLE_START_BLOCK as usize * BLOCK_SIZE;
        table_off + (i as usize - 1) * INODE_SIZE
    }

    pub fn inode(&self, i: u32) -> &Inode {
        unsafe { cast(&self.buf[Self::inode_offset(i)..]) }
    }

    pub fn inode_mut(&mut self, i: u32) -> &mut Inode {
        unsafe { cast_mut(&mut self.buf[Self::inode_offset(i)..]) }
    }

    /// A typed 256-entry view of block `n` as a single-indirect block.
    pub fn indirect(&self, n: u32) -> &[u32; INDIRECT_ENTRIES] {
        unsafe { cast(self.block(n)) }
    }

    pub fn indirect_mut(&mut self, n: u32) -> &mut [u32; INDIRECT_ENTRIES] {
        unsafe { cast_mut(self.block_mut(n)) }
    }

    /// Iterates over the data blocks referenced by inode `i`, in on-disk
    /// order (see [`BlocksOf`]).
    pub fn blocks_of(&self, i: u32) -> BlocksOf<'_> {
        let inode = self.inode(i);
        let total = inode.data_block_count();
        let indirect_num = inode.i_block[crate::layout::INDIRECT_BLOCK_IDX];
        let indirect = if total as usize > crate::layout::DIRECT_BLOCKS && indirect_num != 0 {
            Some(self.indirect(indirect_num))
        } else {
            None
        };
        BlocksOf::new(&inode.i_block, indirect, total)
    }

    /// Raw access to the whole mapped region, for the checker's full-bitmap
    /// sweep and for flushing the mapping back to disk.
    pub fn raw(&self) -> &[u8] {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Vec<u8> {
        vec![0u8; crate::layout::IMAGE_SIZE]
    }

    #[test]
    fn super_block_round_trip() {
        let mut buf = blank();
        let mut image = Image::new(&mut buf);
        image.super_block_mut().init(21, 120);
        let free_inodes = image.super_block().s_free_inodes_count;
        let free_blocks = image.super_block().s_free_blocks_count;
        assert_eq!(free_inodes, 21);
        assert_eq!(free_blocks, 120);
    }

    #[test]
    fn block_accessors_cover_the_right_bytes() {
        let mut buf = blank();
        let mut image = Image::new(&mut buf);
        image.block_mut(10).fill(0xaa);
        assert!(image.block(10).iter().all(|&b| b == 0xaa));
        assert!(image.block(9).iter().all(|&b| b == 0));
        assert!(image.block(11).iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic]
    fn block_zero_is_invalid() {
        let mut buf = blank();
        let image = Image::new(&mut buf);
        let _ = image.block(0);
    }

    #[test]
    fn inode_accessors_are_stable_across_slots() {
        let mut buf = blank();
        let mut image = Image::new(&mut buf);
        image.inode_mut(2).i_size = 1234;
        image.inode_mut(3).i_size = 5678;
        let size2 = image.inode(2).i_size;
        let size3 = image.inode(3).i_size;
        assert_eq!(size2, 1234);
        assert_eq!(size3, 5678);
    }

    #[test]
    fn blocks_of_combines_direct_and_indirect() {
        let mut buf = blank();
        let mut image = Image::new(&mut buf);
        {
            let inode = image.inode_mut(12);
            for i in 0..crate::layout::DIRECT_BLOCKS {
                inode.i_block[i] = 50 + i as u32;
            }
            inode.i_block[crate::layout::INDIRECT_BLOCK_IDX] = 70;
            inode.i_blocks = 2 * (crate::layout::DIRECT_BLOCKS as u32 + 1 + 2);
        }
        image.indirect_mut(70)[0] = 90;
        image.indirect_mut(70)[1] = 91;

        let blocks: Vec<u32> = image.blocks_of(12).map(|(b, _)| b).collect();
        assert_eq!(blocks.len(), crate::layout::DIRECT_BLOCKS + 3);
        assert_eq!(blocks[crate::layout::DIRECT_BLOCKS], 70);
        assert_eq!(blocks[crate::layout::DIRECT_BLOCKS + 1], 90);
        assert_eq!(blocks[crate::layout::DIRECT_BLOCKS + 2], 91);
    }
}
