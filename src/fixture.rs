//! Test-only in-memory image fixtures: a freshly "formatted" 128 KiB image
//! with just a root directory, built the same way [`crate::ops::mkdir`]
//! would build any other directory's `.`/`..` pair.

use crate::dir;
use crate::dirent::FT_DIR;
use crate::image::Image;
use crate::inode::MODE_DIRECTORY;
use crate::layout::{self, ROOT_INODE};

/// Builds a minimal valid image: metadata blocks and reserved inodes marked
/// used, root directory inode present with its own `.`/`..` entries, and
/// nothing else.
pub(crate) fn mkfs_image() -> Vec<u8> {
    let mut buf = vec![0u8; layout::IMAGE_SIZE];
    {
        let mut image = Image::new(&mut buf);

        let metadata_blocks = layout::INODE_TABLE_START_BLOCK + layout::INODE_TABLE_BLOCKS - 1;
        for b in 1..=metadata_blocks {
            crate::bitmap::mark_block_used(&mut image, b);
        }
        for i in 1..layout::FIRST_USER_INODE {
            crate::bitmap::mark_inode_used(&mut image, i);
        }

        let free_blocks = layout::BLOCKS_COUNT - metadata_blocks;
        let free_inodes = layout::INODES_COUNT - (layout::FIRST_USER_INODE - 1);
        image.super_block_mut().init(free_inodes, free_blocks);
        image.group_desc_mut().init(free_inodes, free_blocks);

        {
            let root = image.inode_mut(ROOT_INODE);
            root.i_mode = MODE_DIRECTORY;
            root.i_size = 0;
            root.i_links_count = 2;
            root.i_blocks = 0;
            root.i_dtime = 0;
        }
        dir::insert(&mut image, ROOT_INODE, ROOT_INODE, b".", FT_DIR).unwrap();
        dir::insert(&mut image, ROOT_INODE, ROOT_INODE, b"..", FT_DIR).unwrap();
        image.group_desc_mut().bg_used_dirs_count = 1;
    }
    buf
}
