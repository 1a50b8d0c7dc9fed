//! Consistency checker: reconciles the bitmap-derived free counts against
//! the superblock and group descriptor, then sweeps the directory tree
//! reconciling each live entry's type/in-use/dtime/block-allocation
//! properties.
//!
//! The sweep is iterative — an explicit work stack of directory inode
//! numbers rather than recursive descent — so depth is bounded only by
//! available memory, not call-stack frames.

use crate::bitmap;
use crate::dir;
use crate::dirent::{self, DirEntryHeader, FT_DIR};
use crate::image::Image;
use crate::layout::{BLOCK_SIZE, ROOT_INODE};

/// The outcome of a consistency check: every fix applied, in order, plus
/// the total count.
pub struct Report {
    pub messages: Vec<String>,
    pub total: u32,
}

/// Runs a full consistency check and repair pass over `image`.
pub fn check(image: &mut Image) -> Report {
    let mut messages = Vec::new();
    let mut total = 0u32;

    let inodes_count = image.super_block().s_inodes_count;
    let blocks_count = image.super_block().s_blocks_count;

    let bitmap_free_inodes = (1..=inodes_count)
        .filter(|&i| !bitmap::inode_in_use(image, i))
        .count() as u32;
    let bitmap_free_blocks = (1..=blocks_count)
        .filter(|&b| !bitmap::block_in_use(image, b))
        .count() as u32;

    reconcile_count(
        "superblock's free inodes",
        image.super_block().s_free_inodes_count,
        bitmap_free_inodes,
        |image, v| image.super_block_mut().s_free_inodes_count = v,
        image,
        &mut messages,
        &mut total,
    );
    reconcile_count(
        "superblock's free blocks",
        image.super_block().s_free_blocks_count,
        bitmap_free_blocks,
        |image, v| image.super_block_mut().s_free_blocks_count = v,
        image,
        &mut messages,
        &mut total,
    );
    reconcile_count(
        "block group's free inodes",
        image.group_desc().bg_free_inodes_count as u32,
        bitmap_free_inodes,
        |image, v| image.group_desc_mut().bg_free_inodes_count = v as u16,
        image,
        &mut messages,
        &mut total,
    );
    reconcile_count(
        "block group's free blocks",
        image.group_desc().bg_free_blocks_count as u32,
        bitmap_free_blocks,
        |image, v| image.group_desc_mut().bg_free_blocks_count = v as u16,
        image,
        &mut messages,
        &mut total,
    );

    total += check_directory_tree(image, &mut messages);

    Report { messages, total }
}

fn reconcile_count(
    label: &str,
    recorded: u32,
    actual: u32,
    set: impl FnOnce(&mut Image, u32),
    image: &mut Image,
    messages: &mut Vec<String>,
    total: &mut u32,
) {
    if recorded != actual {
        let diff = recorded.abs_diff(actual);
        messages.push(format!("Fixed: {label} was off by {diff} compared to the bitmap"));
        set(image, actual);
        *total += diff;
    }
}

fn check_directory_tree(image: &mut Image, messages: &mut Vec<String>) -> u32 {
    let mut total = 0u32;
    let mut stack = vec![ROOT_INODE];

    while let Some(dir_inum) = stack.pop() {
        for block_num in dir::direct_block_nums(image, dir_inum) {
            let mut offset = 0usize;

            while offset < BLOCK_SIZE {
                let (rec_len, inode_num, file_type, name) = {
                    let block = image.block(block_num);
                    let header = unsafe { DirEntryHeader::from_bytes(&block[offset..]) };
                    let rec_len = header.rec_len as usize;
                    if rec_len == 0 {
                        (0, 0, 0, Vec::new())
                    } else {
                        (rec_len, header.inode, header.file_type, header.name(block, offset).to_vec())
                    }
                };
                if rec_len == 0 {
                    break;
                }

                if inode_num != 0 && name.as_slice() != b".." {
                    if name.as_slice() == b"." || file_type != FT_DIR {
                        total += check_entry(image, block_num, offset, inode_num, messages);
                    } else {
                        stack.push(inode_num);
                    }
                }
                offset += rec_len;
            }
        }
    }

    total
}

fn check_entry(image: &mut Image, block_num: u32, offset: usize, inode_num: u32, messages: &mut Vec<String>) -> u32 {
    let mut total = 0u32;

    let expected_type = dirent::file_type_of(image.inode(inode_num).kind());
    let stored_type = unsafe { DirEntryHeader::from_bytes(&image.block(block_num)[offset..]) }.file_type;
    if stored_type != expected_type {
        let header = unsafe { DirEntryHeader::from_bytes_mut(&mut image.block_mut(block_num)[offset..]) };
        header.file_type = expected_type;
        messages.push(format!("Fixed: entry type vs inode mismatch: inode[{inode_num}]"));
        total += 1;
    }

    if !bitmap::inode_in_use(image, inode_num) {
        bitmap::mark_inode_used(image, inode_num);
        messages.push(format!("Fixed: inode[{inode_num}] not marked as in-use"));
        total += 1;
    }

    if image.inode(inode_num).i_dtime != 0 {
        image.inode_mut(inode_num).i_dtime = 0;
        messages.push(format!("Fixed: valid inode marked for deletion: [{inode_num}]"));
        total += 1;
    }

    let data_blocks: Vec<u32> = image.blocks_of(inode_num).map(|(b, _)| b).collect();
    let mut block_errors = 0u32;
    for b in data_blocks {
        if !bitmap::block_in_use(image, b) {
            bitmap::mark_block_used(image, b);
            block_errors += 1;
        }
    }
    if block_errors > 0 {
        messages.push(format!(
            "Fixed: {block_errors} in-use data blocks not marked in data bitmap for inode: [{inode_num}]"
        ));
        total += block_errors;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::mkfs_image;
    use crate::ops;

    #[test]
    fn clean_image_reports_nothing() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);
        let report = check(&mut image);
        assert_eq!(report.total, 0);
        assert!(report.messages.is_empty());
    }

    #[test]
    fn reconciles_stale_free_counters() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);
        image.super_block_mut().s_free_blocks_count -= 5;

        let report = check(&mut image);
        assert_eq!(report.total, 5);
        assert!(report.messages.iter().any(|m| m.contains("superblock's free blocks")));

        let actual_free = (1..=image.super_block().s_blocks_count)
            .filter(|&b| !bitmap::block_in_use(&image, b))
            .count() as u32;
        let free_blocks = image.super_block().s_free_blocks_count;
        assert_eq!(free_blocks, actual_free);
    }

    #[test]
    fn repairs_inode_marked_free_but_referenced() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);
        let host_path = std::env::temp_dir().join("ext2tool-test-checker.txt");
        std::fs::write(&host_path, b"data").unwrap();
        ops::copy_in(&mut image, &host_path, "/f.txt").unwrap();
        let inum = crate::path::resolve(&image, "/f.txt").unwrap();

        // Corrupt: clear the inode's in-use bit and dtime while the entry
        // still points at it, and clear one of its data blocks' bits too.
        bitmap::free_inode(&mut image, inum);
        image.inode_mut(inum).i_dtime = 42;
        let bnum = image.inode(inum).i_block[0];
        bitmap::free_block(&mut image, bnum);

        let report = check(&mut image);
        assert!(report.total >= 3);
        assert!(bitmap::inode_in_use(&image, inum));
        let dtime = image.inode(inum).i_dtime;
        assert_eq!(dtime, 0);
        assert!(bitmap::block_in_use(&image, bnum));
    }

    #[test]
    fn fixes_entry_type_mismatch() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);
        ops::mkdir(&mut image, "/sub").unwrap();

        let root_block = image.inode(ROOT_INODE).i_block[0];
        let mut offset = 0usize;
        loop {
            let header = unsafe { DirEntryHeader::from_bytes(&image.block(root_block)[offset..]) };
            let rec_len = header.rec_len as usize;
            let is_sub = header.inode != 0 && header.name(image.block(root_block), offset) == b"sub".as_slice();
            if is_sub {
                break;
            }
            offset += rec_len;
        }
        unsafe { DirEntryHeader::from_bytes_mut(&mut image.block_mut(root_block)[offset..]) }.file_type =
            crate::dirent::FT_REG_FILE;

        let report = check(&mut image);
        assert!(report.messages.iter().any(|m| m.contains("entry type vs inode mismatch")));
        let fixed = unsafe { DirEntryHeader::from_bytes(&image.block(root_block)[offset..]) }.file_type;
        assert_eq!(fixed, FT_DIR);
    }
}
