//! `readimage`: a read-only diagnostic dump of an image's metadata, for
//! eyeballing state while developing or debugging the other verbs. Never
//! mutates the mapping.

use crate::bitmap;
use crate::image::Image;
use crate::layout::ROOT_INODE;
use std::fmt::Write as _;

/// Renders a human-readable summary of `image`: superblock and group
/// descriptor counters, then one line per in-use inode.
pub fn dump(image: &Image) -> String {
    let mut out = String::new();

    let sb = image.super_block();
    let inodes_count = sb.s_inodes_count;
    let blocks_count = sb.s_blocks_count;
    let free_inodes_count = sb.s_free_inodes_count;
    let free_blocks_count = sb.s_free_blocks_count;
    let magic = sb.s_magic;
    let state = sb.s_state;
    let _ = writeln!(out, "superblock:");
    let _ = writeln!(out, "  inodes_count       = {inodes_count}");
    let _ = writeln!(out, "  blocks_count        = {blocks_count}");
    let _ = writeln!(out, "  free_inodes_count   = {free_inodes_count}");
    let _ = writeln!(out, "  free_blocks_count   = {free_blocks_count}");
    let _ = writeln!(out, "  magic               = {magic:#06x}");
    let _ = writeln!(out, "  state               = {state}");

    let gd = image.group_desc();
    let block_bitmap = gd.bg_block_bitmap;
    let inode_bitmap = gd.bg_inode_bitmap;
    let inode_table = gd.bg_inode_table;
    let gd_free_blocks_count = gd.bg_free_blocks_count;
    let gd_free_inodes_count = gd.bg_free_inodes_count;
    let used_dirs_count = gd.bg_used_dirs_count;
    let _ = writeln!(out, "group descriptor:");
    let _ = writeln!(out, "  block_bitmap        = {block_bitmap}");
    let _ = writeln!(out, "  inode_bitmap        = {inode_bitmap}");
    let _ = writeln!(out, "  inode_table         = {inode_table}");
    let _ = writeln!(out, "  free_blocks_count   = {gd_free_blocks_count}");
    let _ = writeln!(out, "  free_inodes_count   = {gd_free_inodes_count}");
    let _ = writeln!(out, "  used_dirs_count     = {used_dirs_count}");

    let _ = writeln!(out, "inodes:");
    for i in ROOT_INODE..=inodes_count {
        if !bitmap::inode_in_use(image, i) {
            continue;
        }
        let inode = image.inode(i);
        let kind = format!("{:?}", inode.kind());
        let mode = inode.i_mode;
        let size = inode.i_size;
        let links = inode.i_links_count;
        let blocks = inode.data_block_count();
        let _ = writeln!(
            out,
            "  [{i:>3}] kind={kind:<9} mode={mode:#06x} size={size:<8} links={links:<3} blocks={blocks}",
        );
    }

    out
}
