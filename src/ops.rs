//! The six verbs: copy-in, link (hard and symbolic), mkdir, rm and restore.
//!
//! Each operation resolves paths through [`crate::path`], reads or writes
//! entries through [`crate::dir`], and drives allocation through
//! [`crate::bitmap`] — this module only sequences those primitives and owns
//! no on-disk layout knowledge of its own.

use crate::bitmap;
use crate::dir;
use crate::dirent::{self, FT_DIR, FT_REG_FILE, FT_SYMLINK};
use crate::error::{Error, Result};
use crate::image::Image;
use crate::inode::{FileKind, MODE_DIRECTORY, MODE_REGULAR, MODE_SYMLINK};
use crate::layout::{BLOCK_SIZE, DIRECT_BLOCKS, INDIRECT_BLOCK_IDX};
use crate::path;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

fn now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Resolves a creation target the way `cp`/`ln`/`restore` all do: if `dst`
/// already names a directory, the new entry is placed there under
/// `name_if_dir`; otherwise `dst`'s parent must be a directory and the new
/// entry takes `dst`'s own basename.
fn resolve_target(image: &Image, dst: &str, name_if_dir: &str) -> Result<(u32, String)> {
    match path::resolve(image, dst) {
        Ok(inum) if image.inode(inum).is_dir() => Ok((inum, name_if_dir.to_string())),
        Ok(_) => Err(Error::Exists),
        Err(Error::NoEntry) => {
            if dst.ends_with('/') {
                return Err(Error::NoEntry);
            }
            let parent_inum = path::resolve(image, &path::parent_path(dst))?;
            Ok((parent_inum, path::basename(dst).to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Copies a host file into the image at `dst_image_path`.
pub fn copy_in(image: &mut Image, src_host_path: &Path, dst_image_path: &str) -> Result<()> {
    let file_name = src_host_path
        .file_name()
        .ok_or(Error::NoEntry)?
        .to_string_lossy()
        .into_owned();
    let (target_dir, target_name) = resolve_target(image, dst_image_path, &file_name)?;
    if dir::lookup(image, target_dir, target_name.as_bytes())?.is_some() {
        return Err(Error::Exists);
    }

    let data = std::fs::read(src_host_path)?;
    let size = data.len() as u32;
    let data_block_count = (data.len()).div_ceil(BLOCK_SIZE);
    let needs_indirect = data_block_count > DIRECT_BLOCKS;
    let i_blocks = 2 * (data_block_count + usize::from(needs_indirect)) as u32;

    let inum = bitmap::alloc_inode(image)?;
    {
        let inode = image.inode_mut(inum);
        inode.i_mode = MODE_REGULAR;
        inode.i_size = size;
        inode.i_links_count = 1;
        inode.i_blocks = i_blocks;
        inode.i_dtime = 0;
    }

    let mut written = 0usize;
    let direct_count = data_block_count.min(DIRECT_BLOCKS);
    for i in 0..direct_count {
        let bnum = bitmap::alloc_block(image)?;
        let end = (written + BLOCK_SIZE).min(data.len());
        image.block_mut(bnum)[..end - written].copy_from_slice(&data[written..end]);
        image.inode_mut(inum).i_block[i] = bnum;
        written = end;
    }
    if needs_indirect {
        let indirect_num = bitmap::alloc_block(image)?;
        image.inode_mut(inum).i_block[INDIRECT_BLOCK_IDX] = indirect_num;
        for i in 0..(data_block_count - DIRECT_BLOCKS) {
            let bnum = bitmap::alloc_block(image)?;
            let end = (written + BLOCK_SIZE).min(data.len());
            image.block_mut(bnum)[..end - written].copy_from_slice(&data[written..end]);
            written = end;
            image.indirect_mut(indirect_num)[i] = bnum;
        }
    }

    dir::insert(image, target_dir, inum, target_name.as_bytes(), FT_REG_FILE)
}

/// Creates a hard or symbolic link at `dst_path` pointing at `src_path`.
pub fn link(image: &mut Image, src_path: &str, dst_path: &str, symbolic: bool) -> Result<()> {
    let src_inum = path::resolve(image, src_path)?;
    let src_kind = image.inode(src_inum).kind();
    if !symbolic && src_kind == FileKind::Directory {
        return Err(Error::IsDirectory);
    }

    let src_name = path::basename(src_path).to_string();
    let (target_dir, target_name) = resolve_target(image, dst_path, &src_name)?;
    if dir::lookup(image, target_dir, target_name.as_bytes())?.is_some() {
        return Err(Error::Exists);
    }

    if symbolic {
        let inum = bitmap::alloc_inode(image)?;
        let bnum = bitmap::alloc_block(image)?;

        let target_bytes = src_path.as_bytes();
        let block = image.block_mut(bnum);
        block[..target_bytes.len()].copy_from_slice(target_bytes);
        block[target_bytes.len()] = 0;

        let inode = image.inode_mut(inum);
        inode.i_mode = MODE_SYMLINK;
        inode.i_size = BLOCK_SIZE as u32;
        inode.i_links_count = 1;
        inode.i_blocks = 2;
        inode.i_dtime = 0;
        inode.i_block[0] = bnum;

        dir::insert(image, target_dir, inum, target_name.as_bytes(), FT_SYMLINK)
    } else {
        let file_type = dirent::file_type_of(src_kind);
        dir::insert(image, target_dir, src_inum, target_name.as_bytes(), file_type)?;
        image.inode_mut(src_inum).i_links_count += 1;
        Ok(())
    }
}

/// Creates a directory at `path`, wiring up `.` and `..` and bumping the
/// parent's link count and the group descriptor's used-directory count.
pub fn mkdir(image: &mut Image, path: &str) -> Result<()> {
    let parent_inum = path::resolve(image, &path::parent_path(path))?;
    let name = path::basename(path);
    if dir::lookup(image, parent_inum, name.as_bytes())?.is_some() {
        return Err(Error::Exists);
    }

    let inum = bitmap::alloc_inode(image)?;
    {
        let inode = image.inode_mut(inum);
        inode.i_mode = MODE_DIRECTORY;
        inode.i_size = 0;
        inode.i_links_count = 2;
        inode.i_blocks = 0;
        inode.i_dtime = 0;
    }
    dir::insert(image, parent_inum, inum, name.as_bytes(), FT_DIR)?;

    // `insert` allocates the new directory's own first block itself (as the
    // "no existing block has room" case): a freshly zeroed block has no
    // entry whose rec_len reaches the boundary, so it must never be handed
    // one it didn't just allocate.
    dir::insert(image, inum, inum, b".", FT_DIR)?;
    dir::insert(image, inum, parent_inum, b"..", FT_DIR)?;

    image.group_desc_mut().bg_used_dirs_count += 1;
    image.inode_mut(parent_inum).i_links_count += 1;
    Ok(())
}

/// Removes the non-directory entry at `path`. Deallocates its inode and
/// data blocks once its link count reaches zero.
pub fn remove(image: &mut Image, path: &str) -> Result<()> {
    if path == "/" {
        return Err(Error::IsDirectory);
    }
    let parent_inum = path::resolve(image, &path::parent_path(path))?;
    let name = path::basename(path);
    let target_inum = dir::lookup(image, parent_inum, name.as_bytes())?.ok_or(Error::NoEntry)?;
    if image.inode(target_inum).is_dir() {
        return Err(Error::IsDirectory);
    }

    dir::delete(image, parent_inum, name.as_bytes())?;

    let links = {
        let inode = image.inode_mut(target_inum);
        inode.i_links_count -= 1;
        inode.i_links_count
    };
    if links == 0 {
        image.inode_mut(target_inum).i_dtime = now();
        let data_blocks: Vec<u32> = image.blocks_of(target_inum).map(|(b, _)| b).collect();
        bitmap::free_inode(image, target_inum);
        for b in data_blocks {
            bitmap::free_block(image, b);
        }
    }
    Ok(())
}

/// Restores a previously removed entry at `path`, failing with
/// [`Error::Exists`] if something already occupies that name.
pub fn restore(image: &mut Image, path: &str) -> Result<()> {
    let parent_inum = path::resolve(image, &path::parent_path(path))?;
    let name = path::basename(path);
    if dir::lookup(image, parent_inum, name.as_bytes())?.is_some() {
        return Err(Error::Exists);
    }
    dir::restore(image, parent_inum, name.as_bytes())?;
    Ok(())
}
