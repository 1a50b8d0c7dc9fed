//! The directory engine: lookup, insertion, deletion and restoration of
//! variable-length entries within a directory's data blocks.
//!
//! Directories in this toolkit never grow an indirect block — see
//! [`insert`] — so every directory's data lives entirely in its 12 direct
//! slots, which [`direct_block_nums`] walks.

use crate::bitmap;
use crate::dirent::{packed_size, DirEntryHeader, FT_DIR, HEADER_LEN};
use crate::error::{Error, Result};
use crate::image::Image;
use crate::layout::{BLOCK_SIZE, DIRECT_BLOCKS};

/// The allocated direct blocks of a directory inode, in order, stopping at
/// the first zero slot.
pub(crate) fn direct_block_nums(image: &Image, dir_inum: u32) -> Vec<u32> {
    let blocks = image.inode(dir_inum).i_block;
    blocks[..DIRECT_BLOCKS]
        .iter()
        .copied()
        .take_while(|&b| b != 0)
        .collect()
}

fn require_dir(image: &Image, dir_inum: u32) -> Result<()> {
    if image.inode(dir_inum).is_dir() {
        Ok(())
    } else {
        Err(Error::NoEntry)
    }
}

/// Looks up `name` in `dir_inum`, returning its inode number if a live entry
/// matches.
pub fn lookup(image: &Image, dir_inum: u32, name: &[u8]) -> Result<Option<u32>> {
    require_dir(image, dir_inum)?;

    for block_num in direct_block_nums(image, dir_inum) {
        let block = image.block(block_num);
        let mut offset = 0usize;
        while offset < BLOCK_SIZE {
            let header = unsafe { DirEntryHeader::from_bytes(&block[offset..]) };
            let rec_len = header.rec_len as usize;
            if rec_len == 0 {
                break;
            }
            if header.is_live() && header.name_matches(block, offset, name) {
                return Ok(Some(header.inode));
            }
            offset += rec_len;
        }
    }
    Ok(None)
}

fn write_entry(
    block: &mut [u8],
    offset: usize,
    inode: u32,
    rec_len: u16,
    name_len: u8,
    file_type: u8,
    name: &[u8],
) {
    let header = unsafe { DirEntryHeader::from_bytes_mut(&mut block[offset..]) };
    header.inode = inode;
    header.rec_len = rec_len;
    header.name_len = name_len;
    header.file_type = file_type;
    block[offset + HEADER_LEN..offset + HEADER_LEN + name.len()].copy_from_slice(name);
}

/// Inserts a new directory entry for `inode` into `dir_inum`.
///
/// Walks each existing block's final entry (the one whose `rec_len` reaches
/// the block boundary) and checks whether its slack — after stepping past
/// any already-hidden entries stacked within it — can fit the new record. If
/// no block has room, allocates a new direct block. Directories never grow
/// an indirect block: if all 12 direct slots are already in use, this fails
/// with [`Error::OutOfSpace`].
pub fn insert(image: &mut Image, dir_inum: u32, inode: u32, name: &[u8], file_type: u8) -> Result<()> {
    require_dir(image, dir_inum)?;

    let name_len = name.len();
    let need = packed_size(name_len) as usize;
    let blocks = direct_block_nums(image, dir_inum);

    for &block_num in &blocks {
        let (anchor_offset, anchor_name_len, anchor_rec_len) = {
            let block = image.block(block_num);
            let mut offset = 0usize;
            loop {
                let header = unsafe { DirEntryHeader::from_bytes(&block[offset..]) };
                let rec_len = header.rec_len as usize;
                if offset + rec_len >= BLOCK_SIZE {
                    break (offset, header.name_len as usize, rec_len);
                }
                offset += rec_len;
            }
        };

        let mut probe_offset = anchor_offset + packed_size(anchor_name_len) as usize;
        let mut space_have = anchor_rec_len - packed_size(anchor_name_len) as usize;

        while space_have >= need {
            let (probe_inode, probe_name_len) = {
                let block = image.block(block_num);
                let header = unsafe { DirEntryHeader::from_bytes(&block[probe_offset..]) };
                (header.inode, header.name_len as usize)
            };

            if probe_inode == 0 {
                let block = image.block_mut(block_num);
                write_entry(
                    block,
                    probe_offset,
                    inode,
                    space_have as u16,
                    name_len as u8,
                    file_type,
                    name,
                );
                let block = image.block_mut(block_num);
                let anchor = unsafe { DirEntryHeader::from_bytes_mut(&mut block[anchor_offset..]) };
                anchor.rec_len -= space_have as u16;
                return Ok(());
            }

            let used = packed_size(probe_name_len) as usize;
            probe_offset += used;
            space_have -= used;
        }
    }

    if blocks.len() >= DIRECT_BLOCKS {
        return Err(Error::OutOfSpace);
    }
    let new_block_num = bitmap::alloc_block(image)?;
    write_entry(
        image.block_mut(new_block_num),
        0,
        inode,
        BLOCK_SIZE as u16,
        name_len as u8,
        file_type,
        name,
    );

    let dir_inode = image.inode_mut(dir_inum);
    dir_inode.i_block[blocks.len()] = new_block_num;
    dir_inode.i_size += BLOCK_SIZE as u32;
    dir_inode.i_blocks += 2;
    Ok(())
}

/// Removes the entry named `name` from `dir_inum`, returning the inode
/// number it pointed at. If the entry is the first in its block, its
/// `inode` field is zeroed in place. Otherwise the previous entry absorbs
/// its `rec_len` and the removed entry's bytes — including its `inode`
/// field — are left untouched, becoming the substrate [`restore`] scans for.
pub fn delete(image: &mut Image, dir_inum: u32, name: &[u8]) -> Result<u32> {
    require_dir(image, dir_inum)?;

    for block_num in direct_block_nums(image, dir_inum) {
        let mut offset = 0usize;
        let mut prev_offset: Option<usize> = None;

        while offset < BLOCK_SIZE {
            let (rec_len, matched, found_inode) = {
                let block = image.block(block_num);
                let header = unsafe { DirEntryHeader::from_bytes(&block[offset..]) };
                let rec_len = header.rec_len as usize;
                if rec_len == 0 {
                    break;
                }
                let matched = header.is_live() && header.name_matches(block, offset, name);
                (rec_len, matched, header.inode)
            };

            if matched {
                if let Some(prev) = prev_offset {
                    let block = image.block_mut(block_num);
                    let prev_header = unsafe { DirEntryHeader::from_bytes_mut(&mut block[prev..]) };
                    prev_header.rec_len += rec_len as u16;
                } else {
                    let block = image.block_mut(block_num);
                    let header = unsafe { DirEntryHeader::from_bytes_mut(&mut block[offset..]) };
                    header.inode = 0;
                }
                return Ok(found_inode);
            }

            prev_offset = Some(offset);
            offset += rec_len;
        }
    }
    Err(Error::NoEntry)
}

/// Searches `dir_inum` for a hidden entry named `name` in the slack of a
/// live entry, and if found and still recoverable, restores it.
///
/// A candidate is recoverable only if its inode and every data block it
/// references are currently marked free; any reuse fails with
/// [`Error::NotRecoverable`]. A candidate that is itself a directory fails
/// with [`Error::IsDirectory`] — directories are never restorable through
/// this path, matching `restore`'s scope over plain files and links.
pub fn restore(image: &mut Image, dir_inum: u32, name: &[u8]) -> Result<u32> {
    require_dir(image, dir_inum)?;

    for block_num in direct_block_nums(image, dir_inum) {
        let mut offset = 0usize;

        while offset < BLOCK_SIZE {
            let (rec_len, name_len, is_live) = {
                let block = image.block(block_num);
                let header = unsafe { DirEntryHeader::from_bytes(&block[offset..]) };
                (header.rec_len as usize, header.name_len as usize, header.is_live())
            };
            if rec_len == 0 {
                break;
            }

            if is_live {
                let packed = packed_size(name_len) as usize;
                let slack = rec_len.saturating_sub(packed);

                if slack >= 12 {
                    let mut probe_offset = offset + packed;
                    let mut remaining = slack;

                    while remaining > 0 {
                        let (probe_inode, probe_name_len, matches) = {
                            let block = image.block(block_num);
                            let header = unsafe { DirEntryHeader::from_bytes(&block[probe_offset..]) };
                            (
                                header.inode,
                                header.name_len as usize,
                                header.inode != 0 && header.name_matches(block, probe_offset, name),
                            )
                        };
                        if probe_inode == 0 {
                            break;
                        }
                        if matches {
                            let file_type = {
                                let block = image.block(block_num);
                                unsafe { DirEntryHeader::from_bytes(&block[probe_offset..]) }.file_type
                            };
                            if file_type == FT_DIR {
                                return Err(Error::IsDirectory);
                            }
                            return finalize_restore(image, block_num, offset, probe_offset, remaining);
                        }
                        let used = packed_size(probe_name_len) as usize;
                        probe_offset += used;
                        remaining = remaining.saturating_sub(used);
                    }
                }
            }

            offset += rec_len;
        }
    }
    Err(Error::NoEntry)
}

fn finalize_restore(
    image: &mut Image,
    block_num: u32,
    anchor_offset: usize,
    hidden_offset: usize,
    remaining: usize,
) -> Result<u32> {
    let found_inum = unsafe { DirEntryHeader::from_bytes(&image.block(block_num)[hidden_offset..]) }.inode;

    if bitmap::inode_in_use(image, found_inum) {
        return Err(Error::NotRecoverable);
    }
    let data_blocks: Vec<u32> = image.blocks_of(found_inum).map(|(b, _)| b).collect();
    if data_blocks.iter().any(|&b| bitmap::block_in_use(image, b)) {
        return Err(Error::NotRecoverable);
    }

    {
        let block = image.block_mut(block_num);
        let anchor = unsafe { DirEntryHeader::from_bytes_mut(&mut block[anchor_offset..]) };
        anchor.rec_len -= remaining as u16;
    }
    {
        let block = image.block_mut(block_num);
        let hidden = unsafe { DirEntryHeader::from_bytes_mut(&mut block[hidden_offset..]) };
        hidden.rec_len = remaining as u16;
    }

    bitmap::mark_inode_used(image, found_inum);
    for b in data_blocks {
        bitmap::mark_block_used(image, b);
    }

    let inode = image.inode_mut(found_inum);
    inode.i_dtime = 0;
    inode.i_links_count = 1;

    Ok(found_inum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::mkfs_image;
    use crate::layout::ROOT_INODE;

    #[test]
    fn lookup_finds_dot_and_dotdot() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);
        assert_eq!(lookup(&image, ROOT_INODE, b".").unwrap(), Some(ROOT_INODE));
        assert_eq!(lookup(&image, ROOT_INODE, b"..").unwrap(), Some(ROOT_INODE));
        assert_eq!(lookup(&image, ROOT_INODE, b"missing").unwrap(), None);
    }

    #[test]
    fn insert_then_lookup_then_delete() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);

        insert(&mut image, ROOT_INODE, 12, b"a", crate::dirent::FT_REG_FILE).unwrap();
        assert_eq!(lookup(&image, ROOT_INODE, b"a").unwrap(), Some(12));

        let removed = delete(&mut image, ROOT_INODE, b"a").unwrap();
        assert_eq!(removed, 12);
        assert_eq!(lookup(&image, ROOT_INODE, b"a").unwrap(), None);
    }

    #[test]
    fn delete_then_restore_round_trip() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);

        insert(&mut image, ROOT_INODE, 12, b"gone", crate::dirent::FT_REG_FILE).unwrap();
        delete(&mut image, ROOT_INODE, b"gone").unwrap();
        assert_eq!(lookup(&image, ROOT_INODE, b"gone").unwrap(), None);

        let restored = restore(&mut image, ROOT_INODE, b"gone").unwrap();
        assert_eq!(restored, 12);
        assert_eq!(lookup(&image, ROOT_INODE, b"gone").unwrap(), Some(12));
    }

    #[test]
    fn restore_fails_once_inode_is_reused() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);

        insert(&mut image, ROOT_INODE, 12, b"gone", crate::dirent::FT_REG_FILE).unwrap();
        delete(&mut image, ROOT_INODE, b"gone").unwrap();

        bitmap::mark_inode_used(&mut image, 12);
        let err = restore(&mut image, ROOT_INODE, b"gone").unwrap_err();
        assert!(matches!(err, Error::NotRecoverable));
    }

    #[test]
    fn restore_refuses_hidden_directories() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);

        insert(&mut image, ROOT_INODE, 12, b"sub", FT_DIR).unwrap();
        delete(&mut image, ROOT_INODE, b"sub").unwrap();

        let err = restore(&mut image, ROOT_INODE, b"sub").unwrap_err();
        assert!(matches!(err, Error::IsDirectory));
    }

    /// Writes a block with two entries leaving zero slack in the terminal
    /// one, so `insert` sees it as having no room.
    fn fill_block(image: &mut Image, block_num: u32) {
        let block = image.block_mut(block_num);
        write_entry(block, 0, 900, (BLOCK_SIZE - 12) as u16, 1, crate::dirent::FT_REG_FILE, b"a");
        write_entry(block, BLOCK_SIZE - 12, 901, 12, 1, crate::dirent::FT_REG_FILE, b"b");
    }

    #[test]
    fn insert_fails_once_all_direct_blocks_are_full() {
        let mut buf = mkfs_image();
        let mut image = Image::new(&mut buf);

        fill_block(&mut image, image.inode(ROOT_INODE).i_block[0]);
        for i in 1..DIRECT_BLOCKS {
            let bnum = bitmap::alloc_block(&mut image).unwrap();
            fill_block(&mut image, bnum);
            image.inode_mut(ROOT_INODE).i_block[i] = bnum;
        }

        let err = insert(&mut image, ROOT_INODE, 999, b"overflow", crate::dirent::FT_REG_FILE);
        assert!(matches!(err, Err(Error::OutOfSpace)));
    }
}
