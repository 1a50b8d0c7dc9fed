//! Shared command-line scaffolding: argument/binary-name extraction, image
//! mapping, and translation of [`crate::error::Error`] into POSIX exit
//! codes. This is the only place that error variant gets interpreted —
//! every other module just propagates it with `?`.

use crate::error::Error;
use crate::image::Image;
use memmap2::MmapMut;
use std::env::ArgsOs;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::exit;
use std::{env, process};

/// Returns the command's name (the basename this binary was invoked as)
/// along with an iterator over the remaining arguments.
pub fn args() -> (String, ArgsOs) {
    let mut args = env::args_os();
    let bin = args
        .next()
        .map(std::path::PathBuf::from)
        .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_owned))
        .unwrap_or_else(|| error("ext2tool", "missing binary name"));
    (bin, args)
}

/// Writes an error to stderr, then exits with status 1. For usage errors
/// that have no meaningful errno.
pub fn error<M: fmt::Display>(bin: &str, msg: M) -> ! {
    eprintln!("{bin}: error: {msg}");
    exit(1);
}

/// Memory-maps `image_path` read-write for the duration of a command.
pub fn open_image(bin: &str, image_path: &std::ffi::OsStr) -> MmapMut {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(Path::new(image_path))
        .unwrap_or_else(|e| error(bin, format_args!("{}: {e}", Path::new(image_path).display())));
    unsafe { MmapMut::map_mut(&file) }.unwrap_or_else(|e| error(bin, e))
}

/// Maps a core [`Error`] to the POSIX exit status a shell script driving
/// this toolkit expects, and exits the process with it.
pub fn exit_for(bin: &str, err: Error) -> ! {
    let code = match &err {
        Error::NoEntry => libc::ENOENT,
        Error::Exists => libc::EEXIST,
        Error::IsDirectory => libc::EISDIR,
        Error::OutOfSpace => libc::ENOMEM,
        Error::NotRecoverable => libc::ENOENT,
        Error::Io(_) => 255,
    };
    eprintln!("{bin}: {err}");
    process::exit(code);
}

/// Runs `f` over the image at `image_path`, translating any error into a
/// process exit. `f` receives a fresh [`Image`] view over the mapping.
///
/// On success, flushes the mapping back to the file before exiting: a
/// process that exits immediately after a successful operation shouldn't
/// race the kernel's own writeback of the dirty pages.
pub fn run(bin: &str, image_path: &std::ffi::OsStr, f: impl FnOnce(&mut Image) -> Result<(), Error>) -> ! {
    let mut mapping = open_image(bin, image_path);
    let mut image = Image::new(&mut mapping);
    match f(&mut image) {
        Ok(()) => {
            mapping.flush().unwrap_or_else(|e| error(bin, e));
            process::exit(0);
        }
        Err(e) => exit_for(bin, e),
    }
}
