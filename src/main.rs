//! Multi-call binary: dispatches on the basename it was invoked as, the way
//! a busybox applet does. `ln -s <img> ext2tool && ./cp ...` is the expected
//! deployment shape — a single executable, many names.

use ext2lib::cli::{self, args, error, open_image};
use ext2lib::image::Image;
use ext2lib::{checker, ops, readimage};
use std::env::ArgsOs;
use std::ffi::OsString;
use std::path::PathBuf;

fn next_or_usage(bin: &str, args: &mut ArgsOs, usage: &str) -> OsString {
    args.next().unwrap_or_else(|| error(bin, format_args!("usage: {bin} {usage}")))
}

fn cmd_cp(bin: &str, mut args: ArgsOs) -> ! {
    let image_path = next_or_usage(bin, &mut args, "<image> <src host path> <dst path>");
    let src = PathBuf::from(next_or_usage(bin, &mut args, "<image> <src host path> <dst path>"));
    let dst = next_or_usage(bin, &mut args, "<image> <src host path> <dst path>")
        .to_string_lossy()
        .into_owned();
    cli::run(bin, &image_path, |image| ops::copy_in(image, &src, &dst))
}

fn cmd_ln(bin: &str, mut args: ArgsOs) -> ! {
    let usage = "<image> <src path> <dst path> [-s]";
    let image_path = next_or_usage(bin, &mut args, usage);
    let src = next_or_usage(bin, &mut args, usage).to_string_lossy().into_owned();
    let dst = next_or_usage(bin, &mut args, usage).to_string_lossy().into_owned();
    let symbolic = args.next().is_some_and(|a| a == "-s");
    cli::run(bin, &image_path, |image| ops::link(image, &src, &dst, symbolic))
}

fn cmd_mkdir(bin: &str, mut args: ArgsOs) -> ! {
    let image_path = next_or_usage(bin, &mut args, "<image> <path>");
    let path = next_or_usage(bin, &mut args, "<image> <path>").to_string_lossy().into_owned();
    cli::run(bin, &image_path, |image| ops::mkdir(image, &path))
}

fn cmd_rm(bin: &str, mut args: ArgsOs) -> ! {
    let image_path = next_or_usage(bin, &mut args, "<image> <path>");
    let path = next_or_usage(bin, &mut args, "<image> <path>").to_string_lossy().into_owned();
    cli::run(bin, &image_path, |image| ops::remove(image, &path))
}

fn cmd_restore(bin: &str, mut args: ArgsOs) -> ! {
    let image_path = next_or_usage(bin, &mut args, "<image> <path>");
    let path = next_or_usage(bin, &mut args, "<image> <path>").to_string_lossy().into_owned();
    cli::run(bin, &image_path, |image| ops::restore(image, &path))
}

fn cmd_checker(bin: &str, mut args: ArgsOs) -> ! {
    let image_path = next_or_usage(bin, &mut args, "<image>");
    let mut mapping = open_image(bin, &image_path);
    let mut image = Image::new(&mut mapping);
    let report = checker::check(&mut image);
    for msg in &report.messages {
        println!("{msg}");
    }
    if report.total > 0 {
        println!("{} file system inconsistencies repaired!", report.total);
    } else {
        println!("No file system inconsistencies detected!");
    }
    mapping.flush().unwrap_or_else(|e| cli::error(bin, e));
    std::process::exit(0);
}

fn cmd_readimage(bin: &str, mut args: ArgsOs) -> ! {
    let image_path = next_or_usage(bin, &mut args, "<image>");
    let mut mapping = open_image(bin, &image_path);
    let image = Image::new(&mut mapping);
    print!("{}", readimage::dump(&image));
    std::process::exit(0);
}

fn main() {
    let (bin, args) = args();
    match bin.as_str() {
        "cp" => cmd_cp(&bin, args),
        "ln" => cmd_ln(&bin, args),
        "mkdir" => cmd_mkdir(&bin, args),
        "rm" => cmd_rm(&bin, args),
        "restore" => cmd_restore(&bin, args),
        "checker" => cmd_checker(&bin, args),
        "readimage" => cmd_readimage(&bin, args),
        _ => error("ext2tool", "invalid binary name"),
    }
}
