//! Colored operator output. Everything goes to stdout, interleaved with
//! streamed `kubectl` output.

use colored::Colorize;

pub fn progress(message: impl AsRef<str>) {
    println!("{}", message.as_ref().yellow());
}

pub fn success(message: impl AsRef<str>) {
    println!("{}", message.as_ref().green());
}

pub fn failure(message: impl AsRef<str>) {
    println!("{}", message.as_ref().red());
}

pub fn header(message: impl AsRef<str>) {
    println!("{}", message.as_ref().blue());
}
