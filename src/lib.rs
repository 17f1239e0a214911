//! # lnk - Windows Shell Link reader and writer
//!
//! Decodes and encodes Windows shortcut (.lnk) files in pure Rust, on any
//! platform. A shortcut is read into a [`ShellLink`] that keeps every section
//! of the file, so editing one field and writing it back leaves the rest
//! untouched.
//!
//! ## Features
//!
//! - Byte-exact decode and re-encode of header, IDList, LinkInfo, string data
//!   and extra data blocks
//! - ANSI (Windows-1252) and UTF-16LE strings
//! - Local and network (UNC) targets
//! - Icon locations with environment variables (`%SystemRoot%\...`)
//! - Simplified [`LinkInfo`] view for creating and inspecting shortcuts
//! - CLI with human-readable, JSON and CSV output
//!
//! ```no_run
//! use lnk::{create_link, get_link_command, LinkInfo};
//!
//! let info = LinkInfo {
//!     target: r"C:\Windows\notepad.exe".to_string(),
//!     arguments: "readme.txt".to_string(),
//!     ..Default::default()
//! };
//! create_link("Notepad.lnk", &info)?;
//! assert_eq!(get_link_command("Notepad.lnk")?, r"C:\Windows\notepad.exe readme.txt");
//! # Ok::<(), lnk::Error>(())
//! ```

pub mod app;
pub mod cli;
pub mod cursor;
pub mod datetime;
pub mod error;
pub mod extra_data;
pub mod flags;
pub mod header;
pub mod id_list;
pub mod link_info;
pub mod output;
pub mod shell_link;
pub mod string_data;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
pub use header::{HotKey, ShowCommand, LNK_NO_HOTKEY};
pub use output::{OutputFormat, OutputWriter};
pub use shell_link::{create_link, get_link_command, get_link_info, read_link, update_link, ShellLink};
pub use types::{CustomIcon, LinkInfo};
