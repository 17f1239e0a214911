//! Public value types describing a shortcut.

use crate::header::{HotKey, ShowCommand, LNK_NO_HOTKEY};
use serde::{Deserialize, Serialize};

/// Icon shown for the shortcut
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomIcon {
    /// Icon file, possibly with unexpanded `%VARIABLE%` references
    pub filename: String,
    /// Icon index within `filename`
    pub index: i32,
}

/// Everything a caller reads from or writes into a shortcut.
///
/// Empty strings mean "not set": an empty field is not written, and a
/// section missing from a file reads back as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Fully qualified target path
    pub target: String,
    /// Target on a network share, empty for local targets
    pub network_path: String,
    /// Command-line arguments, stored verbatim
    pub arguments: String,
    /// Comment shown in the shortcut's properties
    pub description: String,
    pub working_directory: String,
    pub custom_icon: CustomIcon,
    pub hot_key: HotKey,
    pub show_command: ShowCommand,
}

impl Default for LinkInfo {
    fn default() -> Self {
        Self {
            target: String::new(),
            network_path: String::new(),
            arguments: String::new(),
            description: String::new(),
            working_directory: String::new(),
            custom_icon: CustomIcon::default(),
            hot_key: LNK_NO_HOTKEY,
            show_command: ShowCommand::Normal,
        }
    }
}

impl LinkInfo {
    /// Target and arguments joined by a single space, arguments untouched
    pub fn command(&self) -> String {
        format!("{} {}", self.target, self.arguments)
    }
}
