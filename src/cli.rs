//! Command-line interface definitions and parsing.

use crate::error::{Error, Result};
use crate::header::{HotKey, ShowCommand, HOTKEYF_ALT, HOTKEYF_CONTROL, HOTKEYF_SHIFT, LNK_NO_HOTKEY};
use crate::output::OutputFormat;
use crate::types::{CustomIcon, LinkInfo};
use clap::{Parser, Subcommand, ValueEnum};

/// lnk - Read and write Windows shortcut (.lnk) files
#[derive(Parser)]
#[command(name = "lnk")]
#[command(about = "lnk - Read and write Windows Shell Link (.lnk) files", version)]
#[command(long_about = "Decode, inspect and create Windows shortcut files without any Windows API:
• info     - show every field of a shortcut (human, JSON or CSV)
• command  - print the command line a shortcut launches
• create   - write a new shortcut, or update an existing one")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the decoded fields of a shortcut
    Info {
        /// Shortcut file to read (e.g., "Notepad.lnk")
        input_file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Output file (use "-" for stdout, default: stdout)
        #[arg(long)]
        output: Option<String>,

        /// Display timestamps in specified timezone (e.g., "UTC+8", "UTC-5", "UTC")
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },

    /// Print the target followed by its arguments
    Command {
        /// Shortcut file to read
        input_file: String,
    },

    /// Create a shortcut, keeping unrelated sections when it already exists
    Create {
        /// Shortcut file to write
        output_file: String,

        /// Path the shortcut points to
        #[arg(long)]
        target: String,

        #[arg(long, default_value = "")]
        arguments: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long = "working-dir", default_value = "")]
        working_dir: String,

        /// Icon file; may contain environment variables such as %SystemRoot%
        #[arg(long, default_value = "")]
        icon: String,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        icon_index: i32,

        /// Hotkey such as "Ctrl+Alt+K" or "F5"
        #[arg(long)]
        hotkey: Option<String>,

        #[arg(long, value_enum, default_value = "normal")]
        show: ShowArg,

        /// Replace the file instead of updating its existing sections
        #[arg(long)]
        overwrite: bool,
    },
}

/// Window state accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowArg {
    Normal,
    Maximized,
    MinNoActive,
}

impl From<ShowArg> for ShowCommand {
    fn from(value: ShowArg) -> Self {
        match value {
            ShowArg::Normal => ShowCommand::Normal,
            ShowArg::Maximized => ShowCommand::Maximized,
            ShowArg::MinNoActive => ShowCommand::MinNoActive,
        }
    }
}

/// Parsed and validated CLI configuration
#[derive(Debug)]
pub enum Config {
    Info {
        input_file: String,
        format: OutputFormat,
        output: Option<String>,
        timezone: chrono_tz::Tz,
    },
    Command {
        input_file: String,
    },
    Create {
        output_file: String,
        info: LinkInfo,
        overwrite: bool,
    },
}

impl Config {
    /// Parse and validate CLI arguments into a configuration
    pub fn from_args(args: Args) -> Result<Self> {
        match args.command {
            Command::Info {
                input_file,
                format,
                output,
                timezone,
            } => {
                Self::check_extension(&input_file);
                Ok(Config::Info {
                    input_file,
                    format,
                    output,
                    timezone: crate::datetime::parse_timezone(&timezone)?,
                })
            }
            Command::Command { input_file } => {
                Self::check_extension(&input_file);
                Ok(Config::Command { input_file })
            }
            Command::Create {
                output_file,
                target,
                arguments,
                description,
                working_dir,
                icon,
                icon_index,
                hotkey,
                show,
                overwrite,
            } => {
                if target.is_empty() {
                    return Err(Error::InvalidInput("--target must not be empty".to_string()));
                }
                Self::check_extension(&output_file);

                let hot_key = match hotkey {
                    Some(text) => parse_hotkey(&text)?,
                    None => LNK_NO_HOTKEY,
                };

                let info = LinkInfo {
                    target,
                    arguments,
                    description,
                    working_directory: working_dir,
                    custom_icon: CustomIcon {
                        filename: icon,
                        index: icon_index,
                    },
                    hot_key,
                    show_command: show.into(),
                    ..Default::default()
                };

                Ok(Config::Create {
                    output_file,
                    info,
                    overwrite,
                })
            }
        }
    }

    fn check_extension(path: &str) {
        let is_lnk = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("lnk"));
        if !is_lnk {
            log::warn!("'{}' does not have a .lnk extension", path);
        }
    }
}

/// Parse "Ctrl+Shift+K", "Alt+F5", "F12" or "None" into a hotkey
pub fn parse_hotkey(text: &str) -> Result<HotKey> {
    let invalid = || Error::InvalidInput(format!("Invalid hotkey '{}'", text));

    if text.eq_ignore_ascii_case("none") {
        return Ok(LNK_NO_HOTKEY);
    }

    let mut parts: Vec<&str> = text.split('+').map(str::trim).collect();
    let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(invalid)?;

    let mut modifiers = 0u8;
    for part in parts {
        modifiers |= match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => HOTKEYF_CONTROL,
            "shift" => HOTKEYF_SHIFT,
            "alt" => HOTKEYF_ALT,
            _ => return Err(invalid()),
        };
    }

    let upper = key.to_ascii_uppercase();
    let vkey = match upper.as_bytes() {
        [c] if c.is_ascii_alphanumeric() => *c,
        [b'F', rest @ ..] => match std::str::from_utf8(rest).ok().and_then(|n| n.parse::<u8>().ok()) {
            // VK_F1 is 0x70
            Some(n @ 1..=24) => 0x6F + n,
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    };

    Ok(HotKey::new(vkey, modifiers))
}
