//! StringData section
//!
//! Up to five count-prefixed strings follow the LinkInfo block, always in
//! this order: name, relative path, working directory, arguments, icon
//! location. A string is present exactly when its link flag is set.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::flags::LinkFlags;

/// String data section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringData {
    /// NAME_STRING, shown as the shortcut's comment
    pub name: Option<String>,
    pub relative_path: Option<String>,
    pub working_dir: Option<String>,
    pub arguments: Option<String>,
    pub icon_location: Option<String>,
}

impl StringData {
    /// Fields with their gating flag, in file order
    fn fields(&self) -> [(LinkFlags, &'static str, &Option<String>); 5] {
        [
            (LinkFlags::HAS_NAME, "name", &self.name),
            (LinkFlags::HAS_RELATIVE_PATH, "relative path", &self.relative_path),
            (LinkFlags::HAS_WORKING_DIR, "working directory", &self.working_dir),
            (LinkFlags::HAS_ARGUMENTS, "arguments", &self.arguments),
            (LinkFlags::HAS_ICON_LOCATION, "icon location", &self.icon_location),
        ]
    }

    pub fn decode(reader: &mut ByteReader<'_>, flags: LinkFlags) -> Result<Self> {
        let unicode = flags.is_unicode();
        let mut read = |flag: LinkFlags| -> Result<Option<String>> {
            if flags.contains(flag) {
                reader.read_sized_string(unicode).map(Some)
            } else {
                Ok(None)
            }
        };

        Ok(Self {
            name: read(LinkFlags::HAS_NAME)?,
            relative_path: read(LinkFlags::HAS_RELATIVE_PATH)?,
            working_dir: read(LinkFlags::HAS_WORKING_DIR)?,
            arguments: read(LinkFlags::HAS_ARGUMENTS)?,
            icon_location: read(LinkFlags::HAS_ICON_LOCATION)?,
        })
    }

    /// Write the present strings. Presence comes from `Option::is_some`; the
    /// caller derives the matching flags from the same fields.
    pub fn encode(&self, writer: &mut ByteWriter, unicode: bool) -> Result<()> {
        for (_, field, value) in self.fields() {
            if let Some(value) = value {
                writer.write_sized_string(field, value, unicode)?;
            }
        }
        Ok(())
    }

    /// Flag bits for the strings that `encode` writes
    pub fn flags(&self) -> LinkFlags {
        self.fields()
            .iter()
            .filter(|(_, _, value)| value.is_some())
            .fold(LinkFlags::empty(), |flags, (flag, _, _)| flags | *flag)
    }
}
