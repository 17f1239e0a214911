//! Shell link document: whole-file decode and encode.
//!
//! Sections appear in a fixed order that the host shell depends on:
//!
//! ```text
//! Header (76) -> [IDList] -> [LinkInfo] -> [StringData x5] -> ExtraData... -> 0
//! ```
//!
//! Decoding dispatches each section strictly on its link flag. Encoding
//! re-derives the section flags from the sections it actually writes, so a
//! stale flag word can never describe a section that is missing.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};
use crate::extra_data::{self, contains_env_var, ExtraDataBlock, IconEnvironment};
use crate::flags::{compute_flags, LinkFlags, SectionPresence};
use crate::header::ShellLinkHeader;
use crate::id_list::ItemIdList;
use crate::link_info::LinkInfoBlock;
use crate::string_data::StringData;
use crate::types::{CustomIcon, LinkInfo};
use std::path::Path;

/// Shell Link (.lnk) file structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLink {
    pub header: ShellLinkHeader,
    /// Link Target IDList (optional)
    pub id_list: Option<ItemIdList>,
    /// Link Info structure (optional)
    pub link_info: Option<LinkInfoBlock>,
    pub string_data: StringData,
    /// Extra Data blocks in file order
    pub extra_data: Vec<ExtraDataBlock>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Blocks that locate the target independently of LinkInfo
fn names_target(block: &ExtraDataBlock) -> bool {
    matches!(
        block.signature(),
        extra_data::ENVIRONMENT_PROPS
            | extra_data::SPECIAL_FOLDER_PROPS
            | extra_data::KNOWN_FOLDER_PROPS
            | extra_data::VISTA_AND_ABOVE_IDLIST_PROPS
    )
}

impl ShellLink {
    /// Decode a complete shell link. Any failure discards the whole result.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);

        let header = ShellLinkHeader::decode(&mut reader)?;
        let flags = header.link_flags;
        log::debug!("shell link flags {:?}", flags);

        let id_list = if flags.contains(LinkFlags::HAS_LINK_TARGET_ID_LIST) {
            Some(ItemIdList::decode(&mut reader)?)
        } else {
            None
        };

        let link_info = if flags.contains(LinkFlags::HAS_LINK_INFO) {
            Some(LinkInfoBlock::decode(&mut reader)?)
        } else {
            None
        };

        let string_data = StringData::decode(&mut reader, flags)?;
        let extra_data = extra_data::decode_chain(&mut reader)?;

        Ok(Self {
            header,
            id_list,
            link_info,
            string_data,
            extra_data,
        })
    }

    /// Sections `encode` will write
    pub fn sections(&self) -> SectionPresence {
        let strings = self.string_data.flags();
        SectionPresence {
            id_list: self.id_list.is_some(),
            link_info: self.link_info.is_some(),
            name: strings.contains(LinkFlags::HAS_NAME),
            relative_path: strings.contains(LinkFlags::HAS_RELATIVE_PATH),
            working_dir: strings.contains(LinkFlags::HAS_WORKING_DIR),
            arguments: strings.contains(LinkFlags::HAS_ARGUMENTS),
            icon_location: strings.contains(LinkFlags::HAS_ICON_LOCATION),
            icon_environment: self.icon_environment().is_some(),
        }
    }

    /// Encode into a single buffer. Validation errors surface before any
    /// bytes leave this function.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.link_flags = header.link_flags.with_sections(&self.sections());

        let mut writer = ByteWriter::with_capacity(1024);
        header.encode(&mut writer)?;
        if let Some(id_list) = &self.id_list {
            id_list.encode(&mut writer)?;
        }
        if let Some(link_info) = &self.link_info {
            link_info.encode(&mut writer)?;
        }
        self.string_data.encode(&mut writer, header.link_flags.is_unicode())?;
        extra_data::encode_chain(&self.extra_data, &mut writer)?;

        Ok(writer.into_inner())
    }

    /// Build a new link from the public value
    pub fn from_info(info: &LinkInfo) -> Result<Self> {
        let mut link = Self {
            header: ShellLinkHeader::new(LinkFlags::IS_UNICODE),
            id_list: None,
            link_info: None,
            string_data: StringData::default(),
            extra_data: Vec::new(),
        };
        link.apply_info(info)?;
        link.header.link_flags = compute_flags(&link.sections());
        Ok(link)
    }

    /// Overwrite the caller-visible fields, keeping everything else (reserved
    /// header words, opaque extra-data blocks, the IDList while the target is
    /// unchanged). Nothing is modified if validation fails.
    pub fn apply_info(&mut self, info: &LinkInfo) -> Result<()> {
        if info.target.is_empty() {
            return Err(Error::InvalidInput("link target is empty".to_string()));
        }
        info.show_command.to_u32()?;

        let filename = &info.custom_icon.filename;
        let icon_environment = if contains_env_var(filename) {
            Some(IconEnvironment::new(filename)?)
        } else {
            None
        };

        if self.target_path().as_deref() != Some(info.target.as_str()) {
            // The shell resolves through the IDList and these blocks before
            // LinkInfo, so any of them left behind still names the old target
            self.id_list = None;
            self.extra_data.retain(|block| !names_target(block));
            self.link_info = Some(LinkInfoBlock::local(&info.target));
            self.string_data.relative_path = None;
            self.header.link_flags.remove(
                LinkFlags::FORCE_NO_LINK_INFO | LinkFlags::HAS_EXP_STRING | LinkFlags::PREFER_ENVIRONMENT_PATH,
            );
        }

        self.string_data.name = non_empty(&info.description);
        self.string_data.working_dir = non_empty(&info.working_directory);
        self.string_data.arguments = non_empty(&info.arguments);
        self.string_data.icon_location = non_empty(filename);

        self.extra_data
            .retain(|block| !matches!(block, ExtraDataBlock::IconEnvironment(_)));
        if let Some(icon) = icon_environment {
            self.extra_data.push(ExtraDataBlock::IconEnvironment(icon));
        }

        self.header.link_flags.insert(LinkFlags::IS_UNICODE);
        self.header.icon_index = info.custom_icon.index;
        self.header.hotkey = info.hot_key;
        self.header.show_command = info.show_command;
        Ok(())
    }

    pub fn icon_environment(&self) -> Option<&IconEnvironment> {
        self.extra_data.iter().find_map(|block| match block {
            ExtraDataBlock::IconEnvironment(icon) => Some(icon),
            _ => None,
        })
    }

    fn resolvable_link_info(&self) -> Option<&LinkInfoBlock> {
        if self.header.link_flags.contains(LinkFlags::FORCE_NO_LINK_INFO) {
            return None;
        }
        self.link_info.as_ref()
    }

    /// Target path from LinkInfo: the local path, else the network path
    pub fn target_path(&self) -> Option<String> {
        let link_info = self.resolvable_link_info()?;
        link_info.local_path().or_else(|| link_info.network_path())
    }

    /// Icon file: an IconEnvironmentDataBlock overrides ICON_LOCATION
    pub fn icon_filename(&self) -> String {
        match self.icon_environment() {
            Some(icon) if !icon.target().is_empty() => icon.target().to_string(),
            _ => self.string_data.icon_location.clone().unwrap_or_default(),
        }
    }

    /// Project onto the public value
    pub fn to_info(&self) -> LinkInfo {
        let network_path = self
            .resolvable_link_info()
            .and_then(|info| info.network_path())
            .unwrap_or_default();

        LinkInfo {
            target: self.target_path().unwrap_or_default(),
            network_path,
            arguments: self.string_data.arguments.clone().unwrap_or_default(),
            description: self.string_data.name.clone().unwrap_or_default(),
            working_directory: self.string_data.working_dir.clone().unwrap_or_default(),
            custom_icon: CustomIcon {
                filename: self.icon_filename(),
                index: self.header.icon_index,
            },
            hot_key: self.header.hotkey,
            show_command: self.header.show_command,
        }
    }
}

/// Read and decode a shell link file
pub fn read_link<P: AsRef<Path>>(path: P) -> Result<ShellLink> {
    let data = std::fs::read(path.as_ref())?;
    log::debug!("read {} bytes from {}", data.len(), path.as_ref().display());
    ShellLink::decode(&data)
}

/// Encode `info` and write it to `path` in one write
pub fn create_link<P: AsRef<Path>>(path: P, info: &LinkInfo) -> Result<()> {
    let bytes = ShellLink::from_info(info)?.encode()?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Decode the shortcut at `path` into the public value
pub fn get_link_info<P: AsRef<Path>>(path: P) -> Result<LinkInfo> {
    Ok(read_link(path)?.to_info())
}

/// Target and arguments of the shortcut at `path`, separated by one space
pub fn get_link_command<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(get_link_info(path)?.command())
}

/// Rewrite an existing shortcut with new public fields, preserving the
/// sections this crate does not interpret
pub fn update_link<P: AsRef<Path>>(path: P, info: &LinkInfo) -> Result<()> {
    let mut link = read_link(path.as_ref())?;
    link.apply_info(info)?;
    let bytes = link.encode()?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}
