//! Shell link header (76 bytes)
//!
//! The header is the only fixed-size part of the format. It carries the link
//! flags that gate every later section, the target's attributes and FILETIME
//! stamps, the icon index paired with the icon location string, the initial
//! window state and the activation hotkey.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};
use crate::flags::LinkFlags;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HeaderSize field, always 0x0000004C
pub const HEADER_SIZE: u32 = 0x0000_004C;

/// Shell link CLSID 00021401-0000-0000-C000-000000000046 in on-disk order
pub const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

bitflags! {
    /// FileAttributes of the link target
    pub struct FileAttributes: u32 {
        const READONLY            = 0x0000_0001;
        const HIDDEN              = 0x0000_0002;
        const SYSTEM              = 0x0000_0004;
        const DIRECTORY           = 0x0000_0010;
        const ARCHIVE             = 0x0000_0020;
        const NORMAL              = 0x0000_0080;
        const TEMPORARY           = 0x0000_0100;
        const SPARSE_FILE         = 0x0000_0200;
        const REPARSE_POINT       = 0x0000_0400;
        const COMPRESSED          = 0x0000_0800;
        const OFFLINE             = 0x0000_1000;
        const NOT_CONTENT_INDEXED = 0x0000_2000;
        const ENCRYPTED           = 0x0000_4000;
    }
}

/// Initial window state of the launched target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShowCommand {
    Normal,
    Maximized,
    MinNoActive,
    /// Value outside the documented set, kept as read
    Other(u32),
}

impl ShowCommand {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => ShowCommand::Normal,
            3 => ShowCommand::Maximized,
            7 => ShowCommand::MinNoActive,
            other => ShowCommand::Other(other),
        }
    }

    /// On-disk value; `Other` cannot be written
    pub fn to_u32(self) -> Result<u32> {
        match self {
            ShowCommand::Normal => Ok(1),
            ShowCommand::Maximized => Ok(3),
            ShowCommand::MinNoActive => Ok(7),
            ShowCommand::Other(value) => Err(Error::InvalidShowCommand(value)),
        }
    }
}

impl Default for ShowCommand {
    fn default() -> Self {
        ShowCommand::Normal
    }
}

/// Hotkey modifier: Shift
pub const HOTKEYF_SHIFT: u8 = 0x01;
/// Hotkey modifier: Ctrl
pub const HOTKEYF_CONTROL: u8 = 0x02;
/// Hotkey modifier: Alt
pub const HOTKEYF_ALT: u8 = 0x04;

/// Keyboard shortcut that activates the link: virtual-key code plus modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HotKey {
    pub key: u8,
    pub modifiers: u8,
}

/// No hotkey assigned
pub const LNK_NO_HOTKEY: HotKey = HotKey { key: 0, modifiers: 0 };

impl HotKey {
    pub fn new(key: u8, modifiers: u8) -> Self {
        Self { key, modifiers }
    }

    /// Low byte is the virtual key, high byte the modifier set
    pub fn from_raw(raw: u16) -> Self {
        Self {
            key: (raw & 0xFF) as u8,
            modifiers: (raw >> 8) as u8,
        }
    }

    pub fn to_raw(self) -> u16 {
        u16::from(self.key) | (u16::from(self.modifiers) << 8)
    }

    pub fn is_none(&self) -> bool {
        self.key == 0
    }
}

impl fmt::Display for HotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "None");
        }
        if self.modifiers & HOTKEYF_CONTROL != 0 {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers & HOTKEYF_ALT != 0 {
            write!(f, "Alt+")?;
        }
        if self.modifiers & HOTKEYF_SHIFT != 0 {
            write!(f, "Shift+")?;
        }
        match self.key {
            k @ (0x30..=0x39 | 0x41..=0x5A) => write!(f, "{}", k as char),
            k @ 0x70..=0x87 => write!(f, "F{}", k - 0x6F),
            0x90 => write!(f, "NumLock"),
            0x91 => write!(f, "ScrollLock"),
            k => write!(f, "0x{:02X}", k),
        }
    }
}

/// Shell Link Header structure (76 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLinkHeader {
    /// Documented link flag bits
    pub link_flags: LinkFlags,
    /// Flag bits with no documented meaning, written back unchanged
    pub unknown_link_flags: u32,
    /// Raw FileAttributes word
    pub file_attributes: u32,
    /// FILETIME ticks, carried without conversion
    pub creation_time: u64,
    pub access_time: u64,
    pub write_time: u64,
    /// Low 32 bits of the target size
    pub file_size: u32,
    pub icon_index: i32,
    pub show_command: ShowCommand,
    pub hotkey: HotKey,
    pub reserved1: u16,
    pub reserved2: u32,
    pub reserved3: u32,
}

impl ShellLinkHeader {
    /// Header for a new link with the given flags and everything else zeroed
    pub fn new(link_flags: LinkFlags) -> Self {
        Self {
            link_flags,
            unknown_link_flags: 0,
            file_attributes: 0,
            creation_time: 0,
            access_time: 0,
            write_time: 0,
            file_size: 0,
            icon_index: 0,
            show_command: ShowCommand::Normal,
            hotkey: LNK_NO_HOTKEY,
            reserved1: 0,
            reserved2: 0,
            reserved3: 0,
        }
    }

    pub fn attributes(&self) -> FileAttributes {
        FileAttributes::from_bits_truncate(self.file_attributes)
    }

    /// Decode the header from the start of a shell link
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        if reader.remaining() < HEADER_SIZE as usize {
            return Err(Error::InvalidHeader(format!(
                "need {} bytes, got {}",
                HEADER_SIZE,
                reader.remaining()
            )));
        }

        let header_size = reader.read_u32()?;
        if header_size != HEADER_SIZE {
            return Err(Error::InvalidHeader(format!(
                "header size 0x{:X}, expected 0x{:X}",
                header_size, HEADER_SIZE
            )));
        }

        let clsid = reader.read_bytes(16)?;
        if clsid != LINK_CLSID {
            return Err(Error::InvalidHeader("not a Shell Link CLSID".to_string()));
        }

        let (link_flags, unknown_link_flags) = LinkFlags::split(reader.read_u32()?);
        if unknown_link_flags != 0 {
            log::debug!("preserving undocumented link flag bits 0x{:08X}", unknown_link_flags);
        }

        Ok(Self {
            link_flags,
            unknown_link_flags,
            file_attributes: reader.read_u32()?,
            creation_time: reader.read_u64()?,
            access_time: reader.read_u64()?,
            write_time: reader.read_u64()?,
            file_size: reader.read_u32()?,
            icon_index: reader.read_i32()?,
            show_command: ShowCommand::from_u32(reader.read_u32()?),
            hotkey: HotKey::from_raw(reader.read_u16()?),
            reserved1: reader.read_u16()?,
            reserved2: reader.read_u32()?,
            reserved3: reader.read_u32()?,
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        let show_command = self.show_command.to_u32()?;

        writer.write_u32(HEADER_SIZE)?;
        writer.write_bytes(&LINK_CLSID)?;
        writer.write_u32(self.link_flags.join(self.unknown_link_flags))?;
        writer.write_u32(self.file_attributes)?;
        writer.write_u64(self.creation_time)?;
        writer.write_u64(self.access_time)?;
        writer.write_u64(self.write_time)?;
        writer.write_u32(self.file_size)?;
        writer.write_i32(self.icon_index)?;
        writer.write_u32(show_command)?;
        writer.write_u16(self.hotkey.to_raw())?;
        writer.write_u16(self.reserved1)?;
        writer.write_u32(self.reserved2)?;
        writer.write_u32(self.reserved3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(header: &ShellLinkHeader) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        header.encode(&mut writer).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_header_layout() {
        let mut header = ShellLinkHeader::new(LinkFlags::HAS_LINK_INFO | LinkFlags::IS_UNICODE);
        header.icon_index = 5;
        header.show_command = ShowCommand::Maximized;
        header.hotkey = HotKey::new(0x4B, HOTKEYF_CONTROL | HOTKEYF_ALT);
        let bytes = encode(&header);

        assert_eq!(bytes.len(), 76);
        assert_eq!(&bytes[0..4], &[0x4C, 0, 0, 0]);
        assert_eq!(&bytes[4..20], &LINK_CLSID);
        assert_eq!(&bytes[20..24], &[0x82, 0, 0, 0]);
        assert_eq!(&bytes[56..60], &[5, 0, 0, 0]);
        assert_eq!(&bytes[60..64], &[3, 0, 0, 0]);
        assert_eq!(&bytes[64..66], &[0x4B, 0x06]);
    }

    #[test]
    fn test_header_round_trip_preserves_reserved() {
        let mut header = ShellLinkHeader::new(LinkFlags::IS_UNICODE);
        header.unknown_link_flags = 0x1000_0000;
        header.file_attributes = 0x20;
        header.creation_time = 0x01D9_0000_0000_0000;
        header.reserved1 = 0xBEEF;
        header.reserved3 = 7;
        header.show_command = ShowCommand::MinNoActive;

        let bytes = encode(&header);
        let decoded = ShellLinkHeader::decode(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(decoded, header);
        assert!(decoded.attributes().contains(FileAttributes::ARCHIVE));
    }

    #[test]
    fn test_invalid_header() {
        let mut bytes = encode(&ShellLinkHeader::new(LinkFlags::empty()));

        assert!(matches!(
            ShellLinkHeader::decode(&mut ByteReader::new(&bytes[..50])),
            Err(Error::InvalidHeader(_))
        ));

        bytes[10] ^= 0xFF;
        assert!(matches!(
            ShellLinkHeader::decode(&mut ByteReader::new(&bytes)),
            Err(Error::InvalidHeader(_))
        ));

        bytes[10] ^= 0xFF;
        bytes[0] = 0x4D;
        assert!(matches!(
            ShellLinkHeader::decode(&mut ByteReader::new(&bytes)),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_unknown_show_command() {
        let mut bytes = encode(&ShellLinkHeader::new(LinkFlags::empty()));
        bytes[60] = 2;
        let header = ShellLinkHeader::decode(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(header.show_command, ShowCommand::Other(2));

        let mut writer = ByteWriter::new();
        assert!(matches!(header.encode(&mut writer), Err(Error::InvalidShowCommand(2))));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_hotkey_display() {
        assert_eq!(LNK_NO_HOTKEY.to_string(), "None");
        assert!(HotKey::from_raw(0).is_none());
        assert_eq!(HotKey::new(0x4B, HOTKEYF_CONTROL | HOTKEYF_ALT).to_string(), "Ctrl+Alt+K");
        assert_eq!(HotKey::new(0x74, HOTKEYF_SHIFT).to_string(), "Shift+F5");
        assert_eq!(HotKey::from_raw(0x0641), HotKey::new(0x41, 0x06));
    }
}
