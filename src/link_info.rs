//! LinkInfo block
//!
//! LinkInfo resolves the link target to a filesystem location, either a
//! local volume path or a path on a network share. The block is relocatable:
//! every substructure is reached through an offset from the start of the
//! block, so decoding is index arithmetic over the block slice with a bounds
//! check at each dereference.
//!
//! Layout of the fixed part:
//!
//! | Offset | Field                                  |
//! |--------|----------------------------------------|
//! | 0x00   | LinkInfoSize                           |
//! | 0x04   | LinkInfoHeaderSize (0x1C or >= 0x24)   |
//! | 0x08   | LinkInfoFlags                          |
//! | 0x0C   | VolumeIDOffset                         |
//! | 0x10   | LocalBasePathOffset                    |
//! | 0x14   | CommonNetworkRelativeLinkOffset        |
//! | 0x18   | CommonPathSuffixOffset                 |
//! | 0x1C   | LocalBasePathOffsetUnicode (optional)  |
//! | 0x20   | CommonPathSuffixOffsetUnicode (optional) |

use crate::cursor::{
    c_string_at, c_utf16_string_at, decode_ansi, encode_ansi, encode_ansi_exact, string_to_utf16le,
    ByteReader, ByteWriter,
};
use crate::error::{Error, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Header size without the Unicode offsets
pub const LINK_INFO_HEADER_SIZE: u32 = 0x1C;
/// Header size with LocalBasePathOffsetUnicode and CommonPathSuffixOffsetUnicode
pub const LINK_INFO_HEADER_SIZE_UNICODE: u32 = 0x24;

const VOLUME_ID_HEADER_SIZE: u32 = 0x10;
const VOLUME_ID_HEADER_SIZE_UNICODE: u32 = 0x14;
const NETWORK_LINK_HEADER_SIZE: u32 = 0x14;
const NETWORK_LINK_HEADER_SIZE_UNICODE: u32 = 0x1C;

bitflags! {
    /// LinkInfoFlags
    pub struct LinkInfoFlags: u32 {
        const VOLUME_ID_AND_LOCAL_BASE_PATH                 = 0x0000_0001;
        const COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX = 0x0000_0002;
    }
}

bitflags! {
    /// CommonNetworkRelativeLinkFlags
    pub struct NetworkLinkFlags: u32 {
        const VALID_DEVICE   = 0x0000_0001;
        const VALID_NET_TYPE = 0x0000_0002;
    }
}

/// Type of drive hosting a local target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveType {
    Unknown,
    NoRootDir,
    Removable,
    Fixed,
    Remote,
    CdRom,
    RamDisk,
    Other(u32),
}

impl DriveType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => DriveType::Unknown,
            1 => DriveType::NoRootDir,
            2 => DriveType::Removable,
            3 => DriveType::Fixed,
            4 => DriveType::Remote,
            5 => DriveType::CdRom,
            6 => DriveType::RamDisk,
            other => DriveType::Other(other),
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            DriveType::Unknown => 0,
            DriveType::NoRootDir => 1,
            DriveType::Removable => 2,
            DriveType::Fixed => 3,
            DriveType::Remote => 4,
            DriveType::CdRom => 5,
            DriveType::RamDisk => 6,
            DriveType::Other(value) => value,
        }
    }
}

/// Name of a WNNC network provider type, when it is a common one
pub fn network_provider_name(provider: u32) -> Option<&'static str> {
    match provider {
        0x0001_0000 => Some("MSNET"),
        0x0002_0000 => Some("LANMAN"),
        0x0003_0000 => Some("NETWARE"),
        0x0016_0000 => Some("TCPIP"),
        0x002E_0000 => Some("RDR2SAMPLE"),
        0x0031_0000 => Some("DAV"),
        0x0033_0000 => Some("NFS"),
        _ => None,
    }
}

/// VolumeID substructure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeId {
    pub drive_type: DriveType,
    pub serial_number: u32,
    pub label: String,
}

impl VolumeId {
    /// Placeholder volume for links created without inspecting the drive
    pub fn unknown() -> Self {
        Self {
            drive_type: DriveType::Unknown,
            serial_number: 0,
            label: String::new(),
        }
    }
}

/// CommonNetworkRelativeLink substructure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLink {
    /// Share name, e.g. `\\server\share`
    pub net_name: String,
    /// Mapped device, e.g. `Z:`
    pub device_name: Option<String>,
    /// WNNC provider type
    pub provider_type: Option<u32>,
}

/// Decoded LinkInfo block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkInfoBlock {
    pub volume_id: Option<VolumeId>,
    pub local_base_path: Option<String>,
    pub network_link: Option<NetworkLink>,
    pub common_path_suffix: String,
}

/// Join a base path and the common path suffix with exactly one separator
fn join_path(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        base.to_string()
    } else if base.is_empty() || base.ends_with('\\') || suffix.starts_with('\\') {
        format!("{}{}", base, suffix)
    } else {
        format!("{}\\{}", base, suffix)
    }
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedLinkInfo(msg.into())
}

fn u32_at(block: &[u8], offset: usize, field: &str) -> Result<u32> {
    block
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| malformed(format!("{} at 0x{:X} outside block of {} bytes", field, offset, block.len())))
}

/// Validate an offset field and convert it to an index into `block`
fn offset_in(block: &[u8], offset: u32, field: &str) -> Result<usize> {
    let offset = offset as usize;
    if offset >= block.len() {
        return Err(malformed(format!(
            "{} 0x{:X} outside block of {} bytes",
            field,
            offset,
            block.len()
        )));
    }
    Ok(offset)
}

fn ansi_string_in(block: &[u8], offset: u32, field: &str) -> Result<String> {
    let offset = offset_in(block, offset, field)?;
    c_string_at(block, offset)
        .map(decode_ansi)
        .ok_or_else(|| malformed(format!("{} is not NUL-terminated", field)))
}

fn unicode_string_in(block: &[u8], offset: u32, field: &str) -> Result<String> {
    let offset = offset_in(block, offset, field)?;
    c_utf16_string_at(block, offset).ok_or_else(|| malformed(format!("{} is not NUL-terminated", field)))
}

/// Sub-slice `[offset, offset + size)` after checking its self-declared size
fn substructure<'a>(block: &'a [u8], offset: u32, min_size: u32, field: &str) -> Result<&'a [u8]> {
    let start = offset_in(block, offset, field)?;
    let size = u32_at(block, start, field)?;
    if size < min_size {
        return Err(malformed(format!("{} size {} below minimum {}", field, size, min_size)));
    }
    block
        .get(start..start + size as usize)
        .ok_or_else(|| malformed(format!("{} of {} bytes overruns LinkInfo", field, size)))
}

fn decode_volume_id(block: &[u8], offset: u32) -> Result<VolumeId> {
    let volume = substructure(block, offset, VOLUME_ID_HEADER_SIZE, "VolumeID")?;
    let drive_type = DriveType::from_u32(u32_at(volume, 4, "DriveType")?);
    let serial_number = u32_at(volume, 8, "DriveSerialNumber")?;
    let label_offset = u32_at(volume, 12, "VolumeLabelOffset")?;

    let label = if label_offset == VOLUME_ID_HEADER_SIZE_UNICODE {
        let unicode_offset = u32_at(volume, 16, "VolumeLabelOffsetUnicode")?;
        unicode_string_in(volume, unicode_offset, "VolumeLabelUnicode")?
    } else {
        ansi_string_in(volume, label_offset, "VolumeLabel")?
    };

    Ok(VolumeId {
        drive_type,
        serial_number,
        label,
    })
}

fn decode_network_link(block: &[u8], offset: u32) -> Result<NetworkLink> {
    let link = substructure(block, offset, NETWORK_LINK_HEADER_SIZE, "CommonNetworkRelativeLink")?;
    let flags = NetworkLinkFlags::from_bits_truncate(u32_at(link, 4, "CommonNetworkRelativeLinkFlags")?);
    let net_name_offset = u32_at(link, 8, "NetNameOffset")?;
    let device_name_offset = u32_at(link, 12, "DeviceNameOffset")?;
    let provider = u32_at(link, 16, "NetworkProviderType")?;

    let (net_name, device_name) = if net_name_offset > NETWORK_LINK_HEADER_SIZE {
        let net_name_unicode = u32_at(link, 20, "NetNameOffsetUnicode")?;
        let device_name_unicode = u32_at(link, 24, "DeviceNameOffsetUnicode")?;
        let net_name = unicode_string_in(link, net_name_unicode, "NetNameUnicode")?;
        let device_name = if flags.contains(NetworkLinkFlags::VALID_DEVICE) {
            Some(unicode_string_in(link, device_name_unicode, "DeviceNameUnicode")?)
        } else {
            None
        };
        (net_name, device_name)
    } else {
        let net_name = ansi_string_in(link, net_name_offset, "NetName")?;
        let device_name = if flags.contains(NetworkLinkFlags::VALID_DEVICE) {
            Some(ansi_string_in(link, device_name_offset, "DeviceName")?)
        } else {
            None
        };
        (net_name, device_name)
    };

    Ok(NetworkLink {
        net_name,
        device_name,
        provider_type: flags.contains(NetworkLinkFlags::VALID_NET_TYPE).then(|| provider),
    })
}

impl LinkInfoBlock {
    /// Block for a local target: placeholder volume, full path as base, no suffix
    pub fn local(path: &str) -> Self {
        Self {
            volume_id: Some(VolumeId::unknown()),
            local_base_path: Some(path.to_string()),
            network_link: None,
            common_path_suffix: String::new(),
        }
    }

    pub fn flags(&self) -> LinkInfoFlags {
        let mut flags = LinkInfoFlags::empty();
        flags.set(LinkInfoFlags::VOLUME_ID_AND_LOCAL_BASE_PATH, self.local_base_path.is_some());
        flags.set(
            LinkInfoFlags::COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX,
            self.network_link.is_some(),
        );
        flags
    }

    /// Local base path joined with the common path suffix
    pub fn local_path(&self) -> Option<String> {
        self.local_base_path
            .as_deref()
            .map(|base| join_path(base, &self.common_path_suffix))
    }

    /// Share name joined with the common path suffix
    pub fn network_path(&self) -> Option<String> {
        self.network_link
            .as_ref()
            .map(|link| join_path(&link.net_name, &self.common_path_suffix))
    }

    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let size = reader.peek_u32()?;
        if size < LINK_INFO_HEADER_SIZE {
            return Err(malformed(format!("LinkInfoSize {} below header size", size)));
        }
        let block = reader.read_bytes(size as usize)?;

        let header_size = u32_at(block, 4, "LinkInfoHeaderSize")?;
        if header_size < LINK_INFO_HEADER_SIZE || header_size > size {
            return Err(malformed(format!("LinkInfoHeaderSize 0x{:X}", header_size)));
        }

        let flags = LinkInfoFlags::from_bits_truncate(u32_at(block, 8, "LinkInfoFlags")?);
        let volume_id_offset = u32_at(block, 12, "VolumeIDOffset")?;
        let local_base_path_offset = u32_at(block, 16, "LocalBasePathOffset")?;
        let network_link_offset = u32_at(block, 20, "CommonNetworkRelativeLinkOffset")?;
        let suffix_offset = u32_at(block, 24, "CommonPathSuffixOffset")?;
        let (local_unicode_offset, suffix_unicode_offset) = if header_size >= LINK_INFO_HEADER_SIZE_UNICODE {
            (
                u32_at(block, 28, "LocalBasePathOffsetUnicode")?,
                u32_at(block, 32, "CommonPathSuffixOffsetUnicode")?,
            )
        } else {
            (0, 0)
        };

        let mut info = LinkInfoBlock::default();

        if flags.contains(LinkInfoFlags::VOLUME_ID_AND_LOCAL_BASE_PATH) {
            if volume_id_offset != 0 {
                info.volume_id = Some(decode_volume_id(block, volume_id_offset)?);
            }
            info.local_base_path = if local_unicode_offset != 0 {
                Some(unicode_string_in(block, local_unicode_offset, "LocalBasePathUnicode")?)
            } else if local_base_path_offset != 0 {
                Some(ansi_string_in(block, local_base_path_offset, "LocalBasePath")?)
            } else {
                None
            };
        }

        if flags.contains(LinkInfoFlags::COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX) && network_link_offset != 0 {
            info.network_link = Some(decode_network_link(block, network_link_offset)?);
        }

        info.common_path_suffix = if suffix_unicode_offset != 0 {
            unicode_string_in(block, suffix_unicode_offset, "CommonPathSuffixUnicode")?
        } else if suffix_offset != 0 {
            ansi_string_in(block, suffix_offset, "CommonPathSuffix")?
        } else {
            String::new()
        };

        log::trace!(
            "LinkInfo: {} bytes, flags {:?}, local {:?}, network {:?}",
            size,
            flags,
            info.local_base_path,
            info.network_link.as_ref().map(|n| &n.net_name)
        );

        Ok(info)
    }

    fn needs_unicode(&self) -> bool {
        let mut strings = vec![self.common_path_suffix.as_str()];
        strings.extend(self.local_base_path.as_deref());
        if let Some(link) = &self.network_link {
            strings.push(&link.net_name);
            strings.extend(link.device_name.as_deref());
        }
        strings.iter().any(|s| encode_ansi_exact(s).is_none())
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        let unicode = self.needs_unicode();
        let header_size = if unicode {
            LINK_INFO_HEADER_SIZE_UNICODE
        } else {
            LINK_INFO_HEADER_SIZE
        };

        // Everything after the fixed header; offsets are header_size + body.len()
        let mut body: Vec<u8> = Vec::new();
        let offset_of = |body: &Vec<u8>| header_size as usize + body.len();

        let mut volume_id_offset = 0;
        let mut local_base_path_offset = 0;
        if let Some(path) = &self.local_base_path {
            let placeholder = VolumeId::unknown();
            let volume = self.volume_id.as_ref().unwrap_or(&placeholder);
            volume_id_offset = offset_of(&body);
            body.extend(encode_volume_id(volume)?);

            local_base_path_offset = offset_of(&body);
            body.extend(encode_ansi(path));
            body.push(0);
        }

        let mut network_link_offset = 0;
        if let Some(link) = &self.network_link {
            network_link_offset = offset_of(&body);
            body.extend(encode_network_link(link)?);
        }

        let suffix_offset = offset_of(&body);
        body.extend(encode_ansi(&self.common_path_suffix));
        body.push(0);

        let mut unicode_offsets = Vec::new();
        if unicode {
            let mut local_unicode_offset = 0;
            if let Some(path) = &self.local_base_path {
                local_unicode_offset = offset_of(&body);
                body.extend(string_to_utf16le(path));
                body.extend([0, 0]);
            }
            let suffix_unicode_offset = offset_of(&body);
            body.extend(string_to_utf16le(&self.common_path_suffix));
            body.extend([0, 0]);
            unicode_offsets = vec![local_unicode_offset, suffix_unicode_offset];
        }

        let total = header_size as usize + body.len();
        let size = u32::try_from(total).map_err(|_| Error::PathTooLong {
            field: "LinkInfo",
            length: total,
        })?;

        writer.write_u32(size)?;
        writer.write_u32(header_size)?;
        writer.write_u32(self.flags().bits())?;
        for offset in [volume_id_offset, local_base_path_offset, network_link_offset, suffix_offset]
            .into_iter()
            .chain(unicode_offsets)
        {
            writer.write_u32(offset as u32)?;
        }
        writer.write_bytes(&body)
    }
}

fn encode_volume_id(volume: &VolumeId) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::new();
    match encode_ansi_exact(&volume.label) {
        Some(label) => {
            writer.write_u32(VOLUME_ID_HEADER_SIZE + label.len() as u32 + 1)?;
            writer.write_u32(volume.drive_type.to_u32())?;
            writer.write_u32(volume.serial_number)?;
            writer.write_u32(VOLUME_ID_HEADER_SIZE)?;
            writer.write_bytes(&label)?;
            writer.write_u8(0)?;
        }
        None => {
            let label = string_to_utf16le(&volume.label);
            writer.write_u32(VOLUME_ID_HEADER_SIZE_UNICODE + label.len() as u32 + 2)?;
            writer.write_u32(volume.drive_type.to_u32())?;
            writer.write_u32(volume.serial_number)?;
            writer.write_u32(VOLUME_ID_HEADER_SIZE_UNICODE)?;
            writer.write_u32(VOLUME_ID_HEADER_SIZE_UNICODE)?;
            writer.write_bytes(&label)?;
            writer.write_u16(0)?;
        }
    }
    Ok(writer.into_inner())
}

fn encode_network_link(link: &NetworkLink) -> Result<Vec<u8>> {
    let unicode = encode_ansi_exact(&link.net_name).is_none()
        || link
            .device_name
            .as_deref()
            .map_or(false, |device| encode_ansi_exact(device).is_none());
    let header_size = if unicode {
        NETWORK_LINK_HEADER_SIZE_UNICODE
    } else {
        NETWORK_LINK_HEADER_SIZE
    };

    let mut flags = NetworkLinkFlags::empty();
    flags.set(NetworkLinkFlags::VALID_DEVICE, link.device_name.is_some());
    flags.set(NetworkLinkFlags::VALID_NET_TYPE, link.provider_type.is_some());

    let mut strings: Vec<u8> = Vec::new();
    let net_name_offset = header_size as usize;
    strings.extend(encode_ansi(&link.net_name));
    strings.push(0);

    let mut device_name_offset = 0;
    if let Some(device) = &link.device_name {
        device_name_offset = header_size as usize + strings.len();
        strings.extend(encode_ansi(device));
        strings.push(0);
    }

    let mut unicode_offsets = Vec::new();
    if unicode {
        let net_name_unicode = header_size as usize + strings.len();
        strings.extend(string_to_utf16le(&link.net_name));
        strings.extend([0, 0]);
        let mut device_name_unicode = 0;
        if let Some(device) = &link.device_name {
            device_name_unicode = header_size as usize + strings.len();
            strings.extend(string_to_utf16le(device));
            strings.extend([0, 0]);
        }
        unicode_offsets = vec![net_name_unicode, device_name_unicode];
    }

    let mut writer = ByteWriter::new();
    writer.write_u32((header_size as usize + strings.len()) as u32)?;
    writer.write_u32(flags.bits())?;
    writer.write_u32(net_name_offset as u32)?;
    writer.write_u32(device_name_offset as u32)?;
    writer.write_u32(link.provider_type.unwrap_or(0))?;
    for offset in unicode_offsets {
        writer.write_u32(offset as u32)?;
    }
    writer.write_bytes(&strings)?;
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn encode(info: &LinkInfoBlock) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        info.encode(&mut writer).unwrap();
        writer.into_inner()
    }

    fn decode(bytes: &[u8]) -> Result<LinkInfoBlock> {
        LinkInfoBlock::decode(&mut ByteReader::new(bytes))
    }

    #[test]
    fn test_decode_handmade_removable_volume() {
        let bytes = fixtures::usbdrive_link_info();
        let mut reader = ByteReader::new(&bytes);
        let info = LinkInfoBlock::decode(&mut reader).unwrap();

        assert_eq!(reader.remaining(), 0);
        let volume = info.volume_id.as_ref().unwrap();
        assert_eq!(volume.drive_type, DriveType::Removable);
        assert_eq!(volume.serial_number, 0x1234_ABCD);
        assert_eq!(volume.label, "USB");
        assert_eq!(info.local_path().as_deref(), Some("G:\\usbdrive.txt"));
        assert_eq!(info.network_path(), None);
    }

    #[test]
    fn test_encode_local_layout() {
        let bytes = encode(&LinkInfoBlock::local("C:\\a.txt"));

        // header 0x1C, VolumeID 0x11, "C:\a.txt\0", suffix "\0"
        assert_eq!(bytes.len(), 0x1C + 0x11 + 9 + 1);
        assert_eq!(&bytes[0..4], &(bytes.len() as u32).to_le_bytes());
        assert_eq!(&bytes[4..8], &[0x1C, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0x1C, 0, 0, 0]);
        assert_eq!(&bytes[16..20], &[0x2D, 0, 0, 0]);
        assert_eq!(&bytes[20..24], &[0, 0, 0, 0]);
        assert_eq!(&bytes[24..28], &[0x36, 0, 0, 0]);
        assert_eq!(&bytes[0x2D..0x36], b"C:\\a.txt\0");

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, LinkInfoBlock::local("C:\\a.txt"));
    }

    #[test]
    fn test_unicode_path_gets_unicode_offsets() {
        let info = LinkInfoBlock::local("C:\\データ\\ファイル.txt");
        let bytes = encode(&info);
        assert_eq!(&bytes[4..8], &[0x24, 0, 0, 0]);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.local_path().as_deref(), Some("C:\\データ\\ファイル.txt"));
    }

    #[test]
    fn test_network_link_round_trip() {
        let info = LinkInfoBlock {
            volume_id: None,
            local_base_path: None,
            network_link: Some(NetworkLink {
                net_name: "\\\\server\\share".to_string(),
                device_name: Some("Z:".to_string()),
                provider_type: Some(0x0002_0000),
            }),
            common_path_suffix: "docs\\report.doc".to_string(),
        };
        let decoded = decode(&encode(&info)).unwrap();

        assert_eq!(decoded, info);
        assert_eq!(decoded.network_path().as_deref(), Some("\\\\server\\share\\docs\\report.doc"));
        assert_eq!(decoded.local_path(), None);
        assert_eq!(network_provider_name(0x0002_0000), Some("LANMAN"));
    }

    #[test]
    fn test_offset_outside_block() {
        let mut bytes = fixtures::usbdrive_link_info();
        // LocalBasePathOffset past LinkInfoSize
        bytes[16..20].copy_from_slice(&0x200u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(Error::MalformedLinkInfo(_))));
    }

    #[test]
    fn test_volume_overruns_block() {
        let mut bytes = fixtures::usbdrive_link_info();
        bytes[0x1C..0x20].copy_from_slice(&0x100u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(Error::MalformedLinkInfo(_))));
    }

    #[test]
    fn test_size_below_header() {
        let mut bytes = fixtures::usbdrive_link_info();
        bytes[0..4].copy_from_slice(&0x10u32.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(Error::MalformedLinkInfo(_))));
    }

    #[test]
    fn test_block_longer_than_buffer() {
        let bytes = fixtures::usbdrive_link_info();
        let result = decode(&bytes[..bytes.len() - 4]);
        assert!(matches!(result, Err(Error::TruncatedData { .. })));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("C:\\dir", ""), "C:\\dir");
        assert_eq!(join_path("C:\\", "file"), "C:\\file");
        assert_eq!(join_path("\\\\srv\\share", "file"), "\\\\srv\\share\\file");
    }
}
