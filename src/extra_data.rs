//! ExtraData block chain
//!
//! After the string data comes a list of self-sized blocks, each tagged with
//! a signature, ended by a block whose size is zero. Only the
//! IconEnvironmentDataBlock is interpreted; console and tracker blocks are
//! recognised by signature and everything else is kept as raw bytes. An
//! IconEnvironmentDataBlock keeps its payload too until one of its paths is
//! changed, so a decoded chain re-encodes byte for byte.

use crate::cursor::{decode_ansi, encode_ansi, string_to_utf16le, utf16le_to_string, ByteReader, ByteWriter};
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

pub const ENVIRONMENT_PROPS: u32 = 0xA000_0001;
pub const CONSOLE_PROPS: u32 = 0xA000_0002;
pub const TRACKER_PROPS: u32 = 0xA000_0003;
pub const CONSOLE_FE_PROPS: u32 = 0xA000_0004;
pub const SPECIAL_FOLDER_PROPS: u32 = 0xA000_0005;
pub const DARWIN_PROPS: u32 = 0xA000_0006;
pub const ICON_ENVIRONMENT_PROPS: u32 = 0xA000_0007;
pub const SHIM_PROPS: u32 = 0xA000_0008;
pub const PROPERTY_STORE_PROPS: u32 = 0xA000_0009;
pub const KNOWN_FOLDER_PROPS: u32 = 0xA000_000B;
pub const VISTA_AND_ABOVE_IDLIST_PROPS: u32 = 0xA000_000C;

/// BlockSize of an IconEnvironmentDataBlock
pub const ICON_ENVIRONMENT_BLOCK_SIZE: u32 = 0x0000_0314;
const TARGET_ANSI_LEN: usize = 260;
const TARGET_UNICODE_LEN: usize = 520;
const BLOCK_HEADER_LEN: u32 = 8;

/// Display name for a block signature
pub fn signature_name(signature: u32) -> &'static str {
    match signature {
        ENVIRONMENT_PROPS => "EnvironmentVariableDataBlock",
        CONSOLE_PROPS => "ConsoleDataBlock",
        TRACKER_PROPS => "TrackerDataBlock",
        CONSOLE_FE_PROPS => "ConsoleFEDataBlock",
        SPECIAL_FOLDER_PROPS => "SpecialFolderDataBlock",
        DARWIN_PROPS => "DarwinDataBlock",
        ICON_ENVIRONMENT_PROPS => "IconEnvironmentDataBlock",
        SHIM_PROPS => "ShimDataBlock",
        PROPERTY_STORE_PROPS => "PropertyStoreDataBlock",
        KNOWN_FOLDER_PROPS => "KnownFolderDataBlock",
        VISTA_AND_ABOVE_IDLIST_PROPS => "VistaAndAboveIDListDataBlock",
        _ => "Unknown",
    }
}

/// True when `path` holds a `%VARIABLE%` reference
pub fn contains_env_var(path: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"%[^%\\/:*?<>|]+%").expect("valid environment variable pattern"))
        .is_match(path)
}

/// IconEnvironmentDataBlock: icon path with unexpanded environment variables
#[derive(Debug, Clone)]
pub struct IconEnvironment {
    /// TargetAnsi, 260-byte field in the ANSI code page
    pub target_ansi: String,
    /// TargetUnicode, 520-byte UTF-16LE field
    pub target_unicode: String,
    /// Payload as read; written back while both targets still match it
    raw: Option<Vec<u8>>,
}

impl PartialEq for IconEnvironment {
    fn eq(&self, other: &Self) -> bool {
        self.target_ansi == other.target_ansi && self.target_unicode == other.target_unicode
    }
}

impl Eq for IconEnvironment {}

impl IconEnvironment {
    /// Both fields set to `path`; each must fit its field with a terminator
    pub fn new(path: &str) -> Result<Self> {
        let units = path.encode_utf16().count();
        if units >= TARGET_ANSI_LEN || encode_ansi(path).len() >= TARGET_ANSI_LEN {
            return Err(Error::PathTooLong {
                field: "icon environment path",
                length: units,
            });
        }
        Ok(Self {
            target_ansi: path.to_string(),
            target_unicode: path.to_string(),
            raw: None,
        })
    }

    /// The path the shell uses: Unicode when present, otherwise ANSI
    pub fn target(&self) -> &str {
        if self.target_unicode.is_empty() {
            &self.target_ansi
        } else {
            &self.target_unicode
        }
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let (target_ansi, target_unicode) = Self::decode_targets(payload)?;
        Ok(Self {
            target_ansi,
            target_unicode,
            raw: Some(payload.to_vec()),
        })
    }

    fn decode_targets(payload: &[u8]) -> Result<(String, String)> {
        if payload.len() < TARGET_ANSI_LEN {
            return Err(Error::MalformedExtraData(format!(
                "IconEnvironmentDataBlock payload of {} bytes",
                payload.len()
            )));
        }

        let ansi = &payload[..TARGET_ANSI_LEN];
        let ansi_len = ansi.iter().position(|&b| b == 0).unwrap_or(ansi.len());
        let target_ansi = decode_ansi(&ansi[..ansi_len]);

        let target_unicode = match payload.get(TARGET_ANSI_LEN..TARGET_ANSI_LEN + TARGET_UNICODE_LEN) {
            Some(wide) => {
                let units = wide
                    .chunks_exact(2)
                    .position(|pair| pair == [0, 0])
                    .unwrap_or(wide.len() / 2);
                utf16le_to_string(&wide[..units * 2])
            }
            None => String::new(),
        };

        Ok((target_ansi, target_unicode))
    }

    fn encode_payload(&self) -> Result<Vec<u8>> {
        if let Some(raw) = &self.raw {
            let (ansi, unicode) = Self::decode_targets(raw)?;
            if ansi == self.target_ansi && unicode == self.target_unicode {
                return Ok(raw.clone());
            }
        }

        let ansi = encode_ansi(&self.target_ansi);
        let wide = string_to_utf16le(&self.target_unicode);
        if ansi.len() >= TARGET_ANSI_LEN || wide.len() >= TARGET_UNICODE_LEN {
            return Err(Error::PathTooLong {
                field: "icon environment path",
                length: ansi.len().max(wide.len() / 2),
            });
        }

        let mut payload = vec![0u8; TARGET_ANSI_LEN + TARGET_UNICODE_LEN];
        payload[..ansi.len()].copy_from_slice(&ansi);
        payload[TARGET_ANSI_LEN..TARGET_ANSI_LEN + wide.len()].copy_from_slice(&wide);
        Ok(payload)
    }
}

/// One block of the extra-data chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraDataBlock {
    IconEnvironment(IconEnvironment),
    /// ConsoleDataBlock payload, kept verbatim
    Console(Vec<u8>),
    /// TrackerDataBlock payload, kept verbatim
    Tracker(Vec<u8>),
    /// Any other signature
    Opaque { signature: u32, payload: Vec<u8> },
}

impl ExtraDataBlock {
    pub fn signature(&self) -> u32 {
        match self {
            ExtraDataBlock::IconEnvironment(_) => ICON_ENVIRONMENT_PROPS,
            ExtraDataBlock::Console(_) => CONSOLE_PROPS,
            ExtraDataBlock::Tracker(_) => TRACKER_PROPS,
            ExtraDataBlock::Opaque { signature, .. } => *signature,
        }
    }

    pub fn name(&self) -> &'static str {
        signature_name(self.signature())
    }

    fn from_payload(signature: u32, payload: &[u8]) -> Result<Self> {
        Ok(match signature {
            ICON_ENVIRONMENT_PROPS => ExtraDataBlock::IconEnvironment(IconEnvironment::decode(payload)?),
            CONSOLE_PROPS => ExtraDataBlock::Console(payload.to_vec()),
            TRACKER_PROPS => ExtraDataBlock::Tracker(payload.to_vec()),
            signature => ExtraDataBlock::Opaque {
                signature,
                payload: payload.to_vec(),
            },
        })
    }

    fn payload(&self) -> Result<Vec<u8>> {
        match self {
            ExtraDataBlock::IconEnvironment(icon) => icon.encode_payload(),
            ExtraDataBlock::Console(payload)
            | ExtraDataBlock::Tracker(payload)
            | ExtraDataBlock::Opaque { payload, .. } => Ok(payload.clone()),
        }
    }
}

/// Decode blocks up to and including the zero-size terminal block
pub fn decode_chain(reader: &mut ByteReader<'_>) -> Result<Vec<ExtraDataBlock>> {
    let mut blocks = Vec::new();

    loop {
        if reader.remaining() == 0 {
            log::warn!("extra data ends at offset {} without a terminal block", reader.position());
            break;
        }

        let offset = reader.position();
        let size = reader.read_u32()?;
        if size == 0 {
            break;
        }
        if size < BLOCK_HEADER_LEN {
            return Err(Error::MalformedExtraData(format!(
                "block at offset {} declares size {}",
                offset, size
            )));
        }
        if (size - 4) as usize > reader.remaining() {
            return Err(Error::MalformedExtraData(format!(
                "block at offset {} of {} bytes runs past end of data ({} left)",
                offset,
                size,
                reader.remaining() + 4
            )));
        }

        let signature = reader.read_u32()?;
        let payload = reader.read_bytes((size - BLOCK_HEADER_LEN) as usize)?;
        log::debug!(
            "extra data block {} (0x{:08X}), {} bytes at offset {}",
            signature_name(signature),
            signature,
            size,
            offset
        );
        blocks.push(ExtraDataBlock::from_payload(signature, payload)?);
    }

    if reader.remaining() > 0 {
        log::debug!("ignoring {} bytes after the extra data chain", reader.remaining());
    }

    Ok(blocks)
}

/// Encode `blocks` in order followed by the terminal block
pub fn encode_chain(blocks: &[ExtraDataBlock], writer: &mut ByteWriter) -> Result<()> {
    for block in blocks {
        let payload = block.payload()?;
        let size = u32::try_from(payload.len() + BLOCK_HEADER_LEN as usize).map_err(|_| Error::PathTooLong {
            field: "extra data block",
            length: payload.len(),
        })?;
        writer.write_u32(size)?;
        writer.write_u32(block.signature())?;
        writer.write_bytes(&payload)?;
    }
    writer.write_u32(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(blocks: &[ExtraDataBlock]) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        encode_chain(blocks, &mut writer).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_icon_environment_block_layout() {
        let icon = IconEnvironment::new("%SystemRoot%\\system32\\SHELL32.dll").unwrap();
        let bytes = encode(&[ExtraDataBlock::IconEnvironment(icon.clone())]);

        assert_eq!(bytes.len(), 0x314 + 4);
        assert_eq!(&bytes[0..4], &ICON_ENVIRONMENT_BLOCK_SIZE.to_le_bytes());
        assert_eq!(&bytes[4..8], &[0x07, 0x00, 0x00, 0xA0]);
        assert_eq!(&bytes[8..20], b"%SystemRoot%");
        assert_eq!(&bytes[8 + 260..8 + 264], &[b'%', 0, b'S', 0]);
        assert_eq!(&bytes[0x314..], &[0, 0, 0, 0]);

        let blocks = decode_chain(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(blocks, vec![ExtraDataBlock::IconEnvironment(icon)]);
    }

    #[test]
    fn test_unknown_blocks_preserved_in_order() {
        let blocks = vec![
            ExtraDataBlock::Tracker(vec![0x58, 0, 0, 0, 1, 2, 3, 4]),
            ExtraDataBlock::Opaque {
                signature: 0xA000_0009,
                payload: vec![9; 13],
            },
            ExtraDataBlock::Opaque {
                signature: 0x1234_5678,
                payload: Vec::new(),
            },
            ExtraDataBlock::Console(vec![7; 4]),
        ];
        let bytes = encode(&blocks);
        let decoded = decode_chain(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(decoded, blocks);
        assert_eq!(encode(&decoded), bytes);
        assert_eq!(decoded[1].name(), "PropertyStoreDataBlock");
        assert_eq!(decoded[2].name(), "Unknown");
    }

    #[test]
    fn test_malformed_sizes() {
        let too_small = [4u8, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode_chain(&mut ByteReader::new(&too_small)),
            Err(Error::MalformedExtraData(_))
        ));

        let mut past_end = Vec::new();
        past_end.extend(0x40u32.to_le_bytes());
        past_end.extend(TRACKER_PROPS.to_le_bytes());
        past_end.extend([0u8; 8]);
        assert!(matches!(
            decode_chain(&mut ByteReader::new(&past_end)),
            Err(Error::MalformedExtraData(_))
        ));
    }

    #[test]
    fn test_missing_terminal_block_tolerated() {
        let mut bytes = encode(&[ExtraDataBlock::Console(vec![1, 2])]);
        bytes.truncate(bytes.len() - 4);
        let blocks = decode_chain(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_env_var_detection() {
        assert!(contains_env_var("%SystemRoot%\\system32\\SHELL32.dll"));
        assert!(contains_env_var("C:\\%USERPROFILE%\\icon.ico"));
        assert!(!contains_env_var("C:\\Program Files (x86)\\PDFCreator\\PDFCreator.exe"));
        assert!(!contains_env_var("C:\\100% done\\a.ico"));
    }

    #[test]
    fn test_icon_path_too_long() {
        let long = format!("%TEMP%\\{}", "a".repeat(300));
        assert!(matches!(IconEnvironment::new(&long), Err(Error::PathTooLong { .. })));
    }

    #[test]
    fn test_icon_block_payload_kept_until_edited() {
        // Oversized block with stale bytes after both terminators
        let mut payload = vec![0u8; TARGET_ANSI_LEN + TARGET_UNICODE_LEN + 4];
        payload[..5].copy_from_slice(b"%A%\\x");
        payload[10] = 0xCC;
        for (i, unit) in "%A%\\x".encode_utf16().enumerate() {
            payload[TARGET_ANSI_LEN + i * 2] = unit as u8;
        }
        payload[TARGET_ANSI_LEN + 100] = 0xDD;
        payload[TARGET_ANSI_LEN + TARGET_UNICODE_LEN + 2] = 0xEE;

        let mut bytes = Vec::new();
        bytes.extend((payload.len() as u32 + BLOCK_HEADER_LEN).to_le_bytes());
        bytes.extend(ICON_ENVIRONMENT_PROPS.to_le_bytes());
        bytes.extend(&payload);
        bytes.extend(0u32.to_le_bytes());

        let mut blocks = decode_chain(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(encode(&blocks), bytes);

        match &mut blocks[0] {
            ExtraDataBlock::IconEnvironment(icon) => {
                assert_eq!(icon.target(), "%A%\\x");
                icon.target_unicode = "%B%\\y".to_string();
                icon.target_ansi = "%B%\\y".to_string();
            }
            other => panic!("unexpected block {:?}", other),
        }
        let edited = encode(&blocks);
        assert_eq!(edited.len(), ICON_ENVIRONMENT_BLOCK_SIZE as usize + 4);
        assert_eq!(&edited[8..13], b"%B%\\y");
        assert_eq!(edited[8 + 10], 0);
    }

    #[test]
    fn test_ansi_only_icon_block() {
        let mut payload = vec![0u8; 260];
        payload[..6].copy_from_slice(b"%WIN%\\");
        let block = ExtraDataBlock::from_payload(ICON_ENVIRONMENT_PROPS, &payload).unwrap();
        match block {
            ExtraDataBlock::IconEnvironment(icon) => {
                assert_eq!(icon.target(), "%WIN%\\");
                assert!(icon.target_unicode.is_empty());
            }
            other => panic!("unexpected block {:?}", other),
        }
    }
}
