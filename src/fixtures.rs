//! Handmade shell link images for tests.
//!
//! These are assembled byte by byte rather than through the encoder so the
//! decoder is checked against layouts it did not produce itself.

use crate::header::LINK_CLSID;

pub fn header(flags: u32, icon_index: i32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(76);
    bytes.extend(0x4Cu32.to_le_bytes());
    bytes.extend(LINK_CLSID);
    bytes.extend(flags.to_le_bytes());
    bytes.extend(0x20u32.to_le_bytes()); // FILE_ATTRIBUTE_ARCHIVE
    bytes.extend(0x01D0_5A2B_3C4D_5E6Fu64.to_le_bytes());
    bytes.extend(0x01D0_5A2B_3C4D_5E70u64.to_le_bytes());
    bytes.extend(0x01D0_5A2B_3C4D_5E71u64.to_le_bytes());
    bytes.extend(1234u32.to_le_bytes());
    bytes.extend(icon_index.to_le_bytes());
    bytes.extend(1u32.to_le_bytes()); // SW_SHOWNORMAL
    bytes.extend([0u8; 2]); // no hotkey
    bytes.extend([0u8; 10]);
    bytes
}

fn local_link_info(drive_type: u32, serial: u32, label: &str, path: &str) -> Vec<u8> {
    let volume_size = 0x10 + label.len() as u32 + 1;
    let path_offset = 0x1C + volume_size;
    let suffix_offset = path_offset + path.len() as u32 + 1;
    let size = suffix_offset + 1;

    let mut bytes = Vec::new();
    bytes.extend(size.to_le_bytes());
    bytes.extend(0x1Cu32.to_le_bytes());
    bytes.extend(1u32.to_le_bytes());
    bytes.extend(0x1Cu32.to_le_bytes());
    bytes.extend(path_offset.to_le_bytes());
    bytes.extend(0u32.to_le_bytes());
    bytes.extend(suffix_offset.to_le_bytes());

    bytes.extend(volume_size.to_le_bytes());
    bytes.extend(drive_type.to_le_bytes());
    bytes.extend(serial.to_le_bytes());
    bytes.extend(0x10u32.to_le_bytes());
    bytes.extend(label.as_bytes());
    bytes.push(0);

    bytes.extend(path.as_bytes());
    bytes.push(0);
    bytes.push(0);
    bytes
}

/// LinkInfo for `G:\usbdrive.txt` on a removable volume labelled "USB"
pub fn usbdrive_link_info() -> Vec<u8> {
    local_link_info(2, 0x1234_ABCD, "USB", "G:\\usbdrive.txt")
}

fn unicode_string(value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let mut bytes = (units.len() as u16).to_le_bytes().to_vec();
    for unit in units {
        bytes.extend(unit.to_le_bytes());
    }
    bytes
}

fn ansi_string(value: &str) -> Vec<u8> {
    let mut bytes = (value.len() as u16).to_le_bytes().to_vec();
    bytes.extend(value.as_bytes());
    bytes
}

/// Shortcut to a file on a removable drive as written by Explorer: IDList,
/// LinkInfo, a Unicode working directory and a TrackerDataBlock.
pub fn usbdrive_lnk() -> Vec<u8> {
    // HasLinkTargetIDList | HasLinkInfo | HasWorkingDir | IsUnicode
    let mut bytes = header(0x0000_0093, 0);

    // IDList: My Computer root item, a drive item, terminal
    let id_list: Vec<u8> = vec![
        0x14, 0x00, 0x1F, 0x50, 0xE0, 0x4F, 0xD0, 0x20, 0xEA, 0x3A, 0x69, 0x10, 0xA2, 0xD8, 0x08, 0x00,
        0x2B, 0x30, 0x30, 0x9D, 0x18, 0x00, 0x2F, b'G', b':', b'\\', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0x00, 0x00,
    ];
    bytes.extend((id_list.len() as u16).to_le_bytes());
    bytes.extend(&id_list);

    bytes.extend(usbdrive_link_info());
    bytes.extend(unicode_string("G:\\"));

    bytes.extend(0x60u32.to_le_bytes());
    bytes.extend(0xA000_0003u32.to_le_bytes());
    bytes.extend((0..0x58u32).map(|i| (i * 7) as u8));

    bytes.extend(0u32.to_le_bytes());
    bytes
}

/// Shortcut to `C:\WINDOWS\system.ini` with ANSI strings, no arguments,
/// description or icon, and an empty extra-data chain.
pub fn system_ini_lnk() -> Vec<u8> {
    // HasLinkInfo | HasWorkingDir
    let mut bytes = header(0x0000_0012, 0);
    bytes.extend(local_link_info(3, 0x0C4F_19A2, "", "C:\\WINDOWS\\system.ini"));
    bytes.extend(ansi_string("C:\\WINDOWS"));
    bytes.extend(0u32.to_le_bytes());
    bytes
}

/// Shortcut whose icon comes from an IconEnvironmentDataBlock that disagrees
/// with the plain ICON_LOCATION string.
pub fn icon_environment_lnk() -> Vec<u8> {
    // HasLinkInfo | HasIconLocation | IsUnicode | HasExpIcon
    let mut bytes = header(0x0000_40C2, 5);
    bytes.extend(local_link_info(3, 1, "", "C:\\Program Files\\PDFCreator\\History.txt"));
    bytes.extend(unicode_string("C:\\Windows\\system32\\SHELL32.dll"));

    let icon = "%SystemRoot%\\system32\\SHELL32.dll";
    bytes.extend(0x314u32.to_le_bytes());
    bytes.extend(0xA000_0007u32.to_le_bytes());
    let mut ansi = [0u8; 260];
    ansi[..icon.len()].copy_from_slice(icon.as_bytes());
    bytes.extend(ansi);
    let mut wide = [0u8; 520];
    for (i, unit) in icon.encode_utf16().enumerate() {
        wide[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    bytes.extend(wide);

    bytes.extend(0u32.to_le_bytes());
    bytes
}
