//! LinkTargetIDList section
//!
//! The IDList locates the target in the shell namespace. Its items are not
//! interpreted here: the section is kept as raw bytes so a decoded link can
//! be rewritten without disturbing it.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{Error, Result};

/// Opaque IDList: everything after the u16 IDListSize field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemIdList {
    pub data: Vec<u8>,
}

impl ItemIdList {
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let size = reader.read_u16()? as usize;
        let data = reader.read_bytes(size)?.to_vec();
        log::trace!("IDList of {} bytes", size);
        Ok(Self { data })
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        let size = u16::try_from(self.data.len()).map_err(|_| Error::PathTooLong {
            field: "IDList",
            length: self.data.len(),
        })?;
        writer.write_u16(size)?;
        writer.write_bytes(&self.data)
    }

    /// Raw ItemID payloads in order, stopping at the terminal item or at the
    /// first item whose size does not fit.
    pub fn items(&self) -> Vec<&[u8]> {
        let mut items = Vec::new();
        let mut offset = 0usize;

        while offset + 2 <= self.data.len() {
            let item_size = u16::from_le_bytes([self.data[offset], self.data[offset + 1]]) as usize;
            if item_size == 0 {
                break; // End of IDList
            }
            if item_size < 2 || offset + item_size > self.data.len() {
                log::debug!("IDList item at {} claims {} bytes, stopping", offset, item_size);
                break;
            }
            items.push(&self.data[offset + 2..offset + item_size]);
            offset += item_size;
        }

        items
    }
}
