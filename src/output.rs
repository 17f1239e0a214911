//! Output formatting for decoded shortcuts.

use crate::datetime::{filetime_to_datetime, format_filetime};
use crate::error::Result;
use crate::extra_data::ExtraDataBlock;
use crate::link_info::{network_provider_name, DriveType};
use crate::shell_link::ShellLink;
use crate::types::LinkInfo;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::io::{BufWriter, Write};

/// Supported output formats
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with detailed information
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Serializable view of a shortcut: public fields plus header metadata
#[derive(Debug, Serialize)]
pub struct LinkReport {
    #[serde(flatten)]
    pub info: LinkInfo,
    pub created: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub file_size: u32,
    pub file_attributes: u32,
    pub drive_type: Option<DriveType>,
    pub volume_label: Option<String>,
    pub id_list_items: usize,
    pub extra_data_blocks: Vec<&'static str>,
}

impl LinkReport {
    pub fn new(link: &ShellLink) -> Self {
        let volume = link.link_info.as_ref().and_then(|info| info.volume_id.as_ref());
        Self {
            info: link.to_info(),
            created: filetime_to_datetime(link.header.creation_time),
            accessed: filetime_to_datetime(link.header.access_time),
            modified: filetime_to_datetime(link.header.write_time),
            file_size: link.header.file_size,
            file_attributes: link.header.file_attributes,
            drive_type: volume.map(|v| v.drive_type),
            volume_label: volume.map(|v| v.label.clone()),
            id_list_items: link.id_list.as_ref().map_or(0, |list| list.items().len()),
            extra_data_blocks: link.extra_data.iter().map(ExtraDataBlock::name).collect(),
        }
    }
}

/// Handles output formatting and writing
pub struct OutputWriter;

impl OutputWriter {
    /// Write one shortcut in the specified format
    pub fn write_link(link: &ShellLink, format: OutputFormat, writer: Box<dyn Write>, timezone: Tz) -> Result<()> {
        match format {
            OutputFormat::Human => Self::write_human(link, writer, timezone),
            OutputFormat::Json => Self::write_json(link, writer),
            OutputFormat::Csv => Self::write_csv(link, writer),
        }
    }

    fn write_human(link: &ShellLink, writer: Box<dyn Write>, timezone: Tz) -> Result<()> {
        let mut out = BufWriter::new(writer);
        let info = link.to_info();
        let header = &link.header;

        writeln!(out, "Target:            {}", info.target)?;
        if !info.network_path.is_empty() {
            writeln!(out, "Network path:      {}", info.network_path)?;
        }
        writeln!(out, "Arguments:         {}", info.arguments)?;
        writeln!(out, "Description:       {}", info.description)?;
        writeln!(out, "Working directory: {}", info.working_directory)?;
        writeln!(out, "Icon:              {},{}", info.custom_icon.filename, info.custom_icon.index)?;
        writeln!(out, "Hotkey:            {}", info.hot_key)?;
        writeln!(out, "Show command:      {:?}", info.show_command)?;
        writeln!(out)?;

        writeln!(out, "Created:           {}", format_filetime(header.creation_time, timezone))?;
        writeln!(out, "Accessed:          {}", format_filetime(header.access_time, timezone))?;
        writeln!(out, "Modified:          {}", format_filetime(header.write_time, timezone))?;
        writeln!(out, "Target size:       {}", header.file_size)?;
        writeln!(out, "Attributes:        {:?}", header.attributes())?;
        writeln!(out, "Link flags:        {:?}", header.link_flags)?;

        if let Some(link_info) = &link.link_info {
            if let Some(volume) = &link_info.volume_id {
                writeln!(
                    out,
                    "Volume:            {:?}, serial {:08X}, label \"{}\"",
                    volume.drive_type, volume.serial_number, volume.label
                )?;
            }
            if let Some(network) = &link_info.network_link {
                let provider = network
                    .provider_type
                    .map(|p| network_provider_name(p).map_or_else(|| format!("0x{:08X}", p), str::to_string))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    out,
                    "Share:             {} (device {}, provider {})",
                    network.net_name,
                    network.device_name.as_deref().unwrap_or("-"),
                    provider
                )?;
            }
        }

        if let Some(id_list) = &link.id_list {
            writeln!(out, "IDList:            {} items, {} bytes", id_list.items().len(), id_list.data.len())?;
        }
        for block in &link.extra_data {
            writeln!(out, "Extra data:        {} (0x{:08X})", block.name(), block.signature())?;
        }

        out.flush()?;
        Ok(())
    }

    fn write_json(link: &ShellLink, writer: Box<dyn Write>) -> Result<()> {
        let mut out = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut out, &LinkReport::new(link))?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    fn write_csv(link: &ShellLink, writer: Box<dyn Write>) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let report = LinkReport::new(link);
        let info = &report.info;

        csv_writer.write_record([
            "target",
            "network_path",
            "arguments",
            "description",
            "working_directory",
            "icon",
            "icon_index",
            "hotkey",
            "created",
            "accessed",
            "modified",
            "file_size",
        ])?;

        let stamp = |dt: &Option<DateTime<Utc>>| dt.map(|d| d.to_rfc3339()).unwrap_or_default();
        csv_writer.write_record([
            info.target.clone(),
            info.network_path.clone(),
            info.arguments.clone(),
            info.description.clone(),
            info.working_directory.clone(),
            info.custom_icon.filename.clone(),
            info.custom_icon.index.to_string(),
            info.hot_key.to_string(),
            stamp(&report.created),
            stamp(&report.accessed),
            stamp(&report.modified),
            report.file_size.to_string(),
        ])?;

        csv_writer.flush()?;
        Ok(())
    }
}

/// Create output writer based on file path or stdout
pub fn create_writer(output_file: Option<String>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if let Some(output_file) = output_file {
        if output_file == "-" {
            Box::new(std::io::stdout())
        } else {
            Box::new(BufWriter::new(std::fs::File::create(output_file)?))
        }
    } else {
        Box::new(std::io::stdout())
    };

    Ok(writer)
}
