//! Main application logic and orchestration.

use crate::{
    cli::Config,
    output::{create_writer, OutputWriter},
    shell_link::{create_link, get_link_command, read_link, update_link},
};
use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Main application runner
pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the configured operation
    pub fn run(self) -> anyhow::Result<()> {
        match self.config {
            Config::Info {
                input_file,
                format,
                output,
                timezone,
            } => {
                let link = read_link(&input_file).with_context(|| format!("Failed to read shortcut '{}'", input_file))?;
                let writer = create_writer(output).context("Failed to open output")?;
                OutputWriter::write_link(&link, format, writer, timezone).context("Failed to write output")?;
            }
            Config::Command { input_file } => {
                let command = get_link_command(&input_file)
                    .with_context(|| format!("Failed to read shortcut '{}'", input_file))?;
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", command)?;
            }
            Config::Create {
                output_file,
                info,
                overwrite,
            } => {
                if !overwrite && Path::new(&output_file).exists() {
                    log::info!("updating existing shortcut {}", output_file);
                    update_link(&output_file, &info)
                        .with_context(|| format!("Failed to update shortcut '{}'", output_file))?;
                } else {
                    create_link(&output_file, &info)
                        .with_context(|| format!("Failed to create shortcut '{}'", output_file))?;
                }
                eprintln!("Wrote {}", output_file);
            }
        }
        Ok(())
    }
}
