//! Main entry point for the lnk CLI application.

use clap::Parser;
use lnk::{app::App, cli::Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = lnk::cli::Config::from_args(args)?;
    let app = App::new(config);
    app.run()
}
