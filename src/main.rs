mod app;
mod commands;
mod config;
mod db;
mod error;
mod event;
mod logging;
mod offline;
mod session;
mod store;
mod table;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "invtab")]
#[command(about = "An offline-first terminal browser and editor for inventory tables")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/invtab/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Open the interactive table (default)
  Tui,
  /// Write the table as JSON
  Export {
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Replace the table with a JSON document
  Import { file: PathBuf },
  /// List objects and their row counts
  Groups,
  /// Delete local edits and caches, then reload the original data
  Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.log_path()?)?;
  info!("Starting invtab {}", env!("CARGO_PKG_VERSION"));

  let mut session = session::Session::open(&config).await?;
  if let Some(path) = session.backup_path() {
    eprintln!(
      "Stored data had an incompatible format; old rows were saved to {}",
      path.display()
    );
  }

  match args.command.unwrap_or(Cmd::Tui) {
    Cmd::Tui => {
      let mut app = app::App::new(session, config.dataset_url()?);
      app.run().await?;
    }
    Cmd::Export { output } => {
      let json = session.export_json()?;
      match output {
        Some(path) => {
          std::fs::write(&path, json)
            .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
          info!("Exported table to {}", path.display());
        }
        None => {
          let mut stdout = std::io::stdout().lock();
          writeln!(stdout, "{}", json)?;
        }
      }
    }
    Cmd::Import { file } => {
      let rows = session.import_file(&file)?;
      info!(rows, "Imported table from {}", file.display());
      println!("Imported {} rows from {}", rows, file.display());
    }
    Cmd::Groups => {
      let table = session.table();
      for group in table.compute_groups() {
        println!("{}\t{}", group.name, group.count);
      }
    }
    Cmd::Reset => {
      session.reset().await?;
      println!(
        "Reloaded {} rows from the original data",
        session.report().rows
      );
    }
  }

  Ok(())
}
