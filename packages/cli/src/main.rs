mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{bounds, locate, worlds, BoundsArgs, LocateArgs};
use plotworld_engine::EngineConfig;
use plotworld_grid::LevelSettingsRegistry;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Plotworld CLI - inspect plot grid layouts
#[derive(Parser, Debug)]
#[command(name = "plotworld")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing plotworld.config.json
    #[arg(long, global = true, default_value = ".")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the plot under a world position
    Locate(LocateArgs),

    /// Show the anchor, footprint and bounding box of a plot
    Bounds(BoundsArgs),

    /// List configured plot worlds
    Worlds,
}

fn load_registry(dir: &Path) -> Result<LevelSettingsRegistry> {
    let config = EngineConfig::load(dir)?;
    let registry = LevelSettingsRegistry::new();
    let count = config.register_worlds(&registry)?;
    debug!(dir = %dir.display(), worlds = count, "config loaded");
    Ok(registry)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_registry(&cli.config).and_then(|registry| match cli.command {
        Command::Locate(args) => locate(args, &registry),
        Command::Bounds(args) => bounds(args, &registry),
        Command::Worlds => worlds(&registry),
    });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotworld_engine::DEFAULT_CONFIG_NAME;

    #[test]
    fn test_load_registry_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "worlds": { "plots": { "plotSize": 16 }, "creative": {} } }"#,
        )
        .unwrap();

        let registry = load_registry(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["creative", "plots"]);
        assert_eq!(registry.get("plots").unwrap().plot_size, 16);
    }

    #[test]
    fn test_missing_config_has_no_worlds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_registry(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_world_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "worlds": { "bad": { "roadWidth": 0, "plotSize": 0 } } }"#,
        )
        .unwrap();
        assert!(load_registry(dir.path()).is_err());
    }
}
