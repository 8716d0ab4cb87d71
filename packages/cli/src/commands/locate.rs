use super::world_settings;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use plotworld_grid::{LevelSettings, LevelSettingsRegistry};

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Plot world name
    pub world: String,

    /// World X coordinate
    #[arg(allow_negative_numbers = true)]
    pub x: f64,

    /// World Z coordinate
    #[arg(allow_negative_numbers = true)]
    pub z: f64,
}

pub fn locate(args: LocateArgs, registry: &LevelSettingsRegistry) -> Result<()> {
    let settings = world_settings(registry, &args.world)?;
    println!("{}", describe(args.x, args.z, &settings));
    Ok(())
}

fn describe(x: f64, z: f64, settings: &LevelSettings) -> String {
    match plotworld_grid::locate(x, z, settings) {
        Some(id) => format!("{} {} at ({}, {})", "Plot".green().bold(), id, x, z),
        None => format!("{} at ({}, {})", "Road".yellow().bold(), x, z),
    }
}
