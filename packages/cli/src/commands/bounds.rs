use super::world_settings;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use plotworld_grid::{
    anchor, bounding_box, footprint, LevelSettings, LevelSettingsRegistry, MergedPlot, Plot,
    PlotId, SinglePlot,
};
use serde_json::json;

#[derive(Args, Debug)]
pub struct BoundsArgs {
    /// Plot world name
    pub world: String,

    /// Grid X of the anchor cell
    #[arg(allow_negative_numbers = true)]
    pub x: i32,

    /// Grid Z of the anchor cell
    #[arg(allow_negative_numbers = true)]
    pub z: i32,

    /// Cells covered along X
    #[arg(long, default_value = "1")]
    pub x_width: u32,

    /// Cells covered along Z
    #[arg(long, default_value = "1")]
    pub z_width: u32,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub fn bounds(args: BoundsArgs, registry: &LevelSettingsRegistry) -> Result<()> {
    if args.x_width == 0 || args.z_width == 0 {
        bail!("Plot widths must be at least 1");
    }
    let settings = world_settings(registry, &args.world)?;
    let plot = shaped_plot(
        PlotId::new(settings.name.clone(), args.x, args.z),
        args.x_width,
        args.z_width,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bounds_json(&plot, &settings))?);
    } else {
        println!("{}", bounds_text(&plot, &settings));
    }
    Ok(())
}

fn shaped_plot(id: PlotId, x_width: u32, z_width: u32) -> Plot {
    let single = SinglePlot::unclaimed(id);
    if x_width == 1 && z_width == 1 {
        Plot::Single(single)
    } else {
        Plot::Merged(MergedPlot::from_single(single, x_width, z_width))
    }
}

fn bounds_json(plot: &Plot, settings: &LevelSettings) -> serde_json::Value {
    let (x_width, z_width) = plot.widths();
    json!({
        "id": plot.id(),
        "xWidth": x_width,
        "zWidth": z_width,
        "anchor": anchor(plot.id(), settings),
        "footprint": footprint(plot, settings),
        "boundingBox": bounding_box(plot, settings),
    })
}

fn bounds_text(plot: &Plot, settings: &LevelSettings) -> String {
    let (x_width, z_width) = plot.widths();
    let footprint = footprint(plot, settings);
    format!(
        "{} {} ({}x{})\n  anchor:       {}\n  footprint:    {}\n  bounding box: {}\n  area:         {} blocks",
        "Plot".green().bold(),
        plot.id(),
        x_width,
        z_width,
        anchor(plot.id(), settings),
        footprint,
        bounding_box(plot, settings),
        footprint.size_x() * footprint.size_z(),
    )
}
