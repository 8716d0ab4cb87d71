use anyhow::Result;
use colored::Colorize;
use plotworld_grid::{LevelSettings, LevelSettingsRegistry};

pub fn worlds(registry: &LevelSettingsRegistry) -> Result<()> {
    let names = registry.names();
    if names.is_empty() {
        println!("{}", "No plot worlds configured".yellow());
        return Ok(());
    }

    for name in names {
        if let Some(settings) = registry.get(&name) {
            println!("{}", summary(&settings));
        }
    }
    Ok(())
}

fn summary(settings: &LevelSettings) -> String {
    format!(
        "{}  plot {}  road {}  ground {}  y {}..{}",
        settings.name.bold(),
        settings.plot_size,
        settings.road_width,
        settings.ground_height,
        settings.min_y,
        settings.max_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_layout() {
        colored::control::set_override(false);
        let settings = LevelSettings::new("creative").with_plot_size(48).with_road_width(5);
        assert_eq!(
            summary(&settings),
            "creative  plot 48  road 5  ground 64  y 0..255"
        );
    }
}
