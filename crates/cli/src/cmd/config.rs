//! Configuration command
//!
//! Shows where the config file lives, or prints an example one.

use crate::settings;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Show the config file path
pub fn run_path() -> Result<()> {
    let config_path = settings::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", config_path.display());
    if !config_path.exists() {
        println!(
            "{}",
            "File does not exist. Use 'treewatch config --example' for a starting point.".yellow()
        );
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    print!("{}", settings::example_config());
    Ok(())
}
