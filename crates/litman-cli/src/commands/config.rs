//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use litman_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "categories": config.categories,
                    "keep_original": config.keep_original,
                    "archive_removed": config.archive_removed,
                    "use_cache": config.use_cache,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            let categories = if config.categories.is_empty() {
                "(any)".to_string()
            } else {
                config.categories.join(", ")
            };
            println!("Configuration:");
            println!("  data_dir:        {}", config.data_dir.display());
            println!("  categories:      {}", categories);
            println!("  keep_original:   {}", config.keep_original);
            println!("  archive_removed: {}", config.archive_removed);
            println!("  use_cache:       {}", config.use_cache);
            println!(
                "  log_file:        {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "categories" => {
            config.categories = value
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "keep_original" => {
            config.keep_original = value
                .parse()
                .context("Invalid value for keep_original. Use 'true' or 'false'.")?;
        }
        "archive_removed" => {
            config.archive_removed = value
                .parse()
                .context("Invalid value for archive_removed. Use 'true' or 'false'.")?;
        }
        "use_cache" => {
            config.use_cache = value
                .parse()
                .context("Invalid value for use_cache. Use 'true' or 'false'.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, categories, keep_original, archive_removed, use_cache, log_file",
                key
            );
        }
    }
    Ok(())
}
