//! `slotwise config`: Print the effective configuration.

use std::path::Path;

use slotwise_config::AppConfig;

pub fn show(path: Option<&Path>) -> anyhow::Result<()> {
    let (config, source) = match path {
        Some(path) => (AppConfig::load_from(path)?, path.to_path_buf()),
        None => (
            AppConfig::load()?,
            AppConfig::config_dir().join("config.toml"),
        ),
    };

    println!("# {}", source.display());
    println!("{}", config.to_toml()?);
    Ok(())
}
