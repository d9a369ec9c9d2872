//! Show (and optionally persist) the effective configuration.

use overblur_common::config::AppConfig;

pub fn run(config: &AppConfig, save: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save()?;
        eprintln!("Saved to {}", AppConfig::path().display());
    }
    Ok(())
}
