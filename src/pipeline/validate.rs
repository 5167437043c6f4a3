// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;

/// Validate configuration and report the effective settings.
pub fn run_validate(config: &Config) -> Result<()> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!("✓ Config OK");
    log::info!("    Roster base: {}", config.roster.base_url);
    log::info!("    Default term: {}", config.roster.default_term);
    log::info!("    Link base: {}", config.roster.link_base);
    log::info!(
        "    Cache: {:?} every {}s",
        config.cache.policy,
        config.cache.period_secs
    );
    log::info!(
        "    Rename collisions: {:?}",
        config.normalize.rename_collisions
    );
    Ok(())
}
