use std::path::Path;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::settings::GamificationConfig;

/// Loads and validates the weight configuration of the engine.
pub struct SettingsService;

impl SettingsService {
    /// Reads a YAML or JSON configuration file. Keys that are left out keep
    /// their default values.
    pub fn load(path: &Path) -> AppResult<GamificationConfig> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::config(format!("cannot read {}: {err}", path.display()))
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str::<GamificationConfig>(&raw)?,
            _ => Self::parse_yaml(&raw)?,
        };

        ensure_valid(&config)?;
        info!(
            target: "app::config",
            path = %path.display(),
            trackers = config.trackers.len(),
            "loaded gamification configuration"
        );
        Ok(config)
    }

    /// Uses the file when given, the built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> AppResult<GamificationConfig> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!(target: "app::config", "using default gamification configuration");
                Ok(GamificationConfig::default())
            }
        }
    }

    pub fn parse_yaml(raw: &str) -> AppResult<GamificationConfig> {
        if raw.trim().is_empty() {
            return Ok(GamificationConfig::default());
        }
        let config: GamificationConfig = serde_yaml::from_str(raw)?;
        ensure_valid(&config)?;
        Ok(config)
    }

    pub fn to_yaml(config: &GamificationConfig) -> AppResult<String> {
        Ok(serde_yaml::to_string(config)?)
    }
}

fn ensure_valid(config: &GamificationConfig) -> AppResult<()> {
    let weights = config
        .time
        .named()
        .into_iter()
        .map(|(name, value)| (format!("time.{name}"), value))
        .chain(
            config
                .update
                .named()
                .into_iter()
                .map(|(name, value)| (format!("update.{name}"), value)),
        );

    for (name, value) in weights {
        if !value.is_finite() {
            return Err(AppError::config(format!(
                "weight {name} must be a finite number"
            )));
        }
    }

    if config.trackers.is_empty() {
        return Err(AppError::config(
            "at least one tracker must be included for done ratio scoring",
        ));
    }
    Ok(())
}
