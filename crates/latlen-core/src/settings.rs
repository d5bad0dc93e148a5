//! Run configuration loaded from TOML.
//!
//! - `parse_settings_toml(toml)` parses and validates a settings file; every
//!   key is optional and falls back to [`Settings::default`]
//! - `default_toml()` returns the embedded `default_settings.toml`
//!
//! Settings are plain values handed to each pipeline call; there is no
//! process-wide instance.

use serde::Deserialize;

use crate::preprocess::LatticeScale;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scale: ScaleSettings,
    pub penalty: PenaltySettings,
    pub distribution: DistributionSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleSettings {
    pub acoustic: f32,
    pub graph: f32,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            acoustic: 1.0,
            graph: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenaltySettings {
    pub insertion: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionSettings {
    /// `None` means no limit.
    pub nbest: Option<i64>,
}

impl Settings {
    pub fn lattice_scale(&self) -> LatticeScale {
        LatticeScale {
            graph: self.scale.graph,
            acoustic: self.scale.acoustic,
        }
    }

    /// Number of lengths to extract: unlimited maps to `usize::MAX`,
    /// non-positive values to zero.
    pub fn nbest_limit(&self) -> usize {
        match self.distribution.nbest {
            None => usize::MAX,
            Some(n) if n <= 0 => 0,
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

/// Reject values that would poison every cost downstream.
pub fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_finite {
        ($section:ident . $field:ident) => {
            if !s.$section.$field.is_finite() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be a finite number".to_string(),
                });
            }
        };
    }

    check_finite!(scale.acoustic);
    check_finite!(scale.graph);
    check_finite!(penalty.insertion);

    Ok(())
}
