//! Configuration file support for Fitplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitplan/config.toml`.
//! Rule rows left empty fall back to the built-in table.

use crate::rules::DEFAULT_FALLBACK;
use crate::{BmiCategory, BmiOnlyRule, BodyFatCategory, Error, ProgramId, ProgramRule, Result, RuleTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub rules: RulesConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Rule table configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RulesConfig {
    #[serde(default = "default_fallback")]
    pub fallback: ProgramId,

    /// Refuse to start when any (BMI, body-fat) pair has no rule
    #[serde(default)]
    pub require_full_coverage: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub full: Vec<ProgramRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bmi_only: Vec<BmiOnlyRule>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            require_full_coverage: false,
            full: Vec::new(),
            bmi_only: Vec::new(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("fitplan")
}

fn default_fallback() -> ProgramId {
    DEFAULT_FALLBACK
}

impl RulesConfig {
    /// Full rule rows in effect (configured, or the built-in rows)
    pub fn effective_full(&self) -> Vec<ProgramRule> {
        if self.full.is_empty() {
            RuleTable::builtin().rules()
        } else {
            self.full.clone()
        }
    }

    /// BMI-only rule rows in effect (configured, or the built-in rows)
    pub fn effective_bmi_only(&self) -> Vec<BmiOnlyRule> {
        if self.bmi_only.is_empty() {
            RuleTable::builtin().bmi_only_rules()
        } else {
            self.bmi_only.clone()
        }
    }

    /// Build the validated rule table
    pub fn build_table(&self) -> Result<RuleTable> {
        RuleTable::new(
            &self.effective_full(),
            &self.effective_bmi_only(),
            self.fallback,
            self.require_full_coverage,
        )
    }

    /// Add or replace the rule for a pair
    pub fn set_rule(&mut self, rule: ProgramRule) {
        let mut rows = self.effective_full();
        rows.retain(|r| !(r.bmi == rule.bmi && r.body_fat == rule.body_fat));
        rows.push(rule);
        self.full = rows;
    }

    /// Remove the rule for a pair, returning whether one existed
    ///
    /// Removing the last rule is refused, since an empty list means
    /// "use the built-in rows".
    pub fn unset_rule(&mut self, bmi: BmiCategory, body_fat: BodyFatCategory) -> Result<bool> {
        let mut rows = self.effective_full();
        let before = rows.len();
        rows.retain(|r| !(r.bmi == bmi && r.body_fat == body_fat));
        if rows.is_empty() {
            return Err(Error::Config(
                "cannot remove the last rule; an empty table means the built-in rules".into(),
            ));
        }
        let removed = rows.len() != before;
        self.full = rows;
        Ok(removed)
    }

    /// Set the BMI-only program for a band
    pub fn set_bmi_only(&mut self, bmi: BmiCategory, program: ProgramId) {
        let mut rows = self.effective_bmi_only();
        rows.retain(|r| r.bmi != bmi);
        rows.push(BmiOnlyRule { bmi, program });
        self.bmi_only = rows;
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if given and present, else from the standard path
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(path),
            Some(path) => {
                tracing::info!("No config file found at {:?}, using defaults", path);
                Ok(Self::default())
            }
            None => Self::load(),
        }
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .ok_or_else(|| Error::Config("cannot determine config directory".into()))?;
        Ok(base.join("fitplan").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    ///
    /// The file is replaced atomically, so a crash leaves either the old or
    /// the new configuration.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        crate::store::write_atomic(parent, path, contents.as_bytes())?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
