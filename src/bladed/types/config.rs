//! Reader configuration.
//!
//! The defaults match the file conventions of current simulator versions:
//! descriptors named `<run>.%<part>`, data files named `<run>.$<part>`,
//! little-endian elements interleaved one record per sample.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use super::error::{BladedError, Result};

/// Top-level reader configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderConfig {
    /// Marker pairs identifying descriptor and data files after `<run>.`.
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<SuffixRule>,

    /// Byte order of the data files.
    #[serde(default)]
    pub byte_order: ByteOrderKind,

    /// How channels are laid out inside a data file.
    #[serde(default)]
    pub layout: RecordLayout,

    /// Keep decoded channels cached until the next scan.
    #[serde(default = "default_true")]
    pub retain_decoded: bool,
}

/// One descriptor/data naming convention.
///
/// A file named `<run>.<descriptor><part>` is paired with
/// `<run>.<data><part>`. Files whose part id does not match `part` (such as
/// the `$PJ` project copy or the `$ME` message log) are not run parts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuffixRule {
    pub descriptor: String,
    pub data: String,
    /// Regular expression a part id must match.
    #[serde(default = "default_part_pattern")]
    pub part: String,
}

impl SuffixRule {
    /// Creates a rule accepting numeric part ids.
    pub fn new(descriptor: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            data: data.into(),
            part: default_part_pattern(),
        }
    }

    pub fn with_part(mut self, pattern: impl Into<String>) -> Self {
        self.part = pattern.into();
        self
    }

    /// Compiles the part id pattern.
    pub fn part_regex(&self) -> Result<Regex> {
        Regex::new(&self.part).map_err(|e| BladedError::Config {
            message: format!("invalid part pattern '{}': {}", self.part, e),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrderKind {
    #[default]
    Little,
    Big,
}

/// Placement of channel values inside a data file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLayout {
    /// One record per sample (and secondary index) holding a value of every
    /// channel, in declared channel order.
    #[default]
    Interleaved,
    /// All values of the first channel, then all values of the second, etc.
    Sequential,
}

fn default_suffixes() -> Vec<SuffixRule> {
    vec![SuffixRule::new("%", "$")]
}

fn default_part_pattern() -> String {
    r"^\d+$".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
            byte_order: ByteOrderKind::default(),
            layout: RecordLayout::default(),
            retain_decoded: true,
        }
    }
}

impl ReaderConfig {
    /// Parses a configuration from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ReaderConfig = toml::from_str(text).map_err(|e| BladedError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(BladedError::io(path))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.suffixes.is_empty() {
            return Err(BladedError::Config {
                message: "at least one suffix rule is required".to_string(),
            });
        }
        for rule in &self.suffixes {
            if rule.descriptor.is_empty() || rule.data.is_empty() {
                return Err(BladedError::Config {
                    message: "suffix markers must not be empty".to_string(),
                });
            }
            if rule.descriptor == rule.data {
                return Err(BladedError::Config {
                    message: format!(
                        "descriptor and data markers must differ (both '{}')",
                        rule.data
                    ),
                });
            }
            rule.part_regex()?;
        }
        Ok(())
    }
}
