//! Core types for artifact preparation
//!
//! Defines:
//! - Parameter values and the Parameter Set
//! - Preparation configuration
//! - Executable families and synthesis results

use crate::error::{ConfigError, PrepError, PrepResult};
use indexmap::IndexMap;
use optfile_artifact::ContentHash;
use optfile_template::{ParameterLookup, DEFAULT_MAX_TEMPLATE_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// A single run parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer value
    Int(i64),
    /// Decimal value
    Float(f64),
    /// Boolean switch
    Bool(bool),
    /// Free text
    Text(String),
    /// Ordered list of names
    List(Vec<String>),
}

impl ParamValue {
    /// Value as it appears in a rendered line; lists are space-joined
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Text(v) => v.clone(),
            Self::List(items) => items.join(" "),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Run parameters for one job step, in insertion order
///
/// Read-only to the synthesizers. Keys are listed in [`crate::keys`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(IndexMap<String, ParamValue>);

impl ParameterSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ParameterSet::insert`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a parameter, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Is `key` supplied at all?
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Rendered value, when supplied and not empty
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(ParamValue::render)
            .filter(|value| !value.trim().is_empty())
    }

    /// Integer value; text is parsed
    #[must_use]
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Text(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    /// List value; a non-empty scalar is a one-item list
    #[must_use]
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(ParamValue::List(items)) => items.clone(),
            Some(_) => self.text(key).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Switch value: supplied and not empty, `0` or `false`
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.is_truthy(key)
    }

    /// Rendered value of a mandatory parameter
    ///
    /// # Errors
    /// Returns [`PrepError::FieldMissing`] naming `key` when it is absent
    /// or empty
    pub fn require_text(&self, key: &str) -> PrepResult<String> {
        self.text(key).ok_or_else(|| PrepError::field_missing(key))
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the set empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON object of parameters
    ///
    /// # Errors
    /// Returns the decoder error when `json` is not an object of integers,
    /// decimals, booleans, strings or string lists
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ParameterLookup for ParameterSet {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).map(ParamValue::render)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Site configuration for the synthesizers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Event interval written to LCSIM event marker drivers
    pub lcsim_print_every_event: u32,
    /// Existing LCSIM event intervals below this are replaced
    pub event_interval_floor: u32,
    /// Marker text for a synthesized LCSIM event marker
    pub lcsim_marker: String,
    /// Name of the generated Mokka mac file
    pub mokka_mac_name: String,
    /// Separator joining overlay files in node text
    pub overlay_separator: String,
    /// Largest template accepted, in bytes
    pub max_template_size: usize,
    /// Installation-provided steering directory searched for mac files
    pub steering_dir: Option<PathBuf>,
}

impl PrepConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With LCSIM print interval
    #[inline]
    #[must_use]
    pub fn with_print_every_event(mut self, interval: u32) -> Self {
        self.lcsim_print_every_event = interval;
        self
    }

    /// With LCSIM event interval floor
    #[inline]
    #[must_use]
    pub fn with_event_interval_floor(mut self, floor: u32) -> Self {
        self.event_interval_floor = floor;
        self
    }

    /// With LCSIM marker text
    #[must_use]
    pub fn with_lcsim_marker(mut self, marker: impl Into<String>) -> Self {
        self.lcsim_marker = marker.into();
        self
    }

    /// With Mokka mac file name
    #[must_use]
    pub fn with_mokka_mac_name(mut self, name: impl Into<String>) -> Self {
        self.mokka_mac_name = name.into();
        self
    }

    /// With overlay separator
    #[must_use]
    pub fn with_overlay_separator(mut self, separator: impl Into<String>) -> Self {
        self.overlay_separator = separator.into();
        self
    }

    /// With template size limit
    #[inline]
    #[must_use]
    pub fn with_max_template_size(mut self, max: usize) -> Self {
        self.max_template_size = max;
        self
    }

    /// With steering directory
    #[must_use]
    pub fn with_steering_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.steering_dir = Some(dir.into());
        self
    }

    /// Parse TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] on malformed content
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load TOML from `path`
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            lcsim_print_every_event: 1,
            event_interval_floor: 10,
            lcsim_marker: "LCSIM".to_string(),
            mokka_mac_name: "mokkamac.mac".to_string(),
            overlay_separator: "\n".to_string(),
            max_template_size: DEFAULT_MAX_TEMPLATE_SIZE,
            steering_dir: None,
        }
    }
}

/// Target executable family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Event generator, marker-mode input file
    Whizard,
    /// Event generator, token-mode template
    WhizardTemplate,
    /// Geant4 simulation, steering file
    Mokka,
    /// Geant4 simulation, mac file
    Slic,
    /// Reconstruction, steering XML
    Marlin,
    /// Reconstruction, job XML
    Lcsim,
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Whizard => "whizard",
            Self::WhizardTemplate => "whizard-template",
            Self::Mokka => "mokka",
            Self::Slic => "slic",
            Self::Marlin => "marlin",
            Self::Lcsim => "lcsim",
        };
        f.write_str(name)
    }
}

/// Family-specific facts reported after synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactMetadata {
    /// Generator input
    Whizard {
        /// A `process_id` line carried a non-empty quoted value
        process_id_found: bool,
    },
    /// Mokka steering
    Mokka {
        /// Mac file the steering file points at
        mac_file: PathBuf,
        /// The mac file was written by this call
        generated_mac: bool,
    },
    /// SLIC mac
    Slic {
        /// Generator file bound to the run
        input_file: Option<String>,
        /// Seed written to the mac
        seed: String,
    },
    /// Marlin steering
    Marlin {
        /// Resolved event input files
        inputs: Vec<PathBuf>,
    },
    /// LCSIM job
    Lcsim {
        /// Event marker text in the artifact
        marker: Option<String>,
    },
}

/// A written artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisOutput {
    /// Family that produced it
    pub family: Family,
    /// Path written
    pub output: PathBuf,
    /// Fingerprint of the bytes written
    pub checksum: ContentHash,
    /// Family-specific metadata
    pub metadata: ArtifactMetadata,
}
