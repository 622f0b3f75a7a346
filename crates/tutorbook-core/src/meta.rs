//! Tutorial metadata manifests.
//!
//! Every tutorial folder carries a `.meta.yml` (or `.meta.yaml`) describing
//! the tutorial and what it needs to run:
//!
//! ```yaml
//! title: Activation functions
//! author: Phillip Lippe
//! created: 2021-08-27
//! updated: 2021-11-09
//! license: CC BY-SA
//! description: |
//!   In this tutorial, we take a closer look at activation functions.
//! requirements:
//!   - matplotlib
//!   - seaborn
//! accelerator:
//!   - CPU
//!   - GPU
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Accepted manifest file names, in lookup order.
pub const META_FILE_NAMES: [&str; 2] = [".meta.yml", ".meta.yaml"];

/// Hardware a tutorial can be rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Accelerator {
    Cpu,
    Gpu,
}

impl Accelerator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accelerator::Cpu => "CPU",
            Accelerator::Gpu => "GPU",
        }
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Accelerator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CPU" => Ok(Accelerator::Cpu),
            "GPU" => Ok(Accelerator::Gpu),
            other => Err(Error::UnknownAccelerator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Accelerator {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Accelerator> for String {
    fn from(value: Accelerator) -> Self {
        value.as_str().to_string()
    }
}

/// Datasets a tutorial downloads before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRefs {
    /// Plain HTTP(S) downloads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web: Vec<String>,

    /// Kaggle competition names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kaggle: Vec<String>,
}

impl DatasetRefs {
    pub fn is_empty(&self) -> bool {
        self.web.is_empty() && self.kaggle.is_empty()
    }
}

/// A single value or a list of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Manifest as written by authors, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    title: Option<String>,
    author: Option<String>,
    created: Option<String>,
    updated: Option<String>,
    license: Option<String>,
    description: Option<String>,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    accelerator: Vec<Accelerator>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    datasets: DatasetRefs,
    #[serde(rename = "pip__find-link")]
    pip_find_links: Option<OneOrMany>,
    #[serde(default)]
    environment: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

/// Validated tutorial metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorialMeta {
    pub title: String,
    pub author: String,
    pub created: String,
    pub updated: String,
    pub license: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub accelerator: Vec<Accelerator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "DatasetRefs::is_empty")]
    pub datasets: DatasetRefs,
    #[serde(rename = "pip__find-link", skip_serializing_if = "Vec::is_empty")]
    pub pip_find_links: Vec<String>,
    /// Filled in when the tutorial is rendered.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Unknown keys, kept so the published copy loses nothing.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Find the manifest inside a tutorial folder.
pub fn find_meta(dir: &Path) -> Option<PathBuf> {
    META_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

impl TutorialMeta {
    /// Load and validate the manifest inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = find_meta(dir).ok_or_else(|| Error::MetaNotFound(dir.to_path_buf()))?;
        Self::load(&path)
    }

    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse manifest text; `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let raw: RawMeta = serde_yaml::from_str(content).map_err(|e| Error::MetaParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_raw(path, raw)
    }

    fn from_raw(path: &Path, raw: RawMeta) -> Result<Self> {
        let mut missing = Vec::new();
        let mut require = |name: &str, value: Option<String>| -> String {
            match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(name.to_string());
                    String::new()
                }
            }
        };

        let title = require("title", raw.title);
        let author = require("author", raw.author);
        let created = require("created", raw.created);
        let license = require("license", raw.license);
        let description = require("description", raw.description);
        if raw.accelerator.is_empty() {
            missing.push("accelerator".to_string());
        }

        if !missing.is_empty() {
            return Err(Error::MetaMissingFields {
                path: path.to_path_buf(),
                fields: missing,
            });
        }

        let updated = raw
            .updated
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| created.clone());

        for (field, value) in [("created", &created), ("updated", &updated)] {
            parse_date(value).ok_or_else(|| Error::MetaParse {
                path: path.to_path_buf(),
                message: format!("`{field}` is not a date: {value}"),
            })?;
        }

        let mut accelerator = raw.accelerator;
        accelerator.sort();
        accelerator.dedup();

        Ok(Self {
            title,
            author,
            created,
            updated,
            license,
            description,
            requirements: raw.requirements,
            accelerator,
            tags: raw.tags,
            datasets: raw.datasets,
            pip_find_links: raw.pip_find_links.map(Vec::from).unwrap_or_default(),
            environment: raw.environment,
            extra: raw.extra,
        })
    }

    /// Whether the tutorial may be rendered on the given accelerator.
    pub fn supports(&self, accelerator: Accelerator) -> bool {
        self.accelerator.contains(&accelerator)
    }

    /// Arguments for `pip install` covering this tutorial's requirements.
    pub fn pip_arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        for link in &self.pip_find_links {
            args.push("--find-links".to_string());
            args.push(link.clone());
        }
        args.extend(self.requirements.iter().cloned());
        args
    }

    /// Serialize the manifest as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::MetaParse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Write the manifest as YAML, creating parent directories.
    pub fn write_yaml(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

/// Accepts `2021-06-11` and timestamps starting with a date.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
