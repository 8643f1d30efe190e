//! Dataset registry: decoder selection, filename grammar, hyperparameters.
//!
//! Everything dataset-specific is data on a `DatasetSpec` record; adding a
//! dataset is a registry entry, never a code branch. The registry is built
//! once at startup (builtin table or JSON) and passed by reference into the
//! batch orchestrator.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed set of capture-file decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    /// Bit-packed binary BFEE records (Intel 5300 style captures)
    Bfee,

    /// Delimited text table with `amp_tx{T}_rx{R}_sub{S}` columns
    AmplitudeTable,

    /// Single flat float array reshaped to `[groups, sub, rx, time]`
    DenseArray,
}

/// Filename grammar resolving label and group from a capture file name.
///
/// `label_group` / `group_group` are 1-based regex capture indices into
/// `pattern`, applied to the file stem.
#[derive(Debug, Clone)]
pub struct FilenameRule {
    pub pattern: Regex,
    pub label_group: usize,
    pub group_group: usize,
}

impl FilenameRule {
    pub fn new(pattern: &str, label_group: usize, group_group: usize) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            label_group,
            group_group,
        })
    }

    /// Resolve `(label, group)` from a file name, or `None` when the grammar
    /// does not match.
    pub fn resolve(&self, file_name: &str) -> Option<(i64, i64)> {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);

        let caps = self.pattern.captures(stem)?;
        let label = caps.get(self.label_group)?.as_str().parse().ok()?;
        let group = caps.get(self.group_group)?.as_str().parse().ok()?;
        Some((label, group))
    }
}

/// Training hyperparameters exposed to the external training collaborator.
///
/// `padding_length` doubles as the fixed time length of the length
/// normalizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hyperparams {
    pub batch: usize,
    pub lr: f64,
    pub wd: f64,
    pub num_epochs: usize,
    pub padding_length: usize,
}

/// Everything the pipeline needs to know about one dataset.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub decoder: DecoderKind,
    pub filename: FilenameRule,
    pub hyper: Hyperparams,

    /// Reshape target for `DecoderKind::DenseArray`:
    /// `[antenna_groups, subcarriers, receive_antennas, time_steps]`
    pub dense_shape: Option<[usize; 4]>,
}

/// Serialized form of a dataset entry (pattern as text, regex compiled on
/// registration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub decoder: DecoderKind,
    pub pattern: String,
    pub label_group: usize,
    pub group_group: usize,
    #[serde(default)]
    pub dense_shape: Option<[usize; 4]>,
    pub hyper: Hyperparams,
}

/// Dataset-name → spec table.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    specs: HashMap<String, DatasetSpec>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The datasets the pipeline ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        // Patterns and label/group selections mirror the capture naming of
        // the respective public datasets.
        registry
            .register(
                "widar",
                DatasetRecord {
                    decoder: DecoderKind::Bfee,
                    // user-gesture-torso-orientation-serial-receiver
                    pattern: r"^user(\d+)-(\d+)-(\d+)-(\d+)-(\d+)-r(\d+)".into(),
                    label_group: 2,
                    group_group: 3,
                    dense_shape: None,
                    hyper: Hyperparams {
                        batch: 32,
                        lr: 1e-4,
                        wd: 1e-5,
                        num_epochs: 50,
                        padding_length: 1500,
                    },
                },
            )
            .unwrap();

        registry
            .register(
                "gait",
                DatasetRecord {
                    decoder: DecoderKind::Bfee,
                    // user-track-serial-receiver; the walker is the label
                    pattern: r"user(\d+)-(\d+)-(\d+)-r(\d+)".into(),
                    label_group: 1,
                    group_group: 2,
                    dense_shape: None,
                    hyper: Hyperparams {
                        batch: 16,
                        lr: 1e-4,
                        wd: 1e-5,
                        num_epochs: 60,
                        padding_length: 1500,
                    },
                },
            )
            .unwrap();

        registry
            .register(
                "xrf55",
                DatasetRecord {
                    decoder: DecoderKind::DenseArray,
                    // user_action_trial
                    pattern: r"(\d+)_(\d+)_".into(),
                    label_group: 2,
                    group_group: 1,
                    dense_shape: Some([3, 30, 3, 1000]),
                    hyper: Hyperparams {
                        batch: 64,
                        lr: 5e-4,
                        wd: 1e-4,
                        num_epochs: 40,
                        padding_length: 1000,
                    },
                },
            )
            .unwrap();

        registry
            .register(
                "elderal",
                DatasetRecord {
                    decoder: DecoderKind::AmplitudeTable,
                    pattern: r"user(\d+)_position(\d+)_activity(\d+)".into(),
                    label_group: 3,
                    group_group: 2,
                    dense_shape: None,
                    hyper: Hyperparams {
                        batch: 32,
                        lr: 1e-3,
                        wd: 1e-5,
                        num_epochs: 30,
                        padding_length: 1500,
                    },
                },
            )
            .unwrap();

        registry
    }

    /// Register one dataset, compiling its filename pattern.
    pub fn register(&mut self, name: impl Into<String>, record: DatasetRecord) -> Result<()> {
        let name = name.into();
        if record.decoder == DecoderKind::DenseArray && record.dense_shape.is_none() {
            return Err(Error::Config(format!(
                "dataset '{name}' uses the dense-array decoder but declares no dense_shape"
            )));
        }

        let spec = DatasetSpec {
            decoder: record.decoder,
            filename: FilenameRule::new(&record.pattern, record.label_group, record.group_group)?,
            hyper: record.hyper,
            dense_shape: record.dense_shape,
        };
        self.specs.insert(name, spec);
        Ok(())
    }

    /// Build a registry from a JSON name→record map.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: HashMap<String, DatasetRecord> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (name, record) in records {
            registry.register(name, record)?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&DatasetSpec> {
        self.specs
            .get(name)
            .ok_or_else(|| Error::UnknownDataset(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.keys().map(|s| s.as_str()).collect()
    }
}
