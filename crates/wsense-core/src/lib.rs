//! # WSense-Core
//!
//! Core types and utilities for the WSense WiFi-sensing data pipeline.
//!
//! This crate holds everything the ingestion and conditioning stages share:
//! the CSI frame/capture/sample structures, the pipeline error type, and the
//! data-driven dataset registry (decoder selection, filename grammar,
//! training hyperparameters).

pub mod dataset;
pub mod error;
pub mod frame;

pub use dataset::{DatasetRecord, DatasetRegistry, DatasetSpec, DecoderKind, FilenameRule, Hyperparams};
pub use error::{Error, Result};
pub use frame::{BfeeMeta, Capture, Frame, Sample, SampleSet};
