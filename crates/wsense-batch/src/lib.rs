//! # WSense-Batch
//!
//! Batch orchestration: a directory of heterogeneous capture files in, a
//! labeled and grouped sample set out.
//!
//! Two bounded-parallelism stages run in sequence: decode fan-out over
//! files, then transform fan-out over decoded captures. Tasks are fully
//! independent; a failing file or capture is logged and dropped without
//! touching its siblings. The only fatal conditions (unknown dataset, empty
//! input directory) are raised before any task is submitted.

pub mod orchestrator;

pub use orchestrator::{BatchConfig, BatchOrchestrator};
