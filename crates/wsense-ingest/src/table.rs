//! Column-mapped amplitude table decoder.
//!
//! Parses delimited text captures whose header names carry the matrix
//! coordinates: a cell `amp_tx{T}_rx{R}_sub{S}` maps its column to matrix
//! position `(S, R)` when `T` is the target transmit chain. Each data row
//! becomes one real-valued frame.

use std::path::Path;
use std::sync::OnceLock;

use ndarray::Array2;
use num_complex::Complex;
use regex::Regex;
use tracing::warn;

use wsense_core::{Capture, Error, Frame, Result};

fn column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^amp_tx(\d+)_rx(\d+)_sub(\d+)").unwrap())
}

/// Decoder for amplitude-table text captures.
#[derive(Debug, Clone, Copy)]
pub struct AmplitudeTableDecoder {
    /// Only columns of this transmit chain are mapped
    pub target_tx: usize,
}

impl Default for AmplitudeTableDecoder {
    fn default() -> Self {
        Self { target_tx: 0 }
    }
}

impl AmplitudeTableDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one capture file.
    ///
    /// A missing `timestamp` column is fatal for the file; a row with a
    /// non-numeric value in a mapped or timestamp cell is skipped with a
    /// warning.
    pub fn decode(&self, path: &Path) -> Result<Capture> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        // column index -> (sub, rx)
        let mut col_mapping: Vec<(usize, usize, usize)> = Vec::new();
        let mut timestamp_idx: Option<usize> = None;
        let mut max_sub = 0usize;
        let mut max_rx = 0usize;

        for (idx, cell) in reader.headers()?.iter().enumerate() {
            let cell = cell.trim();
            if cell == "timestamp" {
                timestamp_idx = Some(idx);
                continue;
            }
            if let Some(caps) = column_pattern().captures(cell) {
                let tx: usize = caps[1].parse().unwrap_or(usize::MAX);
                if tx != self.target_tx {
                    continue;
                }
                let rx: usize = caps[2].parse().unwrap_or(usize::MAX);
                let sub: usize = caps[3].parse().unwrap_or(usize::MAX);
                if rx == usize::MAX || sub == usize::MAX {
                    continue;
                }
                max_sub = max_sub.max(sub);
                max_rx = max_rx.max(rx);
                col_mapping.push((idx, sub, rx));
            }
        }

        let timestamp_idx = timestamp_idx.ok_or_else(|| Error::MissingColumn {
            source_name: file_name.clone(),
            column: "timestamp".to_string(),
        })?;
        if col_mapping.is_empty() {
            return Err(Error::Format {
                source_name: file_name,
                reason: format!("no amplitude column for tx{}", self.target_tx),
            });
        }

        let num_sub = max_sub + 1;
        let num_rx = max_rx + 1;
        let mut capture = Capture::new(file_name.clone());

        for (row_idx, record) in reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!(file = %file_name, row = row_idx + 2, error = %e, "unreadable row skipped");
                    continue;
                }
            };
            if record.is_empty() {
                continue;
            }

            match parse_row(&record, timestamp_idx, &col_mapping, num_sub, num_rx) {
                Some(frame) => {
                    capture.add_frame(frame);
                }
                None => {
                    warn!(file = %file_name, row = row_idx + 2, "non-numeric cell, row skipped");
                }
            }
        }

        Ok(capture)
    }
}

fn parse_row(
    record: &csv::StringRecord,
    timestamp_idx: usize,
    col_mapping: &[(usize, usize, usize)],
    num_sub: usize,
    num_rx: usize,
) -> Option<Frame> {
    let timestamp: f64 = record.get(timestamp_idx)?.trim().parse().ok()?;

    let mut matrix = Array2::<Complex<f64>>::zeros((num_sub, num_rx));
    for &(col, sub, rx) in col_mapping {
        let value: f64 = record.get(col)?.trim().parse().ok()?;
        matrix[[sub, rx]] = Complex::new(value, 0.0);
    }

    Some(Frame::new(timestamp, matrix.into_dyn()))
}
