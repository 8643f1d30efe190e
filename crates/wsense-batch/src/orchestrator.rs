//! The two-stage batch orchestrator.

use std::path::{Path, PathBuf};

use ndarray::{concatenate, Axis, Ix3};
use rayon::prelude::*;
use tracing::{info, warn};

use wsense_core::{Capture, DatasetRegistry, Error, Result, Sample, SampleSet};
use wsense_dsp::{calibrate_phase, resize_tensor, WaveletDenoiser};
use wsense_ingest::FrameDecoder;

/// Files whose name contains this substring carry ground-truth annotations,
/// not channel data, and are excluded from discovery.
const GROUND_TRUTH_MARKER: &str = "truth";

/// Worker bounds for the two stages.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub decode_workers: usize,
    pub transform_workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(32);
        Self {
            decode_workers: workers,
            transform_workers: workers,
        }
    }
}

/// Drives discovery, decode, label resolution, transform and aggregation.
pub struct BatchOrchestrator<'a> {
    registry: &'a DatasetRegistry,
    config: BatchConfig,
    denoiser: WaveletDenoiser,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(registry: &'a DatasetRegistry) -> Self {
        Self::with_config(registry, BatchConfig::default())
    }

    pub fn with_config(registry: &'a DatasetRegistry, config: BatchConfig) -> Self {
        Self {
            registry,
            config,
            denoiser: WaveletDenoiser::new(),
        }
    }

    /// Run the full pipeline over `root` for the named dataset.
    ///
    /// Output order carries no meaning; every sample is independently
    /// labeled. Individual file and capture losses are logged, never fatal.
    pub fn run(&self, root: &Path, dataset: &str) -> Result<SampleSet> {
        // Both fatal conditions fire before any task is submitted.
        let spec = self.registry.get(dataset)?;
        let decoder = FrameDecoder::for_dataset(spec)?;
        let files = discover_files(root)?;

        info!(dataset, files = files.len(), "decode stage starting");

        // Decode fan-out: one task per file, per-task Result, fan-in filters
        // the failures.
        let decode_pool = build_pool(self.config.decode_workers)?;
        let decoded: Vec<(PathBuf, Result<Vec<Capture>>)> = decode_pool.install(|| {
            files
                .par_iter()
                .map(|path| (path.clone(), decoder.decode(path)))
                .collect()
        });

        let mut captures = Vec::new();
        for (path, result) in decoded {
            match result {
                Ok(list) => {
                    info!(file = %path.display(), captures = list.len(), "processed");
                    captures.extend(list);
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "unable to process file");
                }
            }
        }

        // Label/group resolution through the dataset's filename grammar.
        let mut labeled = Vec::with_capacity(captures.len());
        for capture in captures {
            match spec.filename.resolve(&capture.source) {
                Some((label, group)) => labeled.push((capture, label, group)),
                None => {
                    warn!(file = %capture.source, "filename does not match the dataset grammar, capture dropped");
                }
            }
        }

        info!(captures = labeled.len(), "transform stage starting");

        let transform_pool = build_pool(self.config.transform_workers)?;
        let transformed: Vec<Option<Sample>> = transform_pool.install(|| {
            labeled
                .into_par_iter()
                .map(|(capture, label, group)| self.transform_capture(capture, label, group))
                .collect()
        });

        let mut set = SampleSet::new();
        for sample in transformed.into_iter().flatten() {
            set.push(sample);
        }

        info!(samples = set.len(), "batch complete");
        Ok(set)
    }

    /// [`run`](Self::run), then normalize every tensor to the dataset's
    /// fixed padding length before handoff to training.
    pub fn run_normalized(&self, root: &Path, dataset: &str) -> Result<SampleSet> {
        let target = self.registry.get(dataset)?.hyper.padding_length;
        let mut set = self.run(root, dataset)?;

        for sample in &mut set.samples {
            sample.tensor = resize_tensor(&sample.tensor, target, num_complex::Complex::new(0.0, 0.0));
        }
        Ok(set)
    }

    /// One transform task: sort, stack, squeeze, calibrate, denoise.
    /// `None` drops the capture; the reason is logged here.
    fn transform_capture(&self, capture: Capture, label: i64, group: i64) -> Option<Sample> {
        let source = capture.source;
        let mut frames = capture.frames;

        if frames.len() < 2 {
            warn!(file = %source, "only one timestamp, capture dropped");
            return None;
        }

        frames.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Stack matrices along a new leading time axis.
        let views: Vec<_> = frames
            .iter()
            .map(|f| f.matrix.view().insert_axis(Axis(0)))
            .collect();
        let mut stacked = match concatenate(Axis(0), &views) {
            Ok(s) => s,
            Err(e) => {
                warn!(file = %source, error = %e, "frame stacking failed, capture dropped");
                return None;
            }
        };

        // Collapse size-1 axes (e.g. a single transmit chain) so the tensor
        // is exactly [time, frequency, antenna].
        for ax in (1..stacked.ndim()).rev() {
            if stacked.shape()[ax] == 1 {
                stacked = stacked.index_axis_move(Axis(ax), 0);
            }
        }

        let tensor = match stacked.into_dimensionality::<Ix3>() {
            Ok(t) => t,
            Err(_) => {
                warn!(file = %source, "tensor is not 3-axis after stacking, capture dropped");
                return None;
            }
        };

        let calibrated = calibrate_phase(&tensor);
        let cleaned = self.denoiser.denoise(&calibrated);

        Some(Sample::new(cleaned, label, group))
    }
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| Error::Config(format!("worker pool: {e}")))
}

/// Recursively enumerate regular files under `root`, excluding ground-truth
/// annotation files. An empty result is fatal: there is no work to do.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    visit(root, &mut files)?;

    if files.is_empty() {
        return Err(Error::EmptyInput(root.display().to_string()));
    }
    Ok(files)
}

fn visit(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            visit(&path, files)?;
        } else if file_type.is_file() {
            let name = entry.file_name();
            if name.to_string_lossy().contains(GROUND_TRUTH_MARKER) {
                continue;
            }
            files.push(path);
        }
    }
    Ok(())
}
