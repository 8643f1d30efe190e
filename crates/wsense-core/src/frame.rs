//! CSI frame, capture and sample structures.
//!
//! A `Frame` is one timestamped observation of the wireless channel, a
//! `Capture` is the raw decode output of one file, and a `Sample` is the
//! conditioned `[time, frequency, antenna]` tensor handed to training.

use ndarray::{Array3, ArrayD};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Vendor-specific metadata carried by bit-packed binary (BFEE) records.
///
/// Text and dense-array formats do not produce this payload; the common
/// required subset of a frame is only `timestamp` + `matrix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfeeMeta {
    /// Hardware sequence counter
    pub sequence: u16,

    /// Receive antenna count
    pub n_rx: u8,

    /// Transmit antenna count
    pub n_tx: u8,

    /// Per-chain signal strength readings (a, b, c)
    pub rssi: [u8; 3],

    /// Noise floor (dBm)
    pub noise: i8,

    /// Automatic gain control setting
    pub agc: u8,

    /// Antenna selection code
    pub antenna_sel: u8,

    /// Rate code as reported by the NIC
    pub rate: u16,
}

/// One timestamped channel observation.
///
/// The matrix is complex-valued for RF-phase-bearing formats; magnitude-only
/// formats store real values with zero imaginary part so a single dtype flows
/// through the whole pipeline. Frames are immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Sequence counter or capture clock, monotonic within one capture only
    pub timestamp: f64,

    /// Channel matrix; `[subcarrier, rx, tx]` for binary CSI,
    /// `[subcarrier, rx]` for the table/array formats
    pub matrix: ArrayD<Complex<f64>>,

    /// Vendor payload, binary decoder only
    pub meta: Option<BfeeMeta>,
}

impl Frame {
    pub fn new(timestamp: f64, matrix: ArrayD<Complex<f64>>) -> Self {
        Self {
            timestamp,
            matrix,
            meta: None,
        }
    }

    pub fn with_meta(timestamp: f64, matrix: ArrayD<Complex<f64>>, meta: BfeeMeta) -> Self {
        Self {
            timestamp,
            matrix,
            meta: Some(meta),
        }
    }

    /// Matrix shape as a plain slice
    pub fn shape(&self) -> &[usize] {
        self.matrix.shape()
    }
}

/// Raw decode output of one capture file.
///
/// Frames are kept in file order (not timestamp order). All frames share one
/// matrix shape; `add_frame` rejects a mismatching record instead of letting
/// an inconsistent shape through.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// Identity of the originating file (base name)
    pub source: String,

    pub frames: Vec<Frame>,
}

impl Capture {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            frames: Vec::new(),
        }
    }

    /// Append a frame, enforcing the uniform-shape invariant.
    ///
    /// Returns `false` (frame discarded) when the shape differs from the
    /// frames already present.
    pub fn add_frame(&mut self, frame: Frame) -> bool {
        if let Some(first) = self.frames.first() {
            if first.shape() != frame.shape() {
                return false;
            }
        }
        self.frames.push(frame);
        true
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// One conditioned training sample.
#[derive(Debug, Clone)]
pub struct Sample {
    /// `[time, frequency, antenna]` tensor
    pub tensor: Array3<Complex<f64>>,

    /// Classification target derived from the file name
    pub label: i64,

    /// Leakage-prevention group (e.g. subject id) derived from the file name
    pub group: i64,
}

impl Sample {
    pub fn new(tensor: Array3<Complex<f64>>, label: i64, group: i64) -> Self {
        Self {
            tensor,
            label,
            group,
        }
    }

    pub fn time_len(&self) -> usize {
        self.tensor.shape()[0]
    }
}

/// Aggregate output of a batch run: parallel tensors/labels/groups.
///
/// Ordering carries no meaning; every sample is independently labeled so the
/// collection stays correct under any stage interleaving.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn labels(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.label).collect()
    }

    pub fn groups(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.group).collect()
    }

    /// Distinct label values, sorted, for dense zero-based remapping
    pub fn distinct_labels(&self) -> Vec<i64> {
        let mut labels = self.labels();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Distinct group values, sorted, for dense zero-based remapping
    pub fn distinct_groups(&self) -> Vec<i64> {
        let mut groups = self.groups();
        groups.sort_unstable();
        groups.dedup();
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn matrix(shape: &[usize]) -> ArrayD<Complex<f64>> {
        ArrayD::from_elem(shape, Complex::new(1.0, 0.0))
    }

    #[test]
    fn test_capture_rejects_shape_mismatch() {
        let mut capture = Capture::new("user1-1-1-1-1-r1.dat");

        assert!(capture.add_frame(Frame::new(0.0, matrix(&[30, 3, 1]))));
        assert!(capture.add_frame(Frame::new(1.0, matrix(&[30, 3, 1]))));
        assert!(!capture.add_frame(Frame::new(2.0, matrix(&[30, 2, 1]))));

        assert_eq!(capture.len(), 2);
    }

    #[test]
    fn test_distinct_labels_sorted() {
        let mut set = SampleSet::new();
        for (label, group) in [(5, 2), (1, 1), (5, 3), (3, 1)] {
            set.push(Sample::new(
                Array3::from_elem((2, 4, 2), Complex::new(0.0, 0.0)),
                label,
                group,
            ));
        }

        assert_eq!(set.distinct_labels(), vec![1, 3, 5]);
        assert_eq!(set.distinct_groups(), vec![1, 2, 3]);
        assert_eq!(set.labels().len(), 4);
    }
}
