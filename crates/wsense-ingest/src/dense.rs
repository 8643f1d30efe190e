//! Dense flat-array decoder.
//!
//! A capture file holds one flat little-endian float array whose element
//! count must fill a fixed `[antenna_groups, subcarriers, rx, time]` shape.
//! The decoder slices along the antenna-group axis and emits one capture per
//! group, each with one `[subcarriers, rx]` frame per time step. It is the
//! single decoder that yields several captures from one file.

use std::path::Path;

use ndarray::{s, Array4};
use num_complex::Complex;
use tracing::debug;

use wsense_core::{Capture, Error, Frame, Result};

/// Decoder for dense flat-array captures.
#[derive(Debug, Clone, Copy)]
pub struct DenseArrayDecoder {
    /// Fixed reshape target `[groups, sub, rx, time]`
    pub shape: [usize; 4],
}

impl DenseArrayDecoder {
    pub fn new(shape: [usize; 4]) -> Self {
        Self { shape }
    }

    /// Decode one capture file into one capture per antenna group.
    ///
    /// A byte length that fills the declared shape with neither f32 nor f64
    /// elements is a fatal reshape error for the file; no alternate shape is
    /// ever guessed.
    pub fn decode(&self, path: &Path) -> Result<Vec<Capture>> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = std::fs::read(path)?;

        let [groups, subs, rxs, steps] = self.shape;
        let count = groups * subs * rxs * steps;

        let values: Vec<f64> = if bytes.len() == count * 4 {
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
                .collect()
        } else if bytes.len() == count * 8 {
            bytes
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect()
        } else {
            return Err(Error::ReshapeMismatch {
                source_name: file_name,
                bytes: bytes.len(),
                shape: self.shape,
            });
        };

        let array = Array4::from_shape_vec((groups, subs, rxs, steps), values).map_err(|e| {
            Error::Format {
                source_name: file_name.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut captures = Vec::with_capacity(groups);
        for g in 0..groups {
            let mut capture = Capture::new(file_name.clone());
            for t in 0..steps {
                let matrix = array
                    .slice(s![g, .., .., t])
                    .mapv(|v| Complex::new(v, 0.0))
                    .into_dyn();
                capture.add_frame(Frame::new(t as f64, matrix));
            }
            captures.push(capture);
        }

        debug!(file = %file_name, groups, steps, "dense array decode complete");
        Ok(captures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_f32(values: &[f32]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for v in values {
            file.write_all(&v.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_split_per_antenna_group() {
        // shape [2, 3, 2, 4]: value encodes its flat index
        let shape = [2, 3, 2, 4];
        let count = 2 * 3 * 2 * 4;
        let values: Vec<f32> = (0..count).map(|i| i as f32).collect();
        let file = write_f32(&values);

        let captures = DenseArrayDecoder::new(shape).decode(file.path()).unwrap();
        assert_eq!(captures.len(), 2);

        for (g, capture) in captures.iter().enumerate() {
            assert_eq!(capture.len(), 4);
            for (t, frame) in capture.frames.iter().enumerate() {
                assert_eq!(frame.timestamp, t as f64);
                assert_eq!(frame.shape(), &[3, 2]);
                for sub in 0..3 {
                    for rx in 0..2 {
                        let flat = ((g * 3 + sub) * 2 + rx) * 4 + t;
                        assert_eq!(frame.matrix[[sub, rx]].re, flat as f64);
                        assert_eq!(frame.matrix[[sub, rx]].im, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_f64_payload() {
        let shape = [1, 2, 1, 2];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for v in [0.5f64, 1.5, 2.5, 3.5] {
            file.write_all(&v.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();

        let captures = DenseArrayDecoder::new(shape).decode(file.path()).unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].frames[0].matrix[[0, 0]].re, 0.5);
        assert_eq!(captures[0].frames[1].matrix[[1, 0]].re, 3.5);
    }

    #[test]
    fn test_reshape_mismatch_is_fatal() {
        let file = write_f32(&[1.0, 2.0, 3.0]);
        let res = DenseArrayDecoder::new([3, 30, 3, 1000]).decode(file.path());
        assert!(matches!(res, Err(Error::ReshapeMismatch { .. })));
    }
}
