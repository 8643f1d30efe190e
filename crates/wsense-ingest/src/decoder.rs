//! Decoder capability enum and dataset dispatch.

use std::path::Path;

use wsense_core::{Capture, DatasetSpec, DecoderKind, Error, Result};

use crate::bfee::BfeeDecoder;
use crate::dense::DenseArrayDecoder;
use crate::table::AmplitudeTableDecoder;

/// Closed set of frame decoders, selected through the dataset registry
/// rather than subclass dispatch.
#[derive(Debug, Clone, Copy)]
pub enum FrameDecoder {
    Bfee(BfeeDecoder),
    AmplitudeTable(AmplitudeTableDecoder),
    DenseArray(DenseArrayDecoder),
}

impl FrameDecoder {
    /// Build the decoder a dataset registers.
    pub fn for_dataset(spec: &DatasetSpec) -> Result<Self> {
        match spec.decoder {
            DecoderKind::Bfee => Ok(Self::Bfee(BfeeDecoder::new())),
            DecoderKind::AmplitudeTable => Ok(Self::AmplitudeTable(AmplitudeTableDecoder::new())),
            DecoderKind::DenseArray => {
                let shape = spec.dense_shape.ok_or_else(|| {
                    Error::Config("dense-array decoder registered without a shape".to_string())
                })?;
                Ok(Self::DenseArray(DenseArrayDecoder::new(shape)))
            }
        }
    }

    /// Decode one capture file into one or more captures.
    ///
    /// Only the dense-array decoder can return more than one capture (one
    /// per antenna group); the others wrap their single capture.
    pub fn decode(&self, path: &Path) -> Result<Vec<Capture>> {
        match self {
            Self::Bfee(decoder) => decoder.decode(path).map(|c| vec![c]),
            Self::AmplitudeTable(decoder) => decoder.decode(path).map(|c| vec![c]),
            Self::DenseArray(decoder) => decoder.decode(path),
        }
    }
}
