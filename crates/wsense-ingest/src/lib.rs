//! # WSense-Ingest
//!
//! Per-format frame decoders for raw wireless-channel capture files.
//!
//! Three independent implementations of one capability, "decode a capture
//! file into ordered, timestamped channel frames", sit behind the closed
//! [`FrameDecoder`] enum:
//!
//! - [`BfeeDecoder`]: bit-packed binary BFEE records (consumer WiFi NIC CSI)
//! - [`AmplitudeTableDecoder`]: delimited text with coordinate-mapped columns
//! - [`DenseArrayDecoder`]: one flat float array reshaped and split per
//!   antenna group (the one decoder yielding several captures per file)
//!
//! Decode failures are whole-file only where the file itself is unusable
//! (unopenable, missing mandatory column, reshape mismatch); malformed
//! individual records are skipped so one bad packet never costs a capture.

pub mod bfee;
pub mod decoder;
pub mod dense;
pub mod table;

pub use bfee::BfeeDecoder;
pub use decoder::FrameDecoder;
pub use dense::DenseArrayDecoder;
pub use table::AmplitudeTableDecoder;
