//! Bit-packed binary BFEE decoder.
//!
//! Capture files are a sequence of length-prefixed records: a 2-byte
//! big-endian length, a 1-byte type code, then `length - 1` payload bytes.
//! Records with code `0xBB` carry one CSI matrix packed at 8-bit complex
//! resolution; every other code is skipped. The bit layout is brittle
//! consumer-NIC territory; the LSB-first bit order and rx-fastest antenna
//! pair order must not be reordered.

use std::path::Path;

use ndarray::Array3;
use num_complex::Complex;
use tracing::{debug, warn};

use wsense_core::{BfeeMeta, Capture, Frame, Result};

/// Record type code of a CSI (beamforming feedback) record
const CSI_RECORD_CODE: u8 = 0xBB;

/// Fixed subcarrier count of the packed format
const SUBCARRIERS: usize = 30;

/// Byte length of the fixed record header preceding the packed CSI bits
const HEADER_LEN: usize = 20;

/// Declared packed length for an `n_rx * n_tx` antenna configuration:
/// per subcarrier, 3 pilot bits plus 16 bits per antenna pair.
fn expected_csi_len(n_rx: usize, n_tx: usize) -> usize {
    (SUBCARRIERS * (n_rx * n_tx * 8 * 2 + 3) + 7) / 8
}

/// Cursor over a bit-packed buffer, LSB-first within each byte.
struct BitCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn bit(&self, pos: usize) -> u8 {
        let byte = pos / 8;
        if byte >= self.bytes.len() {
            return 0;
        }
        (self.bytes[byte] >> (pos % 8)) & 0x1
    }

    fn skip(&mut self, bits: usize) {
        self.pos += bits;
    }

    /// Read 8 bits as an unsigned byte (interpret as two's complement at the
    /// call site).
    fn read_u8(&mut self) -> u8 {
        let mut val = 0u8;
        for b in 0..8 {
            val |= self.bit(self.pos + b) << b;
        }
        self.pos += 8;
        val
    }
}

/// Decoder for bit-packed binary capture files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfeeDecoder;

impl BfeeDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one capture file.
    ///
    /// Fails only when the file cannot be read; malformed records are
    /// skipped and a truncated trailing record ends decoding silently.
    pub fn decode(&self, path: &Path) -> Result<Capture> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = std::fs::read(path)?;

        let mut capture = Capture::new(file_name.clone());
        let mut rejected = 0usize;
        let mut pos = 0usize;

        while pos + 3 <= bytes.len() {
            let field_len = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
            let code = bytes[pos + 2];
            pos += 3;

            if field_len == 0 {
                // A zero length field cannot frame a record; the stream is
                // unrecoverable from here.
                break;
            }
            let payload_len = field_len - 1;
            if bytes.len() - pos < payload_len {
                // Truncated trailing record: stop without error.
                break;
            }

            if code == CSI_RECORD_CODE {
                match parse_bfee_record(&bytes[pos..pos + payload_len]) {
                    Some(frame) => {
                        if !capture.add_frame(frame) {
                            rejected += 1;
                        }
                    }
                    None => rejected += 1,
                }
            }
            pos += payload_len;
        }

        if rejected > 0 {
            warn!(file = %file_name, rejected, "skipped malformed BFEE records");
        }
        debug!(file = %file_name, records = capture.len(), "BFEE decode complete");

        Ok(capture)
    }
}

/// Parse one CSI record payload; `None` rejects the record and decoding
/// continues at the next record boundary.
fn parse_bfee_record(payload: &[u8]) -> Option<Frame> {
    if payload.len() < HEADER_LEN {
        return None;
    }

    // Microsecond counter, wraps at u32 range
    let timestamp = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let sequence = u16::from_le_bytes([payload[4], payload[5]]);

    let n_rx = payload[8] as usize;
    let n_tx = payload[9] as usize;
    let rssi = [payload[10], payload[11], payload[12]];
    let noise = payload[13] as i8;
    let agc = payload[14];
    let antenna_sel = payload[15];
    let csi_len = u16::from_le_bytes([payload[16], payload[17]]) as usize;
    let rate = u16::from_le_bytes([payload[18], payload[19]]);

    if csi_len != expected_csi_len(n_rx, n_tx) {
        return None;
    }
    if payload.len() < HEADER_LEN + csi_len {
        return None;
    }

    let csi_bytes = &payload[HEADER_LEN..HEADER_LEN + csi_len];
    let mut matrix = Array3::<Complex<f64>>::zeros((SUBCARRIERS, n_rx, n_tx));
    let mut cursor = BitCursor::new(csi_bytes);

    for sc in 0..SUBCARRIERS {
        // Pilot marker, not part of the matrix
        cursor.skip(3);
        for j in 0..n_rx * n_tx {
            let real = cursor.read_u8() as i8;
            let imag = cursor.read_u8() as i8;
            // Antenna pair index iterates receive antennas fastest
            let rx = j % n_rx;
            let tx = j / n_rx;
            matrix[[sc, rx, tx]] = Complex::new(real as f64, imag as f64);
        }
    }

    let meta = BfeeMeta {
        sequence,
        n_rx: n_rx as u8,
        n_tx: n_tx as u8,
        rssi,
        noise,
        agc,
        antenna_sel,
        rate,
    };

    Some(Frame::with_meta(
        timestamp as f64,
        matrix.into_dyn(),
        meta,
    ))
}
