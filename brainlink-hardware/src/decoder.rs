//! ThinkGear byte-stream decoder
//!
//! BrainLink headsets emit the NeuroSky ThinkGear serial stream: packets of
//! the form `0xAA 0xAA <plen> <payload…> <checksum>`, where `plen <= 169`
//! and the checksum is the one's complement of the low byte of the payload
//! sum. Payload rows carry single-byte values (poor signal, attention,
//! meditation) or length-prefixed extended values, of which ASIC_EEG_POWER
//! holds the eight frequency-band powers as 3-byte big-endian integers.
//!
//! The decoder buffers across `feed` calls, resynchronizes on malformed
//! input instead of failing, and invokes its callback once per valid packet
//! that carried at least one EEG field.

use brainlink_core::Reading;
use tracing::{debug, trace};

/// Stateful byte-stream parser invoked from the reader loop.
///
/// `feed` may invoke the decoder's output callback zero or more times
/// synchronously before returning, once per complete frame found in the
/// accumulated stream. Buffering across calls is the decoder's own concern.
pub trait Decoder: Send {
    /// Consume a chunk of raw bytes from the device
    fn feed(&mut self, bytes: &[u8]);
}

/// Packet sync byte; two in a row start a packet
const SYNC: u8 = 0xAA;
/// Extended-code prefix byte, skipped before reading a row code
const EXCODE: u8 = 0x55;
/// Maximum legal payload length
const MAX_PAYLOAD: usize = 169;

/// Payload row codes
const CODE_POOR_SIGNAL: u8 = 0x02;
const CODE_ATTENTION: u8 = 0x04;
const CODE_MEDITATION: u8 = 0x05;
const CODE_RAW_WAVE: u8 = 0x80;
const CODE_ASIC_EEG_POWER: u8 = 0x83;

/// ThinkGear stream decoder for BrainLink headsets.
///
/// Keeps the latest value of every telemetry field and emits a snapshot
/// `Reading` per checksum-valid packet containing at least one EEG field.
/// Raw-wave rows are parsed and skipped; they arrive at hundreds of hertz
/// and are not part of the telemetry surface.
pub struct ThinkGearDecoder<F: FnMut(Reading) + Send> {
    buf: Vec<u8>,
    current: Reading,
    on_reading: F,
}

impl<F: FnMut(Reading) + Send> ThinkGearDecoder<F> {
    /// Create a decoder with the given per-reading callback
    pub fn new(on_reading: F) -> Self {
        Self {
            buf: Vec::new(),
            current: Reading::default(),
            on_reading,
        }
    }

    /// Try to parse one packet at the start of the buffer.
    ///
    /// Returns the number of bytes to drain, or `None` when more input is
    /// needed. A drain of 1 re-scans from the next byte (resync).
    fn parse_front(&mut self) -> Option<usize> {
        if self.buf.len() < 2 {
            return None;
        }
        if self.buf[0] != SYNC || self.buf[1] != SYNC {
            return Some(1);
        }
        if self.buf.len() < 3 {
            return None;
        }

        let plen = self.buf[2] as usize;
        if plen > MAX_PAYLOAD {
            trace!("Oversized payload length {}, resyncing", plen);
            return Some(1);
        }

        let total = 3 + plen + 1;
        if self.buf.len() < total {
            return None;
        }

        let payload = &self.buf[3..3 + plen];
        let sum: u32 = payload.iter().map(|&b| u32::from(b)).sum();
        let expected = !(sum as u8);
        let checksum = self.buf[3 + plen];
        if checksum != expected {
            debug!(
                "Checksum mismatch (expected 0x{:02X}, got 0x{:02X}), resyncing",
                expected, checksum
            );
            return Some(1);
        }

        let payload = payload.to_vec();
        if self.parse_payload(&payload) {
            let snapshot = self.current;
            (self.on_reading)(snapshot);
        }
        Some(total)
    }

    /// Apply all rows of a valid payload to the current snapshot.
    ///
    /// Returns `true` when the payload carried at least one EEG field.
    fn parse_payload(&mut self, payload: &[u8]) -> bool {
        let mut saw_eeg_field = false;
        let mut i = 0;

        while i < payload.len() {
            while i < payload.len() && payload[i] == EXCODE {
                i += 1;
            }
            if i >= payload.len() {
                break;
            }

            let code = payload[i];
            i += 1;

            if code < CODE_RAW_WAVE {
                // Single-byte value row
                let Some(&value) = payload.get(i) else { break };
                i += 1;

                match code {
                    CODE_POOR_SIGNAL => {
                        self.current.signal = value;
                        saw_eeg_field = true;
                    }
                    CODE_ATTENTION => {
                        self.current.attention = value;
                        saw_eeg_field = true;
                    }
                    CODE_MEDITATION => {
                        self.current.meditation = value;
                        saw_eeg_field = true;
                    }
                    // Blink strength and other single-byte rows are not
                    // part of the telemetry surface
                    _ => {}
                }
            } else {
                // Length-prefixed extended row
                let Some(&vlen) = payload.get(i) else { break };
                i += 1;
                let vlen = vlen as usize;
                if i + vlen > payload.len() {
                    break;
                }

                match code {
                    CODE_ASIC_EEG_POWER if vlen == 24 => {
                        let bands = &payload[i..i + 24];
                        self.current.delta = be24(&bands[0..3]);
                        self.current.theta = be24(&bands[3..6]);
                        self.current.low_alpha = be24(&bands[6..9]);
                        self.current.high_alpha = be24(&bands[9..12]);
                        self.current.low_beta = be24(&bands[12..15]);
                        self.current.high_beta = be24(&bands[15..18]);
                        self.current.low_gamma = be24(&bands[18..21]);
                        self.current.high_gamma = be24(&bands[21..24]);
                        saw_eeg_field = true;
                    }
                    CODE_RAW_WAVE => {
                        // Raw samples are skipped, not surfaced
                    }
                    _ => {
                        trace!("Skipping unknown row code 0x{:02X} ({} bytes)", code, vlen);
                    }
                }
                i += vlen;
            }
        }

        saw_eeg_field
    }
}

impl<F: FnMut(Reading) + Send> Decoder for ThinkGearDecoder<F> {
    fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.buf.extend_from_slice(bytes);

        while let Some(drain) = self.parse_front() {
            self.buf.drain(..drain);
        }
    }
}

/// Decode a 3-byte big-endian unsigned integer
fn be24(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}
