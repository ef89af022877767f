//! Signed packet assembly and splitting
//!
//! A packet is the encoded reading followed by its signature:
//!
//! - Raw framing: `reading (22 bytes) || signature`
//! - Length-prefixed framing: `reading (22 bytes) || sig_len (u16 LE) || signature`
//!
//! Raw framing carries no boundary for the signature, so a receiver must
//! know the signature size in advance (256 bytes for RSA-2048).
//!
//! ```
//! use telemetry_emitter::protocol::{build_packet, split_packet, Framing};
//! use telemetry_emitter::Reading;
//!
//! let reading = Reading {
//!     sensor_id: 101,
//!     timestamp: 20240305140709,
//!     temperature: 21.5,
//!     pressure: 1012.0,
//!     humidity: 44.0,
//! };
//! let signature = [0xAA; 256];
//!
//! let packet = build_packet(&reading, &signature, Framing::Raw).unwrap();
//! assert_eq!(packet.len(), 22 + 256);
//!
//! let parts = split_packet(&packet, Framing::Raw).unwrap();
//! assert_eq!(parts.reading, reading);
//! assert_eq!(parts.signature, &signature[..]);
//! ```
use std::str::FromStr;

use crate::error::PacketError;
use crate::models::{Reading, READING_LEN};

const LENGTH_PREFIX_LEN: usize = 2;

/// How the signature is delimited on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    Raw,
    LengthPrefixed,
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Framing::Raw),
            "length-prefixed" | "length_prefixed" => Ok(Framing::LengthPrefixed),
            other => Err(format!(
                "unknown framing '{}', expected 'raw' or 'length-prefixed'",
                other
            )),
        }
    }
}

/// Concatenate the encoded reading and its signature
///
/// With raw framing the result is exactly `READING_LEN + signature.len()`
/// bytes. The signature is not re-verified here.
pub fn build_packet(
    reading: &Reading,
    signature: &[u8],
    framing: Framing,
) -> Result<Vec<u8>, PacketError> {
    if signature.is_empty() {
        return Err(PacketError::EmptySignature);
    }

    let mut packet = Vec::with_capacity(packet_len(signature.len(), framing));
    packet.extend_from_slice(&reading.encode());

    if framing == Framing::LengthPrefixed {
        let len = u16::try_from(signature.len())
            .map_err(|_| PacketError::SignatureTooLong(signature.len()))?;
        packet.extend_from_slice(&len.to_le_bytes());
    }

    packet.extend_from_slice(signature);
    Ok(packet)
}

/// Total packet size for a signature of `signature_len` bytes
pub fn packet_len(signature_len: usize, framing: Framing) -> usize {
    match framing {
        Framing::Raw => READING_LEN + signature_len,
        Framing::LengthPrefixed => READING_LEN + LENGTH_PREFIX_LEN + signature_len,
    }
}

/// A received packet split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct SignedReading<'a> {
    pub reading: Reading,
    /// The exact bytes the signature covers
    pub signed_bytes: &'a [u8],
    pub signature: &'a [u8],
}

/// Split a received packet into reading and signature
///
/// With raw framing everything after the reading is taken as the signature.
/// With length-prefixed framing trailing bytes beyond the declared length
/// are ignored.
pub fn split_packet(packet: &[u8], framing: Framing) -> Result<SignedReading<'_>, PacketError> {
    let truncated = |needed| PacketError::Truncated {
        len: packet.len(),
        needed,
    };

    let signed_bytes = packet
        .get(..READING_LEN)
        .ok_or_else(|| truncated(READING_LEN + 1))?;
    let rest = &packet[READING_LEN..];
    let reading = Reading::decode(signed_bytes).ok_or_else(|| truncated(READING_LEN + 1))?;

    let signature = match framing {
        Framing::Raw => rest,
        Framing::LengthPrefixed => {
            let header_end = READING_LEN + LENGTH_PREFIX_LEN;
            let prefix = rest
                .get(..LENGTH_PREFIX_LEN)
                .ok_or_else(|| truncated(header_end + 1))?;
            let len = usize::from(u16::from_le_bytes([prefix[0], prefix[1]]));
            rest.get(LENGTH_PREFIX_LEN..LENGTH_PREFIX_LEN + len)
                .ok_or_else(|| truncated(header_end + len))?
        }
    };

    if signature.is_empty() {
        return Err(PacketError::EmptySignature);
    }

    Ok(SignedReading {
        reading,
        signed_bytes,
        signature,
    })
}
