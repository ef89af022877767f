/// Encoded size of a [`Reading`]: i16 + u64 + 3 x f32, no padding.
pub const READING_LEN: usize = 2 + 8 + 4 + 4 + 4;

/// One instantaneous sensor sample
///
/// Wire layout (little-endian, packed):
/// - Bytes 0-1: Sensor ID (i16)
/// - Bytes 2-9: Timestamp, YYYYMMDDHHMMSS as a decimal integer (u64)
/// - Bytes 10-13: Temperature in °C (f32)
/// - Bytes 14-17: Pressure in hPa (f32)
/// - Bytes 18-21: Humidity in % (f32)
///
/// The signature covers exactly these bytes, so the layout must never depend
/// on the build or the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub sensor_id: i16,
    pub timestamp: u64,
    pub temperature: f32,
    pub pressure: f32,
    pub humidity: f32,
}

impl Reading {
    pub fn encode(&self) -> [u8; READING_LEN] {
        let mut buf = [0u8; READING_LEN];
        buf[0..2].copy_from_slice(&self.sensor_id.to_le_bytes());
        buf[2..10].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[10..14].copy_from_slice(&self.temperature.to_le_bytes());
        buf[14..18].copy_from_slice(&self.pressure.to_le_bytes());
        buf[18..22].copy_from_slice(&self.humidity.to_le_bytes());
        buf
    }

    /// Decode the first [`READING_LEN`] bytes of `data`.
    ///
    /// Returns None if fewer bytes are available.
    pub fn decode(data: &[u8]) -> Option<Reading> {
        let data: &[u8; READING_LEN] = data.get(..READING_LEN)?.try_into().ok()?;

        Some(Reading {
            sensor_id: i16::from_le_bytes([data[0], data[1]]),
            timestamp: u64::from_le_bytes([
                data[2], data[3], data[4], data[5], data[6], data[7], data[8], data[9],
            ]),
            temperature: f32::from_le_bytes([data[10], data[11], data[12], data[13]]),
            pressure: f32::from_le_bytes([data[14], data[15], data[16], data[17]]),
            humidity: f32::from_le_bytes([data[18], data[19], data[20], data[21]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Reading {
        Reading {
            sensor_id: 101,
            timestamp: 20240305140709,
            temperature: 23.5,
            pressure: 1013.25,
            humidity: 41.75,
        }
    }

    #[test]
    fn test_encode_layout() {
        let bytes = sample().encode();

        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[0..2], &101i16.to_le_bytes());
        assert_eq!(&bytes[2..10], &20240305140709u64.to_le_bytes());
        assert_eq!(&bytes[10..14], &23.5f32.to_le_bytes());
        assert_eq!(&bytes[14..18], &1013.25f32.to_le_bytes());
        assert_eq!(&bytes[18..22], &41.75f32.to_le_bytes());
    }

    #[test]
    fn test_decode_restores_fields() {
        let reading = Reading {
            sensor_id: -7,
            timestamp: 99991231235959,
            temperature: 29.999_998,
            pressure: 990.0,
            humidity: 70.0,
        };

        assert_eq!(Reading::decode(&reading.encode()), Some(reading));
    }

    #[test]
    fn test_decode_ignores_trailing_signature() {
        let mut packet = sample().encode().to_vec();
        packet.extend_from_slice(&[0xAB; 256]);

        assert_eq!(Reading::decode(&packet), Some(sample()));
    }

    #[test]
    fn test_decode_short_input() {
        let bytes = sample().encode();
        assert_eq!(Reading::decode(&bytes[..21]), None);
        assert_eq!(Reading::decode(&[]), None);
    }
}
