//! # Logger Packet Decoder
//!
//! Decodes live telegrams and archived records into [`TelemetryRecord`]s.

use bytes::Buf;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::crc::crc16_xmodem;
use super::heading::normalize;
use super::motion::MotionClass;
use super::protocol::*;
use super::scale;
use crate::error::DecodeError;

/// Bounds-checked little-endian field reader over a byte slice
struct FieldReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    fn ensure(&mut self, field: &'static str, width: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < width {
            return Err(DecodeError::FieldUnpack {
                field,
                offset: self.offset,
            });
        }
        self.offset += width;
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        self.ensure(field, 1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        self.ensure(field, 2)?;
        Ok(self.buf.get_u16_le())
    }

    fn i16(&mut self, field: &'static str) -> Result<i16, DecodeError> {
        self.ensure(field, 2)?;
        Ok(self.buf.get_i16_le())
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        self.ensure(field, 4)?;
        Ok(self.buf.get_u32_le())
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        self.ensure(field, 4)?;
        Ok(self.buf.get_i32_le())
    }
}

/// Decode a complete packet of the given variant
///
/// # Arguments
///
/// * `buffer` - Complete packet bytes (payload and checksum)
/// * `variant` - Layout of the source the bytes came from
///
/// # Returns
///
/// * `Result<TelemetryRecord, DecodeError>` - Fully decoded record
///
/// # Errors
///
/// Returns error if:
/// - Buffer length differs from the variant's size (`SizeMismatch`)
/// - A field cannot be read from a correctly sized buffer (`FieldUnpack`)
///
/// A checksum mismatch is not an error: the record is returned with
/// `checksum.valid == false`.
///
/// # Examples
///
/// ```
/// use gpslog::codec::decoder::decode;
/// use gpslog::codec::protocol::Variant;
///
/// let record = decode(&[0u8; 40], Variant::Live).unwrap();
/// assert!(record.checksum.valid);
/// assert_eq!(record.heading.degrees, 0.0);
/// ```
pub fn decode(buffer: &[u8], variant: Variant) -> Result<TelemetryRecord, DecodeError> {
    let layout = variant.layout();

    if buffer.len() != layout.total_len {
        return Err(DecodeError::SizeMismatch {
            variant,
            expected: layout.total_len,
            actual: buffer.len(),
        });
    }

    let (payload, trailer) = buffer.split_at(layout.payload_len);

    let raw = read_raw_fields(payload, layout)?;
    let transmitted = FieldReader::new(trailer, layout.payload_len).u16("checksum")?;
    let checksum = Checksum::new(transmitted, crc16_xmodem(payload));

    if !checksum.valid {
        debug!(
            "{} packet checksum mismatch: received 0x{:04X}, computed 0x{:04X}",
            variant, checksum.transmitted, checksum.computed
        );
    }

    Ok(record_from_raw(&raw, layout, checksum))
}

/// Unpack the payload fields in wire order
pub fn read_raw_fields(payload: &[u8], layout: &Layout) -> Result<RawFields, DecodeError> {
    let mut reader = FieldReader::new(payload, 0);

    let timestamp = reader.u32("timestamp")?;
    let latitude = reader.i32("latitude")?;
    let longitude = reader.i32("longitude")?;
    let altitude_mm = reader.i32("altitude")?;
    let speed_mm_s = reader.u16("speed")?;
    let heading = match layout.heading_width {
        HeadingWidth::U32 => reader.u32("heading")?,
        HeadingWidth::U16 => u32::from(reader.u16("heading")?),
    };

    Ok(RawFields {
        timestamp,
        latitude,
        longitude,
        altitude_mm,
        speed_mm_s,
        heading,
        fix_type: reader.u8("fix_type")?,
        satellites: reader.u8("satellites")?,
        battery_mv: reader.u16("battery_mv")?,
        battery_pct: reader.u8("battery_pct")?,
        accel_x: reader.i16("accel_x")?,
        accel_y: reader.i16("accel_y")?,
        accel_z: reader.i16("accel_z")?,
        gyro_x: reader.i16("gyro_x")?,
        gyro_y: reader.i16("gyro_y")?,
        reserved: reader.u8("reserved")?,
    })
}

/// Apply scaling, heading normalization and motion classification
pub fn record_from_raw(raw: &RawFields, layout: &Layout, checksum: Checksum) -> TelemetryRecord {
    let accel = Acceleration {
        x: scale::accel_from_raw(raw.accel_x),
        y: scale::accel_from_raw(raw.accel_y),
        z: scale::accel_from_raw(raw.accel_z),
    };
    let accel_magnitude = scale::magnitude(accel.x, accel.y, accel.z);

    TelemetryRecord {
        timestamp: raw.timestamp,
        // Every u32 second count is representable
        datetime_utc: DateTime::<Utc>::from_timestamp(i64::from(raw.timestamp), 0)
            .unwrap_or_default(),
        latitude: scale::coordinate_from_raw(raw.latitude),
        longitude: scale::coordinate_from_raw(raw.longitude),
        altitude_m: scale::altitude_from_raw(raw.altitude_mm),
        speed_ms: scale::speed_from_raw(raw.speed_mm_s, layout.speed_scale),
        heading: normalize(raw.heading, layout.heading_scale),
        fix_type: FixType::from_raw(raw.fix_type),
        satellites: raw.satellites,
        battery: Battery {
            millivolts: raw.battery_mv,
            volts: scale::battery_from_raw(raw.battery_mv),
            percent: raw.battery_pct,
        },
        accel,
        gyro: AngularRate {
            x: scale::gyro_from_raw(raw.gyro_x),
            y: scale::gyro_from_raw(raw.gyro_y),
        },
        reserved: raw.reserved,
        checksum,
        accel_magnitude,
        motion: MotionClass::classify(accel_magnitude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::heading::Compass;

    /// Build a live telegram by hand, without going through the encoder
    fn live_packet(heading_raw: u32) -> Vec<u8> {
        let mut packet = Vec::with_capacity(LIVE_PACKET_SIZE);
        packet.extend_from_slice(&1_700_000_000u32.to_le_bytes()); // timestamp
        packet.extend_from_slice(&377_749_000i32.to_le_bytes()); // latitude
        packet.extend_from_slice(&(-1_224_194_000i32).to_le_bytes()); // longitude
        packet.extend_from_slice(&15_250i32.to_le_bytes()); // altitude 15.25 m
        packet.extend_from_slice(&2_500u16.to_le_bytes()); // speed 2.5 m/s
        packet.extend_from_slice(&heading_raw.to_le_bytes());
        packet.push(3); // 3D fix
        packet.push(11); // satellites
        packet.extend_from_slice(&3_850u16.to_le_bytes()); // battery mV
        packet.push(64); // battery %
        packet.extend_from_slice(&120i16.to_le_bytes()); // accel x
        packet.extend_from_slice(&(-80i16).to_le_bytes()); // accel y
        packet.extend_from_slice(&1_010i16.to_le_bytes()); // accel z
        packet.extend_from_slice(&1_600i16.to_le_bytes()); // gyro x 16 dps
        packet.extend_from_slice(&(-250i16).to_le_bytes()); // gyro y
        packet.push(0xA5); // reserved
        assert_eq!(packet.len(), LIVE_PAYLOAD_SIZE);

        let crc = crc16_xmodem(&packet);
        packet.extend_from_slice(&crc.to_le_bytes());
        packet
    }

    #[test]
    fn test_decode_all_zero_live_packet() {
        // All-zero payload checksums to 0x0000, so a zero trailer is valid
        let record = decode(&[0u8; LIVE_PACKET_SIZE], Variant::Live).unwrap();

        assert_eq!(record.latitude, 0.0);
        assert_eq!(record.longitude, 0.0);
        assert_eq!(record.altitude_m, 0.0);
        assert_eq!(record.speed_ms, 0.0);
        assert_eq!(record.heading.degrees, 0.0);
        assert_eq!(record.heading.compass, Compass::N);
        assert!(record.checksum.valid);
        assert_eq!(record.motion, MotionClass::VeryLow);
        assert_eq!(record.motion.label(), "very low");
        assert_eq!(record.fix_type, FixType::NoFix);
        assert_eq!(record.datetime_utc.timestamp(), 0);
    }

    #[test]
    fn test_decode_live_fields() {
        let record = decode(&live_packet(9_000_000), Variant::Live).unwrap();

        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(
            record.datetime_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2023-11-14 22:13:20"
        );
        assert!((record.latitude - 37.7749).abs() < 1e-9);
        assert!((record.longitude - (-122.4194)).abs() < 1e-9);
        assert_eq!(record.altitude_m, 15.25);
        assert_eq!(record.speed_ms, 2.5);
        assert!((record.speed_kmh() - 9.0).abs() < 1e-9);
        assert_eq!(record.heading.degrees, 90.0);
        assert_eq!(record.heading.compass, Compass::E);
        assert_eq!(record.fix_type, FixType::Fix3D);
        assert_eq!(record.satellites, 11);
        assert_eq!(record.battery.millivolts, 3_850);
        assert_eq!(record.battery.volts, 3.85);
        assert_eq!(record.battery.percent, 64);
        assert_eq!(record.accel.x, 0.12);
        assert_eq!(record.accel.y, -0.08);
        assert_eq!(record.accel.z, 1.01);
        assert_eq!(record.gyro.x, 16.0);
        assert_eq!(record.gyro.y, -2.5);
        assert_eq!(record.reserved, 0xA5);
        assert!(record.checksum.valid);
        assert_eq!(record.motion, MotionClass::Stationary);
    }

    #[test]
    fn test_decode_live_heading_wraps() {
        // 450° transmitted, reduced to 90°
        let record = decode(&live_packet(45_000_000), Variant::Live).unwrap();
        assert_eq!(record.heading.degrees, 90.0);
    }

    #[test]
    fn test_decode_archive_record() {
        let mut record_bytes = Vec::with_capacity(ARCHIVE_RECORD_SIZE);
        record_bytes.extend_from_slice(&1_700_000_100u32.to_le_bytes());
        record_bytes.extend_from_slice(&(-338_688_000i32).to_le_bytes()); // -33.8688
        record_bytes.extend_from_slice(&1_512_093_000i32.to_le_bytes()); // 151.2093
        record_bytes.extend_from_slice(&(-2_000i32).to_le_bytes()); // -2 m
        record_bytes.extend_from_slice(&0u16.to_le_bytes());
        record_bytes.extend_from_slice(&27_000u16.to_le_bytes()); // 270.00°
        record_bytes.push(2);
        record_bytes.push(5);
        record_bytes.extend_from_slice(&4_100u16.to_le_bytes());
        record_bytes.push(99);
        for axis in [0i16, 0, 1_000, 0, 0] {
            record_bytes.extend_from_slice(&axis.to_le_bytes());
        }
        record_bytes.push(0);
        assert_eq!(record_bytes.len(), ARCHIVE_PAYLOAD_SIZE);
        let crc = crc16_xmodem(&record_bytes);
        record_bytes.extend_from_slice(&crc.to_le_bytes());

        let record = decode(&record_bytes, Variant::Archive).unwrap();
        assert!((record.latitude - (-33.8688)).abs() < 1e-9);
        assert!((record.longitude - 151.2093).abs() < 1e-9);
        assert_eq!(record.altitude_m, -2.0);
        assert_eq!(record.heading.degrees, 270.0);
        assert_eq!(record.heading.compass, Compass::W);
        assert_eq!(record.fix_type, FixType::Fix2D);
        assert_eq!(record.accel_magnitude, 1.0);
        assert_eq!(record.checksum.transmitted, crc);
        assert!(record.checksum.valid);
    }

    #[test]
    fn test_checksum_mismatch_still_decodes() {
        let mut packet = live_packet(9_000_000);
        packet[LIVE_PAYLOAD_SIZE] ^= 0xFF;

        let record = decode(&packet, Variant::Live).unwrap();
        assert!(!record.checksum.valid);
        assert_ne!(record.checksum.transmitted, record.checksum.computed);
        // Fields are still fully populated
        assert_eq!(record.satellites, 11);
        assert_eq!(record.heading.degrees, 90.0);
    }

    #[test]
    fn test_corrupted_payload_flags_invalid() {
        let mut packet = live_packet(9_000_000);
        packet[0] ^= 0x01;

        let record = decode(&packet, Variant::Live).unwrap();
        assert!(!record.checksum.valid);
        assert_eq!(record.timestamp, 1_700_000_001);
    }

    #[test]
    fn test_size_mismatch_39_bytes() {
        let buffer = [0u8; 39];
        for variant in [Variant::Live, Variant::Archive] {
            let err = decode(&buffer, variant).unwrap_err();
            assert_eq!(
                err,
                DecodeError::SizeMismatch {
                    variant,
                    expected: variant.size(),
                    actual: 39,
                }
            );
        }
    }

    #[test]
    fn test_variants_are_not_interchangeable() {
        assert!(decode(&[0u8; LIVE_PACKET_SIZE], Variant::Archive).is_err());
        assert!(decode(&[0u8; ARCHIVE_RECORD_SIZE], Variant::Live).is_err());
        assert!(decode(&[], Variant::Live).is_err());
    }

    #[test]
    fn test_short_payload_reports_field() {
        let err = read_raw_fields(&[0u8; 20], &LIVE_LAYOUT).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldUnpack {
                field: "heading",
                offset: 18,
            }
        );
    }
}
