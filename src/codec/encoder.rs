//! # Logger Packet Encoder
//!
//! Rebuilds wire packets from decoded records. Used for test fixtures,
//! replaying archives over UDP, and round-trip verification.

use bytes::BufMut;

use super::crc::crc16_xmodem;
use super::protocol::*;
use super::scale;

/// Encode a record into a complete packet of the given variant
///
/// Physical values are converted back to raw integers with the inverse of
/// each scale factor, and the checksum is recomputed, so the result always
/// carries a valid checksum regardless of `record.checksum`. Use
/// [`encode_preserving_validity`] when a failed checksum must stay failed.
///
/// The decoded heading is already reduced into [0, 360), so a record whose
/// raw heading was a full circle or more re-encodes to the reduced raw value.
/// Its payload, and therefore its checksum, then differs from the original
/// bytes even though every decoded field is unchanged.
///
/// # Arguments
///
/// * `record` - Record to encode
/// * `variant` - Target layout
///
/// # Returns
///
/// * `Vec<u8>` - Complete packet (40 bytes live, 38 bytes archive)
///
/// # Examples
///
/// ```
/// use gpslog::codec::decoder::decode;
/// use gpslog::codec::encoder::encode;
/// use gpslog::codec::protocol::Variant;
///
/// let record = decode(&[0u8; 38], Variant::Archive).unwrap();
/// let packet = encode(&record, Variant::Archive);
/// assert_eq!(packet.len(), 38);
/// assert_eq!(decode(&packet, Variant::Archive).unwrap(), record);
/// ```
pub fn encode(record: &TelemetryRecord, variant: Variant) -> Vec<u8> {
    let layout = variant.layout();
    let raw = raw_from_record(record, layout);
    encode_raw(&raw, layout)
}

/// Encode a record, keeping a failed checksum failed
///
/// Same as [`encode`], except that when `record.checksum.valid` is false the
/// trailing checksum is inverted, so decoding the packet reports an invalid
/// checksum again.
pub fn encode_preserving_validity(record: &TelemetryRecord, variant: Variant) -> Vec<u8> {
    let mut packet = encode(record, variant);
    if !record.checksum.valid {
        let payload_len = variant.layout().payload_len;
        for byte in &mut packet[payload_len..] {
            *byte ^= 0xFF;
        }
    }
    packet
}

/// Lay out raw fields in wire order and append the checksum
pub fn encode_raw(raw: &RawFields, layout: &Layout) -> Vec<u8> {
    let mut packet = Vec::with_capacity(layout.total_len);

    packet.put_u32_le(raw.timestamp);
    packet.put_i32_le(raw.latitude);
    packet.put_i32_le(raw.longitude);
    packet.put_i32_le(raw.altitude_mm);
    packet.put_u16_le(raw.speed_mm_s);
    match layout.heading_width {
        HeadingWidth::U32 => packet.put_u32_le(raw.heading),
        HeadingWidth::U16 => packet.put_u16_le(raw.heading as u16),
    }
    packet.put_u8(raw.fix_type);
    packet.put_u8(raw.satellites);
    packet.put_u16_le(raw.battery_mv);
    packet.put_u8(raw.battery_pct);
    packet.put_i16_le(raw.accel_x);
    packet.put_i16_le(raw.accel_y);
    packet.put_i16_le(raw.accel_z);
    packet.put_i16_le(raw.gyro_x);
    packet.put_i16_le(raw.gyro_y);
    packet.put_u8(raw.reserved);

    debug_assert_eq!(packet.len(), layout.payload_len);

    let crc = crc16_xmodem(&packet);
    packet.put_u16_le(crc);

    packet
}

/// Convert a record's physical values back to raw wire integers
pub fn raw_from_record(record: &TelemetryRecord, layout: &Layout) -> RawFields {
    let heading_scale = f64::from(layout.heading_scale);
    let heading = (record.heading.degrees * heading_scale).round() as u32;
    let heading = match layout.heading_width {
        HeadingWidth::U32 => heading,
        HeadingWidth::U16 => heading.min(u32::from(u16::MAX)),
    };

    RawFields {
        timestamp: record.timestamp,
        latitude: scale::coordinate_to_raw(record.latitude),
        longitude: scale::coordinate_to_raw(record.longitude),
        altitude_mm: scale::altitude_to_raw(record.altitude_m),
        speed_mm_s: scale::speed_to_raw(record.speed_ms, layout.speed_scale),
        heading,
        fix_type: record.fix_type.raw(),
        satellites: record.satellites,
        battery_mv: record.battery.millivolts,
        battery_pct: record.battery.percent,
        accel_x: scale::accel_to_raw(record.accel.x),
        accel_y: scale::accel_to_raw(record.accel.y),
        accel_z: scale::accel_to_raw(record.accel.z),
        gyro_x: scale::gyro_to_raw(record.gyro.x),
        gyro_y: scale::gyro_to_raw(record.gyro.y),
        reserved: record.reserved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decoder::{decode, read_raw_fields};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn busy_raw_fields() -> RawFields {
        RawFields {
            timestamp: 1_718_000_123,
            latitude: -338_688_123,
            longitude: 1_512_093_456,
            altitude_mm: -42_195,
            speed_mm_s: 33_333,
            heading: 27_123,
            fix_type: 4,
            satellites: 17,
            battery_mv: 4_012,
            battery_pct: 88,
            accel_x: -1_999,
            accel_y: 2_501,
            accel_z: 987,
            gyro_x: -3_276,
            gyro_y: 1_501,
            reserved: 0x5A,
        }
    }

    #[test]
    fn test_encode_lengths() {
        let record = decode(&[0u8; LIVE_PACKET_SIZE], Variant::Live).unwrap();
        assert_eq!(encode(&record, Variant::Live).len(), LIVE_PACKET_SIZE);
        assert_eq!(encode(&record, Variant::Archive).len(), ARCHIVE_RECORD_SIZE);
    }

    #[test]
    fn test_encode_raw_checksum_placement() {
        let raw = busy_raw_fields();

        let live = encode_raw(&raw, &LIVE_LAYOUT);
        let crc = u16::from_le_bytes([live[38], live[39]]);
        assert_eq!(crc, crc16_xmodem(&live[..38]));

        let archive = encode_raw(&raw, &ARCHIVE_LAYOUT);
        let crc = u16::from_le_bytes([archive[36], archive[37]]);
        assert_eq!(crc, crc16_xmodem(&archive[..36]));
    }

    #[test]
    fn test_encode_raw_reads_back() {
        let raw = busy_raw_fields();
        for layout in [&LIVE_LAYOUT, &ARCHIVE_LAYOUT] {
            let packet = encode_raw(&raw, layout);
            let read = read_raw_fields(&packet[..layout.payload_len], layout).unwrap();
            assert_eq!(read, raw);
        }
    }

    #[test]
    fn test_round_trip_both_variants() {
        for variant in [Variant::Live, Variant::Archive] {
            let original = decode(&encode_raw(&busy_raw_fields(), variant.layout()), variant).unwrap();
            assert!(original.checksum.valid);

            let decoded = decode(&encode(&original, variant), variant).unwrap();
            assert_eq!(decoded, original);
            assert!(decoded.checksum.valid);
        }
    }

    #[test]
    fn test_round_trip_high_heading() {
        // Largest heading below a full circle at live precision
        let mut raw = busy_raw_fields();
        raw.heading = 35_999_999;
        let original = decode(&encode_raw(&raw, &LIVE_LAYOUT), Variant::Live).unwrap();
        let decoded = decode(&encode(&original, Variant::Live), Variant::Live).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_fixes_invalid_checksum() {
        let mut packet = encode_raw(&busy_raw_fields(), &LIVE_LAYOUT);
        packet[39] ^= 0xFF;
        let corrupted = decode(&packet, Variant::Live).unwrap();
        assert!(!corrupted.checksum.valid);

        let reencoded = decode(&encode(&corrupted, Variant::Live), Variant::Live).unwrap();
        assert!(reencoded.checksum.valid);
        assert_eq!(reencoded.timestamp, corrupted.timestamp);
    }

    fn random_raw_fields(rng: &mut StdRng, layout: &Layout) -> RawFields {
        RawFields {
            timestamp: rng.gen(),
            latitude: rng.gen(),
            longitude: rng.gen(),
            altitude_mm: rng.gen(),
            speed_mm_s: rng.gen(),
            heading: rng.gen_range(0..360 * layout.heading_scale),
            fix_type: rng.gen(),
            satellites: rng.gen(),
            battery_mv: rng.gen(),
            battery_pct: rng.gen(),
            accel_x: rng.gen(),
            accel_y: rng.gen(),
            accel_z: rng.gen(),
            gyro_x: rng.gen(),
            gyro_y: rng.gen(),
            reserved: rng.gen(),
        }
    }

    #[test]
    fn test_round_trip_generated_packets() {
        let mut rng = StdRng::seed_from_u64(0x6E5_106);
        for variant in [Variant::Live, Variant::Archive] {
            for _ in 0..10_000 {
                let packet = encode_raw(&random_raw_fields(&mut rng, variant.layout()), variant.layout());
                let record = decode(&packet, variant).unwrap();
                assert!(record.checksum.valid);

                let reencoded = encode(&record, variant);
                assert_eq!(reencoded, packet, "{} packet changed on re-encode", variant);
                assert_eq!(decode(&reencoded, variant).unwrap(), record);
            }
        }
    }

    #[test]
    fn test_full_circle_heading_reencodes_reduced() {
        let mut raw = busy_raw_fields();
        raw.heading = 36_500;
        let packet = encode_raw(&raw, &ARCHIVE_LAYOUT);
        let record = decode(&packet, Variant::Archive).unwrap();
        assert_eq!(record.heading.degrees, 5.0);

        let reencoded = encode(&record, Variant::Archive);
        let read = read_raw_fields(&reencoded[..ARCHIVE_PAYLOAD_SIZE], &ARCHIVE_LAYOUT).unwrap();
        assert_eq!(read.heading, 500);

        let again = decode(&reencoded, Variant::Archive).unwrap();
        assert!(again.checksum.valid);
        assert_ne!(again.checksum.transmitted, record.checksum.transmitted);
        assert_eq!(again.heading, record.heading);
    }

    #[test]
    fn test_preserving_validity_keeps_failed_checksum() {
        let mut packet = encode_raw(&busy_raw_fields(), &ARCHIVE_LAYOUT);
        packet[ARCHIVE_RECORD_SIZE - 1] ^= 0x01;
        let corrupted = decode(&packet, Variant::Archive).unwrap();
        assert!(!corrupted.checksum.valid);

        for variant in [Variant::Live, Variant::Archive] {
            let replayed = decode(&encode_preserving_validity(&corrupted, variant), variant).unwrap();
            assert!(!replayed.checksum.valid);
            assert_eq!(replayed.timestamp, corrupted.timestamp);
            assert_eq!(replayed.heading, corrupted.heading);
        }
    }

    #[test]
    fn test_preserving_validity_matches_encode_when_valid() {
        let record = decode(&encode_raw(&busy_raw_fields(), &LIVE_LAYOUT), Variant::Live).unwrap();
        assert_eq!(
            encode_preserving_validity(&record, Variant::Live),
            encode(&record, Variant::Live)
        );
    }

    #[test]
    fn test_cross_variant_encoding_keeps_heading() {
        // 271.23° fits both precisions
        let live = decode(&encode_raw(&busy_raw_fields(), &LIVE_LAYOUT), Variant::Live).unwrap();
        assert!((live.heading.degrees - 0.27123).abs() < 1e-12);

        let mut raw = busy_raw_fields();
        raw.heading = 27_123_000;
        let live = decode(&encode_raw(&raw, &LIVE_LAYOUT), Variant::Live).unwrap();
        let archive = decode(&encode(&live, Variant::Archive), Variant::Archive).unwrap();
        assert_eq!(archive.heading, live.heading);
    }
}
