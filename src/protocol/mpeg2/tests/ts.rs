use bytes::Bytes;

use crate::error::StreamError;
use crate::protocol::mpeg2::{PCR_MODULUS, SYNC_BYTE, TS_PACKET_SIZE, TsPacket, pcr_delta};
use crate::testing::{SyntheticTs, write_pcr};

fn packet(bytes: [u8; TS_PACKET_SIZE]) -> TsPacket {
    TsPacket::new(Bytes::copy_from_slice(&bytes)).unwrap()
}

// ===== Packet Parsing =====

#[test]
fn test_rejects_wrong_length() {
    assert!(TsPacket::new(Bytes::from_static(&[0x47; 100])).is_err());
    assert!(TsPacket::new(Bytes::from(vec![0x47; 189])).is_err());
}

#[test]
fn test_rejects_missing_sync_byte() {
    let mut bytes = [0u8; TS_PACKET_SIZE];
    assert!(matches!(
        TsPacket::new(Bytes::copy_from_slice(&bytes)),
        Err(StreamError::InvalidParameter { .. })
    ));

    bytes[0] = SYNC_BYTE;
    assert!(TsPacket::new(Bytes::copy_from_slice(&bytes)).is_ok());
}

#[test]
fn test_pid_is_13_bits() {
    let mut bytes = [0u8; TS_PACKET_SIZE];
    bytes[0] = 0x47;
    bytes[1] = 0xff;
    bytes[2] = 0x34;

    assert_eq!(packet(bytes).pid(), 0x1f34);
}

#[test]
fn test_pcr_requires_adaptation_field_and_flag() {
    let ts = SyntheticTs::new(0x44, 1, 0).with_start_pcr(1_000_000);
    let mut bytes = ts.packet(0);
    assert_eq!(packet(bytes).pcr(), Some(1_000_000));

    bytes[5] = 0x00;
    assert_eq!(packet(bytes).pcr(), None);

    bytes[5] = 0x10;
    bytes[4] = 0;
    assert_eq!(packet(bytes).pcr(), None);

    bytes[4] = 7;
    bytes[3] = 0x10;
    assert_eq!(packet(bytes).pcr(), None);
}

#[test]
fn test_has_pcr_filters_pid() {
    let ts = SyntheticTs::new(0x44, 1, 0);
    let p = packet(ts.packet(0));

    assert!(p.has_pcr(None));
    assert!(p.has_pcr(Some(0x44)));
    assert!(!p.has_pcr(Some(0x45)));
}

#[test]
fn test_pcr_base_and_extension() {
    let mut bytes = [0u8; TS_PACKET_SIZE];
    bytes[0] = 0x47;
    bytes[3] = 0x20;
    bytes[4] = 7;
    bytes[5] = 0x10;
    // base = 2^32 + 1, extension = 299
    let pcr = ((1u64 << 32) + 1) * 300 + 299;
    write_pcr(&mut bytes[6..12], pcr);

    assert_eq!(packet(bytes).pcr_field(), pcr);
}

// ===== PCR Arithmetic =====

#[test]
fn test_pcr_delta_forward() {
    assert_eq!(pcr_delta(1000, 4375), 3375);
}

#[test]
fn test_pcr_delta_across_wrap() {
    assert_eq!(pcr_delta(PCR_MODULUS - 100, 50), 150);
}

#[test]
fn test_pcr_delta_equal_is_zero() {
    assert_eq!(pcr_delta(123, 123), 0);
}
