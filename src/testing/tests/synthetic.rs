use crate::protocol::dv::{DIF_BLOCK_SIZE, DifSource, DvSystem};
use crate::protocol::mpeg2::{TS_PACKET_SIZE, TsPacket, TsSource};
use crate::testing::synthetic::{SyntheticDv, SyntheticTs, ts_sequence};
use bytes::Bytes;

// ===== Transport Stream =====

#[test]
fn test_pcr_every_interval() {
    let ts = SyntheticTs::new(0x100, 4, 1000).with_start_pcr(500);

    assert_eq!(ts.pcr_at(0), Some(500));
    assert_eq!(ts.pcr_at(3), None);
    assert_eq!(ts.pcr_at(8), Some(2500));
}

#[test]
fn test_packets_parse_back() {
    let ts = SyntheticTs::new(0x1abc, 10, 123_456_789);
    let pcr_packet = TsPacket::new(Bytes::copy_from_slice(&ts.packet(10))).unwrap();
    let plain = TsPacket::new(Bytes::copy_from_slice(&ts.packet(11))).unwrap();

    assert_eq!(pcr_packet.pid(), 0x1abc);
    assert_eq!(pcr_packet.pcr(), Some(123_456_789));
    assert_eq!(plain.pcr(), None);
    assert_eq!(ts_sequence(plain.as_bytes()), Some(11));
}

#[test]
fn test_limit_exhausts_source() {
    let mut ts = SyntheticTs::new(0x100, 4, 1000).with_limit(2);
    let mut data = vec![0; 3 * TS_PACKET_SIZE];

    assert!(ts.read(&mut data[..2 * TS_PACKET_SIZE], 2, 0).is_ok());
    assert!(ts.read(&mut data, 1, 0).is_err());
    assert_eq!(ts.produced(), 2);
}

// ===== DV =====

#[test]
fn test_dv_frame_ids() {
    let frame = SyntheticDv::frame_data(DvSystem::Pal, 0);

    assert_eq!(frame.len(), 144_000);
    assert_eq!(DvSystem::from_header_block(&frame), Some(DvSystem::Pal));
    // slot 6 of sequence 0 is audio block 0, slot 7 video block 0
    assert_eq!(frame[6 * 80] >> 5, 3);
    assert_eq!(frame[7 * 80] >> 5, 4);
    assert_eq!(frame[7 * 80 + 2], 0);
    // slot 23 is video block 15
    assert_eq!(frame[23 * 80 + 2], 15);
    // sequence 1 header
    assert_eq!(frame[150 * 80] >> 5, 0);
    assert_eq!(frame[150 * 80 + 1] >> 4, 1);
}

#[test]
fn test_dv_source_rolls_frames() {
    let mut dv = SyntheticDv::new(DvSystem::Ntsc);
    let mut block = vec![0; DIF_BLOCK_SIZE];

    for _ in 0..250 {
        dv.fill(&mut block, 1, 0).unwrap();
    }
    assert_eq!(dv.frames_started(), 1);

    dv.fill(&mut block, 1, 0).unwrap();
    assert_eq!(dv.frames_started(), 2);
    assert_eq!(block[3], 0x3f);
    assert_eq!(block[80 + 3], 1);
}
