use crate::bus::StreamControl;
use crate::protocol::cip::{CipFormat, CipHeader, SYT_NO_INFO};
use crate::protocol::dv::{DV_PACKET_SIZE, DvSystem, DvTransmitter};
use crate::testing::{BusCall, CapturedPacket, LoopbackBus, SyntheticDv};
use crate::types::Channel;

fn run(system: DvSystem, cycles: usize) -> Vec<CapturedPacket> {
    let mut bus = LoopbackBus::default();
    let mut tx = DvTransmitter::new(system, SyntheticDv::new(system)).unwrap();
    tx.start(&mut bus, Channel::new(63).unwrap()).unwrap();
    bus.run(&mut tx, cycles).unwrap()
}

fn full_packets(packets: &[CapturedPacket]) -> usize {
    packets.iter().filter(|p| p.data.len() == DV_PACKET_SIZE).count()
}

// ===== System Parameters =====

#[test]
fn test_system_constants() {
    assert_eq!(DvSystem::Pal.frame_size(), 144_000);
    assert_eq!(DvSystem::Ntsc.frame_size(), 120_000);
    assert_eq!(DvSystem::Pal.fdf(), 0x80);
    assert_eq!(DvSystem::Ntsc.fdf(), 0x00);
    assert_eq!(DvSystem::Pal.cadence(), (1, 16));
    assert_eq!(DvSystem::Ntsc.cadence(), (68, 1068));
}

#[test]
fn test_system_from_header_block() {
    assert_eq!(DvSystem::from_header_block(&[0x1f, 0x07, 0x00, 0xbf]), Some(DvSystem::Pal));
    assert_eq!(DvSystem::from_header_block(&[0x1f, 0x07, 0x00, 0x3f]), Some(DvSystem::Ntsc));
    assert_eq!(DvSystem::from_header_block(&[0x1f]), None);
}

// ===== Cadence =====

#[test]
fn test_pal_cadence_fifteen_of_sixteen() {
    let packets = run(DvSystem::Pal, 17 + 16 * 10);

    assert_eq!(full_packets(&packets[..17]), 16);
    for window in packets[17..].chunks(16) {
        assert_eq!(full_packets(window), 15);
    }
}

#[test]
fn test_pal_one_second() {
    let full = full_packets(&run(DvSystem::Pal, 8000));

    assert!((7499..=7501).contains(&full), "{full} full packets");
}

#[test]
fn test_ntsc_rate() {
    let full = full_packets(&run(DvSystem::Ntsc, 1068 * 3));

    assert!((2999..=3001).contains(&full), "{full} full packets");
}

// ===== Headers =====

#[test]
fn test_headers() {
    let packets = run(DvSystem::Pal, 3);
    let first = CipHeader::decode(&packets[0].data).unwrap();
    let second = CipHeader::decode(&packets[1].data).unwrap();

    assert_eq!(first.format(), Some(CipFormat::Dv));
    assert_eq!(first.dbs, 120);
    assert_eq!(first.fdf, 0x80);
    assert_eq!(first.sid, 0);
    assert_eq!(first.syt, 0x3000);
    assert_eq!(first.dbc, 0);
    assert_eq!(second.syt, SYT_NO_INFO);
    assert_eq!(second.dbc, 1);
}

#[test]
fn test_empty_packet_keeps_counter() {
    let packets = run(DvSystem::Pal, 18);
    let empty = &packets[16];
    let header = CipHeader::decode(&empty.data).unwrap();

    assert_eq!(empty.data.len(), CipHeader::SIZE);
    assert_eq!(header.dbc, 16);
    assert_eq!(CipHeader::decode(&packets[17].data).unwrap().dbc, 16);
}

#[test]
fn test_syt_marks_frame_start() {
    let packets = run(DvSystem::Ntsc, 400);
    let full: Vec<_> = packets
        .iter()
        .filter(|p| p.data.len() == DV_PACKET_SIZE)
        .collect();
    let frame_start = full[250];
    let header = CipHeader::decode(&frame_start.data).unwrap();

    assert_ne!(header.syt, SYT_NO_INFO);
    assert_eq!(u32::from(header.syt >> 12), (frame_start.cycle + 3) & 0x0f);
    assert_eq!(CipHeader::decode(&full[251].data).unwrap().syt, SYT_NO_INFO);
}

#[test]
fn test_start_as_soon_as_possible() {
    let mut bus = LoopbackBus::default();
    let mut tx = DvTransmitter::new(DvSystem::Ntsc, SyntheticDv::new(DvSystem::Ntsc)).unwrap();
    tx.start(&mut bus, Channel::new(1).unwrap()).unwrap();

    assert!(tx.is_running());
    assert_eq!(bus.last_params().unwrap().max_packet_size, DV_PACKET_SIZE);
    assert_eq!(
        bus.calls()[1],
        BusCall::XmitStart {
            start_cycle: None,
            prebuffer_packets: 1000,
        }
    );
}
