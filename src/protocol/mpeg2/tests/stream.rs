use std::sync::{Arc, Mutex};

use crate::bus::{StreamControl, TransmitHandler, XmitCycle};
use crate::error::{Result, StreamError};
use crate::protocol::mpeg2::{
    Mpeg2Receiver, Mpeg2Transmitter, RECEIVE_MAX_PACKET_SIZE, TRANSMIT_MAX_PACKET_SIZE, TSP_SIZE,
    TsBufferOptions,
};
use crate::testing::{BusCall, CapturedPacket, LoopbackBus, SyntheticTs, ts_sequence};
use crate::types::{Channel, Disposition, Speed, Tag};

fn channel(n: u8) -> Channel {
    Channel::new(n).unwrap()
}

type Received = Arc<Mutex<Vec<(u32, u32)>>>;

fn recording_sink(received: Received) -> impl FnMut(&[u8], u32) -> Result<()> + Send {
    move |packet: &[u8], dropped: u32| {
        let seq = ts_sequence(packet).unwrap_or(u32::MAX);
        received.lock().unwrap().push((seq, dropped));
        Ok(())
    }
}

// ===== Transmit =====

#[test]
fn test_transmit_start_parameters() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 1, 3375));

    assert_eq!(tx.speed(), Speed::S200);
    tx.start(&mut bus, None, channel(3)).unwrap();

    let params = bus.last_params().unwrap();
    assert_eq!(params.max_packet_size, TRANSMIT_MAX_PACKET_SIZE);
    assert_eq!(params.max_packet_size, 968);
    assert_eq!(params.speed, Speed::S200);
    assert_eq!(params.channel, channel(3));
    assert_eq!(
        bus.calls()[1],
        BusCall::XmitStart {
            start_cycle: None,
            prebuffer_packets: 1000,
        }
    );
    assert_eq!(tx.buffer().pid(), Some(0x100));
}

#[test]
fn test_transmit_start_without_pcr_touches_no_bus() {
    let mut bus = LoopbackBus::default();
    let options = TsBufferOptions {
        max_lookahead: 10,
        ..TsBufferOptions::default()
    };
    let mut tx = Mpeg2Transmitter::with_options(SyntheticTs::new(0x100, 1, 3375), options);

    let err = tx.start(&mut bus, Some(0x200), channel(3)).unwrap_err();
    assert!(matches!(err, StreamError::PcrNotFound { lookahead: 10 }));
    assert!(bus.calls().is_empty());
    assert!(!tx.is_running());
}

#[test]
fn test_transmit_packets_use_local_node_id() {
    let mut bus = LoopbackBus::new(0xffc5);
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 1, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();

    let packet = bus.clock(&mut tx).unwrap();

    assert_eq!(packet.tag, Tag::WithCip);
    assert_eq!(packet.sy, 0);
    assert_eq!(packet.data.len(), 8 + TSP_SIZE);
    assert_eq!(packet.data[0], 0x05);
}

#[test]
fn test_transmit_after_stop_fails() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 1, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();
    tx.stop(&mut bus);

    let mut buffer = vec![0; TRANSMIT_MAX_PACKET_SIZE];
    assert!(tx.transmit(&mut buffer, XmitCycle::default()).is_err());
    assert_eq!(bus.calls().last(), Some(&BusCall::Shutdown));
}

#[test]
fn test_transmit_restart_reprimes() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 1, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();
    assert!(tx.start(&mut bus, None, channel(3)).is_err());

    tx.stop(&mut bus);
    tx.start(&mut bus, None, channel(4)).unwrap();
    assert_eq!(tx.channel(), Some(channel(4)));
    assert_eq!(tx.buffer().queue_len(), 5);
}

// ===== Receive =====

#[test]
fn test_receive_round_trip() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 2, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();
    let packets = bus.run(&mut tx, 10).unwrap();

    let received = Received::default();
    let mut rx = Mpeg2Receiver::new(recording_sink(received.clone()));
    rx.start(&mut bus, channel(3)).unwrap();
    assert_eq!(
        bus.last_params().unwrap().max_packet_size,
        RECEIVE_MAX_PACKET_SIZE
    );

    for packet in &packets {
        assert_eq!(bus.deliver(&mut rx, packet, 3), Disposition::Ok);
    }

    let seqs: Vec<u32> = received.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(seqs, (1..=20).collect::<Vec<_>>());
}

#[test]
fn test_receive_ignores_other_channels_and_formats() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 1, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();
    let packet = bus.clock(&mut tx).unwrap();

    let received = Received::default();
    let mut rx = Mpeg2Receiver::new(recording_sink(received.clone()));
    rx.start(&mut bus, channel(3)).unwrap();

    bus.deliver(&mut rx, &packet, 4);

    let mut wrong_fmt = packet.data.to_vec();
    wrong_fmt[4] = 0x90;
    let wrong_fmt = CapturedPacket {
        data: wrong_fmt.into(),
        ..packet.clone()
    };
    bus.deliver(&mut rx, &wrong_fmt, 3);

    let mut wrong_dbs = packet.data.to_vec();
    wrong_dbs[1] = 0x02;
    let wrong_dbs = CapturedPacket {
        data: wrong_dbs.into(),
        ..packet.clone()
    };
    bus.deliver(&mut rx, &wrong_dbs, 3);

    let empty = CapturedPacket {
        data: packet.data.slice(..8),
        ..packet
    };
    bus.deliver(&mut rx, &empty, 3);

    assert!(received.lock().unwrap().is_empty());
}

#[test]
fn test_receive_reports_dropped_on_first_packet_only() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 2, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();
    let packet = bus.clock(&mut tx).unwrap();

    let received = Received::default();
    let mut rx = Mpeg2Receiver::new(recording_sink(received.clone()));
    rx.start(&mut bus, channel(3)).unwrap();

    bus.drop_packets(2);
    assert_eq!(bus.deliver(&mut rx, &packet, 3), Disposition::Defer);

    assert_eq!(*received.lock().unwrap(), vec![(1, 2), (2, 0)]);
    assert_eq!(rx.dropped(), 2);
}

#[test]
fn test_receive_sink_error() {
    let mut bus = LoopbackBus::default();
    let mut tx = Mpeg2Transmitter::new(SyntheticTs::new(0x100, 1, 3375));
    tx.start(&mut bus, None, channel(3)).unwrap();
    let packet = bus.clock(&mut tx).unwrap();

    let mut rx = Mpeg2Receiver::new(|_: &[u8], _: u32| -> Result<()> {
        Err(StreamError::callback("disk full"))
    });
    rx.start(&mut bus, channel(3)).unwrap();

    assert_eq!(bus.deliver(&mut rx, &packet, 3), Disposition::Error);
}
