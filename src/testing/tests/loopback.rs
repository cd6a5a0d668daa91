use crate::bus::{IsoBus, ReceiveHandler, RecvPacket, TransmitHandler, XmitCycle, XmitPacket};
use crate::error::{Result, StreamError};
use crate::testing::loopback::{BusCall, LoopbackBus};
use crate::types::{Disposition, Tag};

struct Counter {
    seen: Vec<XmitCycle>,
}

impl TransmitHandler for Counter {
    fn transmit(&mut self, buffer: &mut [u8], cycle: XmitCycle) -> Result<XmitPacket> {
        self.seen.push(cycle);
        buffer[0] = cycle.cycle as u8;
        Ok(XmitPacket::with_cip(1))
    }

    fn max_packet_size(&self) -> usize {
        16
    }
}

struct Failing;

impl ReceiveHandler for Failing {
    fn receive(&mut self, _packet: &RecvPacket<'_>) -> Result<Disposition> {
        Err(StreamError::callback("sink full"))
    }
}

#[test]
fn test_clock_advances_cycle_and_reports_drops_once() {
    let mut bus = LoopbackBus::new(0xffc2);
    let mut handler = Counter { seen: Vec::new() };

    bus.drop_packets(3);
    let packets = bus.run(&mut handler, 3).unwrap();

    assert_eq!(packets.len(), 3);
    assert_eq!(bus.cycle(), 3);
    assert_eq!(handler.seen[0].dropped, 3);
    assert_eq!(handler.seen[1].dropped, 0);
    assert_eq!(handler.seen[2].node_id, 0xffc2);
    assert_eq!(packets[2].data.as_ref(), &[2]);
    assert_eq!(packets[2].tag, Tag::WithCip);
}

#[test]
fn test_cycle_wraps_at_one_second() {
    let mut bus = LoopbackBus::default();
    let mut handler = Counter { seen: Vec::new() };

    let packets = bus.run(&mut handler, 8001).unwrap();

    assert_eq!(packets[7999].cycle, 7999);
    assert_eq!(packets[8000].cycle, 0);
}

#[test]
fn test_deliver_maps_errors_to_disposition() {
    let mut bus = LoopbackBus::default();
    let mut handler = Counter { seen: Vec::new() };
    let packet = bus.clock(&mut handler).unwrap();

    assert_eq!(bus.deliver(&mut Failing, &packet, 5), Disposition::Error);
}

#[test]
fn test_fail_next_start_is_one_shot() {
    let mut bus = LoopbackBus::default();
    bus.fail_next_start();

    assert!(bus.recv_start().is_err());
    assert!(bus.recv_start().is_ok());
    assert_eq!(bus.calls(), &[BusCall::RecvStart, BusCall::RecvStart]);
}
