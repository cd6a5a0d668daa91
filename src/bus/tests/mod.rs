use crate::bus::{StreamBinding, StreamControl};
use crate::error::StreamError;
use crate::testing::{BusCall, LoopbackBus};
use crate::types::{Channel, Speed, StreamConfig};

struct Stream {
    binding: StreamBinding,
}

impl StreamControl for Stream {
    fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut StreamBinding {
        &mut self.binding
    }
}

fn stream() -> Stream {
    Stream {
        binding: StreamBinding::new(StreamConfig::default()),
    }
}

fn channel(n: u8) -> Channel {
    Channel::new(n).unwrap()
}

// ===== Lifecycle =====

#[test]
fn test_start_transmit_sequence() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    s.set_speed(Speed::S400).unwrap();
    s.set_prebuffers(10).unwrap();

    s.binding_mut()
        .start_transmit(&mut bus, channel(7), 128, Some(0))
        .unwrap();

    let params = bus.last_params().unwrap();
    assert_eq!(params.channel, channel(7));
    assert_eq!(params.max_packet_size, 128);
    assert_eq!(params.speed, Speed::S400);
    assert_eq!(params.buffer_packets, 1000);
    assert_eq!(params.irq_interval, 250);
    assert_eq!(
        bus.calls()[1],
        BusCall::XmitStart {
            start_cycle: Some(0),
            prebuffer_packets: 10,
        }
    );
    assert!(s.is_running());
    assert_eq!(s.channel(), Some(channel(7)));
}

#[test]
fn test_start_twice_fails() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    s.binding_mut().start_receive(&mut bus, channel(1), 64).unwrap();

    let err = s
        .binding_mut()
        .start_receive(&mut bus, channel(1), 64)
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidState { .. }));
    assert_eq!(bus.calls().len(), 2);
}

#[test]
fn test_failed_start_shuts_down() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    bus.fail_next_start();

    assert!(s.binding_mut().start_receive(&mut bus, channel(1), 64).is_err());
    assert_eq!(bus.calls().last(), Some(&BusCall::Shutdown));
    assert!(!s.is_running());
}

#[test]
fn test_stop_without_synch() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    s.binding_mut()
        .start_transmit(&mut bus, channel(1), 64, None)
        .unwrap();

    s.binding_mut().stop(&mut bus);

    assert_eq!(bus.calls().last(), Some(&BusCall::Shutdown));
    assert!(!bus.calls().contains(&BusCall::XmitSync));
    assert!(!s.is_running());
}

#[test]
fn test_stop_with_synch_drains() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    s.set_synch(true).unwrap();

    s.binding_mut()
        .start_transmit(&mut bus, channel(1), 64, None)
        .unwrap();
    s.binding_mut().stop(&mut bus);
    s.binding_mut().start_receive(&mut bus, channel(1), 64).unwrap();
    s.binding_mut().stop(&mut bus);

    let calls = bus.calls();
    assert_eq!(calls[2], BusCall::XmitSync);
    assert_eq!(calls[3], BusCall::Shutdown);
    assert_eq!(calls[6], BusCall::RecvFlush);
    assert_eq!(calls[7], BusCall::Shutdown);
}

#[test]
fn test_stop_when_stopped_is_noop() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();

    s.binding_mut().stop(&mut bus);

    assert!(bus.calls().is_empty());
}

// ===== Tuning =====

#[test]
fn test_setters_rejected_while_running() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    s.binding_mut().start_receive(&mut bus, channel(1), 64).unwrap();

    assert!(s.set_buffers(1).is_err());
    assert!(s.set_prebuffers(1).is_err());
    assert!(s.set_irq_interval(1).is_err());
    assert!(s.set_synch(true).is_err());
    assert!(s.set_speed(Speed::S400).is_err());
    assert_eq!(s.config(), &StreamConfig::default());
}

#[test]
fn test_dropped_reset_on_start() {
    let mut bus = LoopbackBus::default();
    let mut s = stream();
    s.binding_mut().add_dropped(5);
    assert_eq!(s.dropped(), 5);

    s.binding_mut().start_receive(&mut bus, channel(1), 64).unwrap();
    assert_eq!(s.dropped(), 0);

    s.binding_mut().add_dropped(2);
    s.binding_mut().add_dropped(3);
    assert_eq!(s.dropped(), 5);
}
