use super::*;

// --- config.rs tests ---

#[test]
fn test_config_defaults() {
    let config = StreamConfig::default();

    assert_eq!(config.buffer_packets, 1000);
    assert_eq!(config.prebuffer_packets, 1000);
    assert_eq!(config.irq_interval, 250);
    assert!(!config.synch);
    assert_eq!(config.speed, Speed::S100);
}

#[test]
fn test_protocol_presets() {
    let dv = StreamConfig::dv_receive();
    assert_eq!(dv.buffer_packets, 775);
    assert_eq!(dv.prebuffer_packets, 0);
    assert_eq!(dv.irq_interval, 1);

    assert_eq!(StreamConfig::mpeg2().speed, Speed::S200);
}

#[test]
fn test_config_builder() {
    let config = StreamConfig::builder()
        .buffer_packets(500)
        .prebuffer_packets(100)
        .irq_interval(16)
        .synch(true)
        .speed(Speed::S400)
        .build();

    assert_eq!(config.buffer_packets, 500);
    assert_eq!(config.prebuffer_packets, 100);
    assert_eq!(config.irq_interval, 16);
    assert!(config.synch);
    assert_eq!(config.speed.mbps(), 400);
}

#[test]
fn test_config_deserialize_partial() {
    let config: StreamConfig = serde_json::from_str(r#"{"synch": true, "speed": "S200"}"#)
        .expect("config should parse");

    assert!(config.synch);
    assert_eq!(config.speed, Speed::S200);
    assert_eq!(config.buffer_packets, 1000);
}

// --- mod.rs tests ---

#[test]
fn test_channel_range() {
    assert_eq!(Channel::new(63).unwrap().number(), 63);
    assert!(Channel::new(64).is_err());
    assert!(Channel::try_from(0).is_ok());
}

#[test]
fn test_tag_from_bits() {
    assert_eq!(Tag::from_bits(1), Tag::WithCip);
    assert_eq!(Tag::from_bits(0x04), Tag::WithoutCip); // Masked
    assert_eq!(Tag::from_bits(3), Tag::Reserved2);
}

#[test]
fn test_disposition_from_result() {
    let ok: crate::Result<Disposition> = Ok(Disposition::Defer);
    assert_eq!(Disposition::from_result(&ok), Disposition::Defer);

    let err: crate::Result<Disposition> = Err(crate::StreamError::callback("sink full"));
    assert_eq!(Disposition::from_result(&err), Disposition::Error);
}
