use crate::audio::format::*;
use crate::error::StreamError;

#[test]
fn test_sample_rate_table() {
    let expected = [
        (32000, 8, 0, 0x0c),
        (44100, 8, 1, 0x00),
        (48000, 8, 2, 0x04),
        (88200, 16, 3, 0x00),
        (96000, 16, 4, 0x00),
        (176_400, 32, 5, 0x00),
        (192_000, 32, 6, 0x00),
    ];

    for (hz, syt_interval, sfc, iec958) in expected {
        let rate = SampleRate::from_hz(hz).unwrap();
        assert_eq!(rate.as_u32(), hz);
        assert_eq!(rate.syt_interval(), syt_interval, "{hz}");
        assert_eq!(rate.sfc(), sfc, "{hz}");
        assert_eq!(rate.iec958_rate_code(), iec958, "{hz}");
        assert_eq!(SampleRate::from_sfc(sfc).unwrap(), rate);
    }
}

#[test]
fn test_sample_rate_unknown() {
    assert!(SampleRate::from_hz(22050).is_none());
    assert!(matches!(
        SampleRate::from_sfc(7),
        Err(StreamError::UnsupportedSampleRateCode(7))
    ));
}

#[test]
fn test_vbl_codes() {
    assert_eq!(SampleFormat::Bits24.vbl(), 0);
    assert_eq!(SampleFormat::Bits20.vbl(), 1);
    assert_eq!(SampleFormat::Bits16.vbl(), 2);
    assert_eq!(SampleFormat::from_vbl(2).unwrap(), SampleFormat::Bits16);
    assert!(matches!(
        SampleFormat::from_vbl(3),
        Err(StreamError::UnsupportedBitLength(3))
    ));
}

#[test]
fn test_sample_data_alignment() {
    assert_eq!(SampleFormat::Bits16.to_data(0x1234), 0x0012_3400);
    assert_eq!(SampleFormat::Bits20.to_data(0x12345), 0x0012_3450);
    assert_eq!(SampleFormat::Bits24.to_data(-1), 0x00ff_ffff);
    assert_eq!(SampleFormat::Bits16.to_data(-1), 0x00ff_ff00);
}

#[test]
fn test_sample_data_sign_extension() {
    // label byte is ignored
    assert_eq!(SampleFormat::Bits16.from_data(0x42ff_ff00), -1);
    assert_eq!(SampleFormat::Bits16.from_data(0x4280_0000), i32::from(i16::MIN));
    assert_eq!(SampleFormat::Bits24.from_data(0x407f_ffff), 0x7f_ffff);
    assert_eq!(SampleFormat::Bits20.from_data(0x4112_3450), 0x12345);
}

#[test]
fn test_amdtp_format_display() {
    assert_eq!(AmdtpFormat::Raw.to_string(), "AM824 raw");
    assert_eq!(AmdtpFormat::Iec958Ac3.to_string(), "IEC 60958 AC-3");
}
