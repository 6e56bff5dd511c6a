//! Integration tests for the precomputed transmit ring.

use channel_sounder::config::SounderConfig;
use channel_sounder::data::{SampleFormat, TxRingBuffer, Waveform};

#[test]
fn test_identical_parameters_give_identical_buffers() {
    for waveform in [
        Waveform::Sine { tone_hz: 1_000_000 },
        Waveform::PlusMinusOne {
            length: 4_000,
            seed: 11,
        },
    ] {
        for width in [4, 8] {
            let a = TxRingBuffer::new(3, width, 2_000, 25_000_000, waveform, false).unwrap();
            let b = TxRingBuffer::new(3, width, 2_000, 25_000_000, waveform, false).unwrap();
            assert_eq!(a.buffers(), b.buffers(), "{waveform:?} width={width}");
        }
    }
}

#[test]
fn test_reference_files_are_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let waveform = Waveform::PlusMinusOne {
        length: 4_000,
        seed: 3,
    };

    let a = TxRingBuffer::new(2, 4, 2_000, 25_000_000, waveform, false)
        .unwrap()
        .save_reference(first.path())
        .unwrap();
    let b = TxRingBuffer::new(2, 4, 2_000, 25_000_000, waveform, false)
        .unwrap()
        .save_reference(second.path())
        .unwrap();

    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn test_different_seeds_differ() {
    let make = |seed| {
        let waveform = Waveform::PlusMinusOne {
            length: 4_000,
            seed,
        };
        TxRingBuffer::new(1, 8, 100, 25_000_000, waveform, false).unwrap()
    };
    assert_ne!(make(1).buffers(), make(2).buffers());
}

#[test]
fn test_plus_minus_one_values_are_unit_magnitude() {
    let waveform = Waveform::PlusMinusOne {
        length: 64,
        seed: 0,
    };
    let tx = TxRingBuffer::new(1, 8, 10, 25_000_000, waveform, false).unwrap();
    assert_eq!(tx.format(), SampleFormat::Fc32);

    for sample in tx.buffers().channel(0).chunks_exact(8) {
        let re = f32::from_ne_bytes([sample[0], sample[1], sample[2], sample[3]]);
        let im = f32::from_ne_bytes([sample[4], sample[5], sample[6], sample[7]]);
        assert!(re == 0.5 || re == -0.5, "re={re}");
        assert!(im == 0.5 || im == -0.5, "im={im}");
    }
}

#[test]
fn test_requests_of_twenty_at_8msps() {
    let mut config = SounderConfig::default();
    config.radio.sample_rate = 8_000_000;
    config.radio.channels = 1;
    config.radio.bytes_per_sample = 4;
    config.radio.max_burst_size = 20;
    let mut tx = TxRingBuffer::from_config(&config).unwrap();
    assert_eq!(tx.cycle_length(), 8);

    let buffer_samples = tx.buffers().samples_per_channel();
    let mut expected = 0;
    for _ in 0..10 {
        let slots = tx.read_slots(20);
        expected = (expected + 20 % 8) % 8;
        assert_eq!(slots.cursor(), expected);
        assert!(slots.cursor() + 20 <= buffer_samples);
    }
}
