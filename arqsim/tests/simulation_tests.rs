//! End-to-end simulation scenarios.

use bytes::Bytes;

use arqsim::{run_simulation, SimConfig, Simulation};

/// Patterned source data so byte-for-byte comparisons catch reordering.
fn source(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
}

// ---------------------------------------------------------------------------
// Clean channel
// ---------------------------------------------------------------------------

#[test]
fn clean_channel_delivers_everything_without_retransmission() {
    let config = SimConfig {
        window_size: 8,
        frame_payload_size: 1024,
        file_size: 10 * 1024,
        good_ber: 0.0,
        bad_ber: 0.0,
        ..SimConfig::default()
    };
    let report = run_simulation(config, source(10 * 1024)).unwrap();

    assert!(report.completed);
    assert_eq!(report.retransmissions, 0);
    assert_eq!(report.bytes_delivered, 10_240);
    // Segment size 1016 -> 11 frames, one flight each.
    assert_eq!(report.frames_sent, 11);
    assert_eq!(report.frames_received, 11);
    assert_eq!(report.acks_sent, report.acks_received);
    assert!(report.total_time > 0.0);
    assert!(report.avg_rtt > 0.0);
}

#[test]
fn clean_channel_delivery_is_byte_for_byte() {
    let data = source(64 * 1024);
    let config = SimConfig {
        window_size: 16,
        frame_payload_size: 2048,
        file_size: data.len(),
        good_ber: 0.0,
        bad_ber: 0.0,
        ..SimConfig::default()
    };
    let mut simulation = Simulation::new(config).unwrap();
    simulation.load_data(data.clone());
    let report = simulation.run().unwrap();

    assert!(report.completed);
    assert_eq!(simulation.delivered_data(), &data[..]);
}

// ---------------------------------------------------------------------------
// Lossy channels
// ---------------------------------------------------------------------------

#[test]
fn tiny_ber_good_state_completes_with_few_retransmissions() {
    let config = SimConfig {
        window_size: 4,
        frame_payload_size: 512,
        file_size: 64 * 1024,
        good_ber: 1e-6,
        bad_ber: 1e-6,
        p_good_to_bad: 0.0,
        p_bad_to_good: 1.0,
        seed: 1,
        ..SimConfig::default()
    };
    let report = run_simulation(config, source(64 * 1024)).unwrap();

    assert!(report.completed);
    assert_eq!(report.bytes_delivered, 65_536);
    // Expected corruptions are on the order of file_bits * BER, well below
    // a dozen at these parameters.
    assert!(report.retransmissions <= 10, "retransmissions = {}", report.retransmissions);
}

#[test]
fn bursty_channel_still_delivers_byte_for_byte() {
    let data = source(64 * 1024);
    let config = SimConfig {
        window_size: 8,
        frame_payload_size: 1024,
        file_size: data.len(),
        seed: 11,
        ..SimConfig::default()
    };
    let mut simulation = Simulation::new(config).unwrap();
    simulation.load_data(data.clone());
    let report = simulation.run().unwrap();

    assert!(report.completed);
    assert_eq!(report.bytes_delivered as usize, data.len());
    assert_eq!(simulation.delivered_data(), &data[..]);
}

#[test]
fn always_corrupt_channel_hits_the_event_cap() {
    let config = SimConfig {
        window_size: 2,
        frame_payload_size: 256,
        file_size: 4 * 1024,
        good_ber: 0.0,
        bad_ber: 1.0,
        p_good_to_bad: 1.0,
        p_bad_to_good: 0.0,
        seed: 42,
        // Lowered cap: the run cannot complete, it must stop at the cap.
        max_events: 20_000,
        ..SimConfig::default()
    };
    let report = run_simulation(config, source(4 * 1024)).unwrap();

    assert!(!report.completed);
    assert_eq!(report.bytes_delivered, 0);
    assert!(report.retransmissions > 0);
    assert_eq!(report.goodput, 0.0);
}

// ---------------------------------------------------------------------------
// Cross-run properties
// ---------------------------------------------------------------------------

#[test]
fn wider_window_beats_narrow_window_on_goodput() {
    let data = source(1024 * 1024);
    let run = |window_size: usize| {
        let config = SimConfig {
            window_size,
            frame_payload_size: 1024,
            file_size: data.len(),
            seed: 7,
            ..SimConfig::default()
        };
        run_simulation(config, data.clone()).unwrap()
    };

    let narrow = run(2);
    let wide = run(32);
    assert!(narrow.completed && wide.completed);
    assert!(
        wide.goodput > narrow.goodput,
        "wide = {}, narrow = {}",
        wide.goodput,
        narrow.goodput
    );
}

#[test]
fn identical_seeds_reproduce_identical_reports() {
    let data = source(64 * 1024);
    let run = || {
        let config = SimConfig {
            window_size: 8,
            frame_payload_size: 1024,
            file_size: data.len(),
            seed: 5,
            ..SimConfig::default()
        };
        run_simulation(config, data.clone()).unwrap()
    };

    let a = run();
    let b = run();
    assert_eq!(a.goodput, b.goodput);
    assert_eq!(a.retransmissions, b.retransmissions);
    assert_eq!(a.total_time, b.total_time);
    assert_eq!(a.frames_sent, b.frames_sent);
}

#[test]
fn goodput_never_exceeds_the_line_rate() {
    let config = SimConfig {
        window_size: 64,
        frame_payload_size: 4096,
        file_size: 512 * 1024,
        seed: 3,
        ..SimConfig::default()
    };
    let bit_rate = config.bit_rate;
    let report = run_simulation(config, source(512 * 1024)).unwrap();

    assert!(report.goodput <= bit_rate / 8.0);
    assert!(report.utilization <= 1.0);
    assert!(report.efficiency <= 1.0);
}

#[test]
fn report_serializes_to_json() {
    let config = SimConfig {
        window_size: 4,
        frame_payload_size: 512,
        file_size: 8 * 1024,
        good_ber: 0.0,
        bad_ber: 0.0,
        ..SimConfig::default()
    };
    let report = run_simulation(config, source(8 * 1024)).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"goodput\""));
    assert!(json.contains("\"completed\":true"));
}
