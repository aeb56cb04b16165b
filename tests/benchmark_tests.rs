//! Performance benchmarks for the protocol hot paths

use shared::{InputCmd, LineBuffer, PlayerState, ServerMessage};
use std::time::Instant;

fn sample_players(count: u32) -> Vec<PlayerState> {
    (0..count)
        .map(|i| PlayerState {
            id: i,
            x: i as f32 * 3.5,
            y: i as f32 * -1.25,
            dx: 0,
            dy: 0,
        })
        .collect()
}

/// Benchmarks snapshot encoding, the record produced once per tick.
#[test]
fn benchmark_snapshot_encode() {
    let msg = ServerMessage::State {
        players: sample_players(32),
    };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = shared::encode(&msg).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encode (32 players): {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds for 10k iterations
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks snapshot decoding, the per-record cost of the client read loop.
#[test]
fn benchmark_snapshot_decode() {
    let line = shared::encode(&ServerMessage::State {
        players: sample_players(32),
    })
    .unwrap();
    let record = line.trim_end().as_bytes();

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _: ServerMessage = shared::decode(record).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot decode (32 players): {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks stream framing across fragmented delivery.
#[test]
fn benchmark_frame_splitting() {
    let line = shared::encode(&InputCmd { dx: 5, dy: -5 }).unwrap();
    let chunk: Vec<u8> = line.as_bytes().repeat(100);

    let iterations = 1_000;
    let start = Instant::now();
    let mut records = 0usize;

    for _ in 0..iterations {
        let mut lines = LineBuffer::new();
        for piece in chunk.chunks(7) {
            lines.extend(piece);
            while lines.next_record().is_some() {
                records += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Frame splitting: {} records in {:?} ({:.2} ns/record)",
        records,
        duration,
        duration.as_nanos() as f64 / records as f64
    );

    assert_eq!(records, 100 * iterations);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks registry input integration, the per-record server cost.
#[test]
fn benchmark_input_integration() {
    use server::registry::Registry;

    let mut registry = Registry::new(None);
    let ids: Vec<u32> = (0..16).map(|_| registry.add_player()).collect();

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let id = ids[i % ids.len()];
        registry.apply_input(id, 5, -5);
    }

    let duration = start.elapsed();
    println!(
        "Input integration: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks snapshot production from a populated registry.
#[test]
fn benchmark_snapshot_build() {
    use server::registry::Registry;

    let mut registry = Registry::new(None);
    for _ in 0..64 {
        registry.add_player();
    }

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 64);
    }

    let duration = start.elapsed();
    println!(
        "Snapshot build (64 players): {} iterations in {:?} ({:.2} µs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}
