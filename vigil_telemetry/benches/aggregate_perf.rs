//! Benchmark the windowed summarization hot path.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use vigil_common::telemetry::{SensorReading, VibrationSample};
use vigil_telemetry::{DataAggregator, SafetyRegistry};

fn synthetic_reading(rng: &mut StdRng, device: &str, ts_ms: i64) -> SensorReading {
    SensorReading {
        timestamp_ms: ts_ms,
        device_id: device.to_string(),
        motor_currents: (0..3).map(|_| rng.gen_range(3.0..6.0)).collect(),
        vibration: VibrationSample {
            x: rng.gen_range(-1.0..1.0),
            y: rng.gen_range(-1.0..1.0),
            z: rng.gen_range(-1.0..1.0),
            magnitude: rng.gen_range(0.5..2.5),
        },
        temperatures: (0..2).map(|_| rng.gen_range(40.0..50.0)).collect(),
    }
}

fn bench_aggregate(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let agg = DataAggregator::new(10, 1000, Arc::new(SafetyRegistry::new()));

    // A full ring: 1000 readings spread over the last 8 seconds.
    let now = 1_000_000.0;
    for i in 0..1000 {
        let ts_ms = ((now - 8.0) * 1000.0) as i64 + i * 8;
        agg.add_reading_at(synthetic_reading(&mut rng, "bench-device", ts_ms), now);
    }

    c.bench_function("aggregate_full_ring", |b| {
        b.iter(|| {
            agg.aggregate_at("bench-device", None, now)
                .unwrap()
                .unwrap()
        })
    });

    c.bench_function("aggregate_narrow_window", |b| {
        b.iter(|| agg.aggregate_at("bench-device", Some(1), now).unwrap())
    });
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
