use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use haptic_core::{DerivativeEstimator, HistoryBuffer};

// Sine position trace with additive white noise
fn synth_trace(n: usize, noise_amp: f64, seed: u32) -> Vec<[f64; 3]> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / 1000.0;
            let s = (t * std::f64::consts::TAU).sin();
            [0, 1, 2].map(|_| s + (next_f64() * 2.0 - 1.0) * noise_amp)
        })
        .collect()
}

pub fn bench_cycle(c: &mut Criterion) {
    let mut g = c.benchmark_group("estimator_cycle");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p haptic_core --bench estimator
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_trace(4_096, 0.02, 0xC0FFEE);

    for &n in &[10usize, 50, 200] {
        let est = DerivativeEstimator::new(0.001, n).expect("basis");
        g.bench_function(format!("push_estimate_n{n}"), |b| {
            b.iter_batched(
                || HistoryBuffer::new(n),
                |mut h| {
                    for s in &trace {
                        h.push(*s);
                        black_box(est.estimate_all(black_box(&h)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

pub fn bench_setup(c: &mut Criterion) {
    c.bench_function("pseudoinverse_n10", |b| {
        b.iter(|| DerivativeEstimator::new(black_box(0.001), black_box(10)))
    });
}

criterion_group!(estimator, bench_cycle, bench_setup);
criterion_main!(estimator);
