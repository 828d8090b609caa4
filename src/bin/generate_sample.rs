use std::path::PathBuf;

use anyhow::{Context, Result};

const SAMPLE_RATE_HZ: f64 = 250.0;
const DURATION_S: f64 = 60.0;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// One PQRST complex as (offset from R [s], width [s], amplitude [uV]).
const COMPLEX: [(f64, f64, f64); 5] = [
    (-0.20, 0.025, 150.0),
    (-0.04, 0.010, -120.0),
    (0.00, 0.012, 1200.0),
    (0.04, 0.010, -250.0),
    (0.25, 0.040, 300.0),
];

fn ecg_sample(t: f64, beats: &[f64]) -> f64 {
    beats
        .iter()
        .filter(|&&r| (t - r).abs() < 0.5)
        .flat_map(|&r| {
            COMPLEX
                .iter()
                .map(move |&(offset, sigma, amp)| gaussian(t, r + offset, sigma, amp))
        })
        .sum()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_ecg.csv"));
    let mut rng = SimpleRng::new(42);

    // R peaks at ~72 bpm with some beat-to-beat jitter.
    let mut beats = Vec::new();
    let mut t = 0.4;
    while t < DURATION_S - 0.4 {
        beats.push(t);
        t += rng.gauss(60.0 / 72.0, 0.04);
    }

    let n = (DURATION_S * SAMPLE_RATE_HZ) as usize;
    let r_rows: Vec<usize> = beats
        .iter()
        .map(|&r| (r * SAMPLE_RATE_HZ).round() as usize)
        .collect();

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    writer.write_record(["timestamp [ms]", "ECG [uV]", "Label: N"])?;
    for row in 0..n {
        let t = row as f64 / SAMPLE_RATE_HZ;
        let wander = 80.0 * (2.0 * std::f64::consts::PI * 0.25 * t).sin();
        let value = ecg_sample(t, &beats) + wander + rng.gauss(0.0, 15.0);
        // Every other beat is pre-annotated so there is something to correct.
        let annotated = r_rows
            .iter()
            .position(|&r| r == row)
            .is_some_and(|i| i % 2 == 0);
        writer.write_record([
            format!("{:.1}", t * 1000.0),
            format!("{value:.2}"),
            if annotated { "1".to_string() } else { String::new() },
        ])?;
    }
    writer.flush()?;

    println!(
        "Wrote {n} samples ({} beats) to {}",
        beats.len(),
        output_path.display()
    );
    Ok(())
}
