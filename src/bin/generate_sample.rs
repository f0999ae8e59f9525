//! Writes synthetic fluorescence recordings for trying out the viewer.
//!
//! Usage: `generate_sample [output_dir]` (defaults to `sample_data`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const N_CELLS: usize = 40;
const N_ROWS: usize = 300;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
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

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One cell's trace: a baseline plus a fluorescence peak over the recorded
/// fraction of the file, zero-padded after the cell stops recording.
fn generate_trace(peak_pos: f64, amplitude: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let recorded = rng.range(0.5, 1.0);
    let len = ((N_ROWS as f64) * recorded).round() as usize;
    let baseline = rng.range(80.0, 120.0);
    (0..N_ROWS)
        .map(|i| {
            if i >= len {
                return 0.0;
            }
            let t = i as f64 / (len - 1).max(1) as f64;
            let signal = baseline
                + gaussian(t, peak_pos + rng.gauss(0.0, 0.03), 0.12, amplitude)
                + rng.gauss(0.0, 4.0);
            // Strictly positive so only the padded tail reads as "no data".
            signal.max(1.0)
        })
        .collect()
}

fn write_recording(path: &Path, ids: &[String], traces: &[Vec<f64>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(ids)?;
    for row in 0..N_ROWS {
        writer.write_record(traces.iter().map(|t| format!("{:.3}", t[row])))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // (label, peak position on the normalised timeline, peak amplitude)
    let conditions = [("control", 0.4, 300.0), ("treated", 0.6, 550.0)];

    for (label, peak_pos, amplitude) in conditions {
        let mut ids: Vec<String> = (1..=N_CELLS).map(|i| i.to_string()).collect();
        if label == "treated" {
            // Exercise the invalid-identifier path of the loader.
            ids[N_CELLS - 1] = "cell?".to_string();
        }

        let traces: Vec<Vec<f64>> = (0..N_CELLS)
            .map(|_| generate_trace(peak_pos, amplitude * rng.range(0.7, 1.3), &mut rng))
            .collect();

        let path = out_dir.join(format!("sample_run1_{label}_data.tsv"));
        write_recording(&path, &ids, &traces)?;
        log::info!("Wrote {} cells to {}", N_CELLS, path.display());
        println!("Wrote {}", path.display());
    }

    Ok(())
}
