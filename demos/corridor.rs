//! # Corridor: feature discovery under a conjunctive reward
//!
//! A point drifts along a unit corridor (dim 0) while carrying a "key" signal
//! (dim 1). Reaching the far end pays +1 only while holding the key, so the
//! value function depends on the conjunction of both dimensions. A linear TD(0)
//! learner starts with no features and lets the engine grow them.
//!
//! ```bash
//! RUST_LOG=kifdd_core=debug cargo run --example corridor
//! ```

use kifdd_core::{DiscoveryConfig, DiscoveryEngine, Kernel, Sparsification};
use tracing_subscriber::EnvFilter;

const EPISODES: usize = 400;
const GAMMA: f64 = 0.95;
const ALPHA: f64 = 0.2;

/// Deterministic pseudo-random stream (64-bit LCG), uniform in [0, 1).
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn dot(w: &[f64], phi: &[f64]) -> f64 {
    w.iter().zip(phi).map(|(a, b)| a * b).sum()
}

fn bar(v: f64) -> String {
    let filled = (v.clamp(0.0, 1.0) * 20.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Kernelized iFDD: corridor with a key, {} episodes         ║", EPISODES);
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let config = DiscoveryConfig {
        activation_threshold: 0.1,
        discovery_threshold: 0.6,
        kernel: Kernel::Gaussian,
        widths: vec![0.15, 0.5],
        sparsification: Sparsification::from_level(2),
        max_neighbor_similarity: 0.6,
        max_active_neighbors: 2,
        normalization: true,
    };
    let mut engine = DiscoveryEngine::new(config)?;
    let mut weights: Vec<f64> = Vec::new();
    let mut rng = Lcg(2024);

    for episode in 0..EPISODES {
        let key = if rng.next() < 0.5 { 1.0 } else { 0.0 };
        let mut state = [0.0, key];
        let mut phi = engine.phi(&state)?;

        for _ in 0..60 {
            let action = usize::from(rng.next() < 0.7);
            let step = if action == 1 { 0.08 } else { -0.04 };
            let next = [(state[0] + step).clamp(0.0, 1.0), key];
            let terminal = next[0] >= 1.0;
            let reward = if terminal && key > 0.5 { 1.0 } else { 0.0 };

            weights.resize(engine.feature_count(), 0.0);
            let next_phi = engine.phi(&next)?;
            let bootstrap = if terminal { 0.0 } else { GAMMA * dot(&weights, &next_phi) };
            let td_error = reward + bootstrap - dot(&weights, &phi);

            for (w, f) in weights.iter_mut().zip(&phi) {
                *w += ALPHA * td_error * f;
            }
            engine.discover(&state, action, td_error, &phi)?;

            if terminal {
                break;
            }
            state = next;
            phi = engine.phi(&state)?;
        }

        if (episode + 1) % 100 == 0 {
            let refined = engine.features().filter(|f| !f.is_base()).count();
            println!(
                "  episode {:>4}: {:>3} features ({:>2} refined), {:>3} candidates",
                episode + 1,
                engine.feature_count(),
                refined,
                engine.candidate_count()
            );
        }
    }

    weights.resize(engine.feature_count(), 0.0);
    println!("\n▶  Learned value near the goal\n");
    for (label, key) in [("with key   ", 1.0), ("without key", 0.0)] {
        let v = dot(&weights, &engine.phi(&[0.95, key])?);
        println!("  {}  {}  {:+.3}", label, bar(v), v);
    }

    println!("\n▶  Refined features\n");
    for (id, f) in engine.features().enumerate().filter(|(_, f)| !f.is_base()) {
        let centre: Vec<String> = f.dims.iter().map(|&d| format!("{:.2}", f.center[d])).collect();
        println!(
            "  #{:<3} dims {:?} identity {} centre [{}]",
            id,
            f.dims,
            f.identity,
            centre.join(", ")
        );
    }
    Ok(())
}
