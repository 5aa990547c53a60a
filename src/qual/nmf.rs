//! Non-negative matrix factorization
//!
//! Multiplicative-update NMF: V ≈ W·H with W (documents × topics) and
//! H (topics × terms) kept non-negative. Initialization is seeded, so
//! repeated runs over the same matrix converge identically; outputs are
//! convergence-equivalent, not bit-exact, across platforms.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

const EPSILON: f64 = 1e-10;

/// NMF configuration.
#[derive(Debug, Clone)]
pub struct NmfConfig {
    /// Number of components (topics).
    pub n_components: usize,
    /// Iteration cap for the multiplicative updates.
    pub max_iter: usize,
    /// Relative reconstruction-error tolerance for early stopping,
    /// checked every 10 iterations.
    pub tol: f64,
    /// Seed for the random factor initialization.
    pub random_seed: u64,
}

impl Default for NmfConfig {
    fn default() -> Self {
        Self {
            n_components: 5,
            max_iter: 300,
            tol: 1e-4,
            random_seed: 42,
        }
    }
}

impl NmfConfig {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            ..Default::default()
        }
    }

    pub fn max_iter(mut self, n: usize) -> Self {
        self.max_iter = n;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}

/// Factorization result.
#[derive(Debug)]
pub struct NmfModel {
    /// Document–topic affinities, documents × components.
    pub w: Array2<f64>,
    /// Topic–term weights, components × terms.
    pub h: Array2<f64>,
}

/// Factorize a non-negative matrix with multiplicative updates.
pub fn factorize(v: &Array2<f64>, config: &NmfConfig) -> NmfModel {
    let (n_docs, n_terms) = v.dim();
    let k = config.n_components.max(1);

    // Scaled absolute-Gaussian init, matching the usual random NMF
    // initialization magnitude sqrt(mean(V) / k).
    let mut rng = StdRng::seed_from_u64(config.random_seed);
    let v_mean = if n_docs * n_terms > 0 {
        v.sum() / (n_docs * n_terms) as f64
    } else {
        0.0
    };
    let scale = (v_mean / k as f64).max(EPSILON).sqrt();
    let mut sample = |rng: &mut StdRng| -> f64 {
        let x: f64 = StandardNormal.sample(rng);
        x.abs() * scale
    };
    let mut w = Array2::from_shape_simple_fn((n_docs, k), || sample(&mut rng));
    let mut h = Array2::from_shape_simple_fn((k, n_terms), || sample(&mut rng));

    let mut last_err = f64::INFINITY;
    for iter in 0..config.max_iter {
        // H <- H * (WᵀV) / (WᵀW H)
        let wt = w.t();
        let numer_h = wt.dot(v);
        let denom_h = wt.dot(&w).dot(&h);
        multiplicative_update(&mut h, &numer_h, &denom_h);

        // W <- W * (V Hᵀ) / (W H Hᵀ)
        let ht = h.t();
        let numer_w = v.dot(&ht);
        let denom_w = w.dot(&h).dot(&ht);
        multiplicative_update(&mut w, &numer_w, &denom_w);

        if (iter + 1) % 10 == 0 {
            let err = frobenius_error(v, &w, &h);
            if last_err.is_finite() && (last_err - err).abs() <= config.tol * last_err.max(EPSILON)
            {
                break;
            }
            last_err = err;
        }
    }

    NmfModel { w, h }
}

fn multiplicative_update(target: &mut Array2<f64>, numer: &Array2<f64>, denom: &Array2<f64>) {
    ndarray::Zip::from(target)
        .and(numer)
        .and(denom)
        .for_each(|t, &n, &d| *t *= n / (d + EPSILON));
}

fn frobenius_error(v: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let approx = w.dot(h);
    (v - &approx).iter().map(|d| d * d).sum::<f64>().sqrt()
}
