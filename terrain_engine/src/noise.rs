//! 2D gradient noise backends feeding the height field.
//!
//! All backends return values in `[-1, 1]` and are pure once constructed: the
//! same instance always maps the same input to the same output.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub trait NoiseSource: Send + Sync {
    fn noise(&self, x: f32, z: f32) -> f32;
}

/// Skew factor `(sqrt(3) - 1) / 2`.
const F2: f32 = 0.366_025_42;
/// Unskew factor `(3 - sqrt(3)) / 6`.
const G2: f32 = 0.211_324_87;
const NORMALIZE: f32 = 70.0;

// xz gradients, y column unused in 2D.
const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Simplex-style 2D noise over a randomly shuffled permutation table.
#[derive(Clone)]
pub struct SimplexNoise {
    perm: [u8; 512],
}

impl SimplexNoise {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(rng);
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(&mut StdRng::seed_from_u64(seed))
    }

    #[inline]
    fn gradient_index(&self, i: usize, j: usize) -> usize {
        self.perm[i + self.perm[j] as usize] as usize % 12
    }

    #[inline]
    fn corner(gi: usize, dx: f32, dy: f32) -> f32 {
        let t = 0.5 - dx * dx - dy * dy;
        if t < 0.0 {
            return 0.0;
        }
        let t2 = t * t;
        let g = GRAD3[gi];
        t2 * t2 * (g[0] * dx + g[1] * dy)
    }
}

impl NoiseSource for SimplexNoise {
    fn noise(&self, x: f32, z: f32) -> f32 {
        let s = (x + z) * F2;
        let i = (x + s).floor();
        let j = (z + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = z - (j - t);

        // lower or upper triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1usize, 0usize) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i32 & 255) as usize;
        let jj = (j as i32 & 255) as usize;

        let n0 = Self::corner(self.gradient_index(ii, jj), x0, y0);
        let n1 = Self::corner(self.gradient_index(ii + i1, jj + j1), x1, y1);
        let n2 = Self::corner(self.gradient_index(ii + 1, jj + 1), x2, y2);

        (NORMALIZE * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }
}

/// Zero everywhere. Leaves only the analytic parts of the height formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatNoise;

impl NoiseSource for FlatNoise {
    fn noise(&self, _x: f32, _z: f32) -> f32 {
        0.0
    }
}

/// OpenSimplex2 from `fastnoise-lite`, frequency fixed at 1 so callers scale
/// coordinates the same way as for [`SimplexNoise`].
pub struct FastNoise {
    inner: FastNoiseLite,
}

impl FastNoise {
    pub fn with_seed(seed: i32) -> Self {
        let mut inner = FastNoiseLite::with_seed(seed);
        inner.set_noise_type(Some(NoiseType::OpenSimplex2));
        inner.set_frequency(Some(1.0));
        Self { inner }
    }
}

impl NoiseSource for FastNoise {
    fn noise(&self, x: f32, z: f32) -> f32 {
        self.inner.get_noise_2d(x, z).clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NoiseBackend {
    #[default]
    Simplex,
    FastNoise,
    Flat,
}

impl NoiseBackend {
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Box<dyn NoiseSource> {
        match self {
            NoiseBackend::Simplex => Box::new(SimplexNoise::new(rng)),
            NoiseBackend::FastNoise => Box::new(FastNoise::with_seed(rng.gen())),
            NoiseBackend::Flat => Box::new(FlatNoise),
        }
    }
}
