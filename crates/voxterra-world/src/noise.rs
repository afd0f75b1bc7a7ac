//! Deterministic coherent noise.
//!
//! Every sampler is a pure function of its seed and coordinates. Built on the
//! `noise` crate's Perlin primitive; the shapes below are derived from it.

use ::noise::{NoiseFn, Perlin};

use crate::WorldSeed;

/// Mix a 64-bit value (splitmix64 finalizer).
#[inline]
pub const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Derive an independent sub-seed for a purpose.
#[inline]
pub const fn derive_seed(seed: WorldSeed, purpose: u64) -> WorldSeed {
    mix64(seed ^ mix64(purpose.wrapping_add(0x9e37_79b9_7f4a_7c15)))
}

/// Hash integer lattice coordinates with a seed and salt.
#[inline]
pub const fn hash2(seed: WorldSeed, x: i64, z: i64, salt: u64) -> u64 {
    let mut h = derive_seed(seed, salt);
    h = mix64(h ^ (x as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    mix64(h ^ (z as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f))
}

/// FNV-1a over a string id; stable across runs and platforms.
pub fn str_hash(id: &str) -> u64 {
    id.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Hash mapped to `[0, 1)`.
#[inline]
pub fn hash_unit(seed: WorldSeed, x: i64, z: i64, salt: u64) -> f64 {
    (hash2(seed, x, z, salt) >> 11) as f64 / (1u64 << 53) as f64
}

/// Clamp non-positive or non-finite scales to 1.
#[inline]
pub fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Shape applied to each octave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoiseShape {
    /// Raw coherent noise.
    #[default]
    Plain,
    /// Average of three offset samples; softer than plain.
    SimplexLike,
    /// `(1 - |n|)^2`; sharp crests, range `[0, 1]`.
    Ridged,
    /// `|n| * 2 - 1`; rounded bumps.
    Billow,
    /// Distance to the nearest jittered cell point.
    Cellular,
}

/// Parameters for a fractal sum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fractal {
    /// World units per noise period at the first octave.
    pub scale: f64,
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    pub shape: NoiseShape,
}

impl Fractal {
    pub const fn new(scale: f64, octaves: u32, persistence: f64, shape: NoiseShape) -> Self {
        Self {
            scale,
            octaves,
            persistence,
            shape,
        }
    }
}

const SIMPLEX_OFFSETS: [[f64; 2]; 3] = [[0.0, 0.0], [31.416, -17.32], [-47.91, 59.27]];

/// Seeded noise channel.
///
/// Channels with different `channel` values are decorrelated both through
/// the Perlin seed and a coordinate offset.
#[derive(Clone, Debug)]
pub struct NoiseSampler {
    seed: WorldSeed,
    perlin: Perlin,
    offset: [f64; 2],
}

impl NoiseSampler {
    pub fn new(seed: WorldSeed, channel: u64) -> Self {
        let sub = derive_seed(seed, channel);
        let offset = [
            (sub & 0xffff) as f64 + 0.5137,
            ((sub >> 16) & 0xffff) as f64 + 0.2719,
        ];
        Self {
            seed: sub,
            perlin: Perlin::new(sub as u32),
            offset,
        }
    }

    /// Raw Perlin sample in noise space, clamped to `[-1, 1]`.
    #[inline]
    fn raw(&self, x: f64, z: f64) -> f64 {
        self.perlin
            .get([x + self.offset[0], z + self.offset[1]])
            .clamp(-1.0, 1.0)
    }

    fn shaped(&self, x: f64, z: f64, shape: NoiseShape) -> f64 {
        match shape {
            NoiseShape::Plain => self.raw(x, z),
            NoiseShape::SimplexLike => {
                SIMPLEX_OFFSETS
                    .iter()
                    .map(|[ox, oz]| self.raw(x + ox, z + oz))
                    .sum::<f64>()
                    / 3.0
            }
            NoiseShape::Ridged => {
                let r = 1.0 - self.raw(x, z).abs();
                r * r
            }
            NoiseShape::Billow => self.raw(x, z).abs() * 2.0 - 1.0,
            NoiseShape::Cellular => self.cellular(x, z),
        }
    }

    /// Plain 2D sample at a world position.
    pub fn sample(&self, x: f64, z: f64, scale: f64) -> f64 {
        let scale = sanitize_scale(scale);
        self.raw(x / scale, z / scale)
    }

    /// Cell noise in noise space: distance to the nearest per-cell point,
    /// mapped to `[-1, 1]`.
    fn cellular(&self, x: f64, z: f64) -> f64 {
        let (cx, cz) = (x.floor() as i64, z.floor() as i64);
        let mut nearest = f64::MAX;
        for dz in -1..=1 {
            for dx in -1..=1 {
                let (gx, gz) = (cx + dx, cz + dz);
                let px = gx as f64 + hash_unit(self.seed, gx, gz, 1);
                let pz = gz as f64 + hash_unit(self.seed, gx, gz, 2);
                let d = (px - x).hypot(pz - z);
                nearest = nearest.min(d);
            }
        }
        (nearest.min(1.0) * 2.0 - 1.0).clamp(-1.0, 1.0)
    }

    /// Fractal sum normalized by the total amplitude.
    pub fn fractal(&self, x: f64, z: f64, params: &Fractal) -> f64 {
        let scale = sanitize_scale(params.scale);
        let (mut total, mut amplitude, mut frequency, mut norm) = (0.0, 1.0, 1.0, 0.0);
        for _ in 0..params.octaves.max(1) {
            total += self.shaped(x / scale * frequency, z / scale * frequency, params.shape) * amplitude;
            norm += amplitude;
            amplitude *= params.persistence;
            frequency *= 2.0;
        }
        total / norm
    }

    /// Cheap 3D sample: mean of the `xy`, `yz` and `xz` plane samples.
    ///
    /// Not isotropic; fine for cave carving.
    pub fn sample3(&self, x: f64, y: f64, z: f64, scale: f64) -> f64 {
        let scale = sanitize_scale(scale);
        let (x, y, z) = (x / scale, y / scale, z / scale);
        (self.raw(x, y) + self.raw(y + 101.3, z) + self.raw(x - 57.9, z + 13.1)) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SHAPES: [NoiseShape; 5] = [
        NoiseShape::Plain,
        NoiseShape::SimplexLike,
        NoiseShape::Ridged,
        NoiseShape::Billow,
        NoiseShape::Cellular,
    ];

    #[test]
    fn same_seed_same_values() {
        let a = NoiseSampler::new(12345, 3);
        let b = NoiseSampler::new(12345, 3);
        for shape in SHAPES {
            let params = Fractal::new(64.0, 4, 0.5, shape);
            for i in 0..50 {
                let (x, z) = (f64::from(i) * 13.7, f64::from(i) * -7.1);
                assert_eq!(a.fractal(x, z, &params).to_bits(), b.fractal(x, z, &params).to_bits());
            }
        }
    }

    #[test]
    fn channels_are_decorrelated() {
        let a = NoiseSampler::new(7, 1);
        let b = NoiseSampler::new(7, 2);
        let differing = (0..100)
            .filter(|&i| {
                let x = f64::from(i) * 9.3;
                (a.sample(x, x * 0.5, 50.0) - b.sample(x, x * 0.5, 50.0)).abs() > 1e-9
            })
            .count();
        assert!(differing > 90);
    }

    #[test]
    fn outputs_stay_in_range() {
        let sampler = NoiseSampler::new(99, 0);
        for shape in SHAPES {
            let params = Fractal::new(32.0, 5, 0.6, shape);
            for i in -200..200 {
                let v = sampler.fractal(f64::from(i) * 3.3, f64::from(i) * 1.7, &params);
                assert!((-1.0..=1.0).contains(&v), "{shape:?} gave {v}");
            }
        }
        for i in -100..100 {
            let v = sampler.sample3(f64::from(i), f64::from(i) * 0.3, f64::from(i) * 2.0, 20.0);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn bad_scale_is_clamped_to_one() {
        let sampler = NoiseSampler::new(5, 0);
        assert_relative_eq!(sampler.sample(3.3, 4.4, 0.0), sampler.sample(3.3, 4.4, 1.0));
        assert_relative_eq!(sampler.sample(3.3, 4.4, -8.0), sampler.sample(3.3, 4.4, 1.0));
        assert_relative_eq!(sanitize_scale(f64::NAN), 1.0);
    }

    #[test]
    fn hash_unit_is_uniformish() {
        let mean = (0..1000)
            .map(|i| hash_unit(42, i, -i, 9))
            .sum::<f64>()
            / 1000.0;
        assert!((mean - 0.5).abs() < 0.05);
        assert_eq!(hash2(1, 2, 3, 4), hash2(1, 2, 3, 4));
        assert_ne!(hash2(1, 2, 3, 4), hash2(1, 3, 2, 4));
    }
}
