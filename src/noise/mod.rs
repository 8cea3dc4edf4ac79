//! Seeded noise and random number generation.
//!
//! Everything in this module is deterministic: the same seed produces the
//! same sequence of values on every platform and every run. That contract is
//! what makes generations reproducible, so all arithmetic here stays in
//! `u32`/`f32` — no `f64` intermediates, no platform-dependent library calls.

/// Mulberry32 pseudo-random number generator.
///
/// A small 32-bit generator with good statistical quality for procedural
/// content. One instance lives per sandbox execution, seeded by the
/// generation seed, so `random()` streams never leak state between layers.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the generator and returns the next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        z ^ (z >> 14)
    }

    /// Next value uniformly distributed in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits fit a f32 mantissa exactly, so 1.0 is unreachable
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }
}

// ============================================================================
// Lattice hashing
// ============================================================================

fn mix(mut h: u32) -> u32 {
    h = (h ^ (h >> 13)).wrapping_mul(0x27D4_EB2F);
    h ^ (h >> 16)
}

/// Hash of a 2D lattice point to `[-1, 1]`.
fn hash2(seed: u32, x: i32, y: i32) -> f32 {
    let h = mix(
        seed ^ (x as u32).wrapping_mul(0x85EB_CA6B) ^ (y as u32).wrapping_mul(0xC2B2_AE35),
    );
    h as f32 * (2.0 / 4_294_967_296.0) - 1.0
}

/// Hash of a 3D lattice point to `[-1, 1]`.
fn hash3(seed: u32, x: i32, y: i32, z: i32) -> f32 {
    let h = mix(
        seed ^ (x as u32).wrapping_mul(0x85EB_CA6B)
            ^ (y as u32).wrapping_mul(0xC2B2_AE35)
            ^ (z as u32).wrapping_mul(0x9E37_79B9),
    );
    h as f32 * (2.0 / 4_294_967_296.0) - 1.0
}

/// Smoothstep fade `t² · (3 − 2t)`.
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ============================================================================
// Value noise
// ============================================================================

/// 2D value noise in `[-1, 1]`.
#[must_use]
pub fn noise2(seed: u32, x: f32, y: f32) -> f32 {
    let xf = x.floor();
    let yf = y.floor();
    let xi = xf as i32;
    let yi = yf as i32;
    let tx = fade(x - xf);
    let ty = fade(y - yf);

    let c00 = hash2(seed, xi, yi);
    let c10 = hash2(seed, xi + 1, yi);
    let c01 = hash2(seed, xi, yi + 1);
    let c11 = hash2(seed, xi + 1, yi + 1);

    lerp(lerp(c00, c10, tx), lerp(c01, c11, tx), ty)
}

/// 3D value noise in `[-1, 1]`.
#[must_use]
pub fn noise3(seed: u32, x: f32, y: f32, z: f32) -> f32 {
    let xf = x.floor();
    let yf = y.floor();
    let zf = z.floor();
    let xi = xf as i32;
    let yi = yf as i32;
    let zi = zf as i32;
    let tx = fade(x - xf);
    let ty = fade(y - yf);
    let tz = fade(z - zf);

    let c000 = hash3(seed, xi, yi, zi);
    let c100 = hash3(seed, xi + 1, yi, zi);
    let c010 = hash3(seed, xi, yi + 1, zi);
    let c110 = hash3(seed, xi + 1, yi + 1, zi);
    let c001 = hash3(seed, xi, yi, zi + 1);
    let c101 = hash3(seed, xi + 1, yi, zi + 1);
    let c011 = hash3(seed, xi, yi + 1, zi + 1);
    let c111 = hash3(seed, xi + 1, yi + 1, zi + 1);

    let bottom = lerp(lerp(c000, c100, tx), lerp(c010, c110, tx), ty);
    let top = lerp(lerp(c001, c101, tx), lerp(c011, c111, tx), ty);
    lerp(bottom, top, tz)
}

// ============================================================================
// Fractal Brownian motion
// ============================================================================

/// Octave parameters for [`fbm2`] / [`fbm3`].
#[derive(Debug, Clone, Copy)]
pub struct FbmParams {
    pub octaves: u32,
    /// Amplitude decay per octave
    pub gain: f32,
    /// Frequency growth per octave
    pub lacunarity: f32,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            gain: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// 2D fractal Brownian motion in `[-1, 1]`.
///
/// Octaves are normalized by the amplitude sum so the range stays stable
/// regardless of octave count. A degenerate amplitude sum (zero octaves or
/// non-finite gain) yields 0 rather than dividing by zero.
#[must_use]
pub fn fbm2(seed: u32, x: f32, y: f32, params: FbmParams) -> f32 {
    let mut sum = 0.0_f32;
    let mut amplitude = 1.0_f32;
    let mut frequency = 1.0_f32;
    let mut total = 0.0_f32;

    for _ in 0..params.octaves {
        sum += noise2(seed, x * frequency, y * frequency) * amplitude;
        total += amplitude;
        amplitude *= params.gain;
        frequency *= params.lacunarity;
    }

    if total > 0.0 && sum.is_finite() {
        sum / total
    } else {
        0.0
    }
}

/// 3D fractal Brownian motion in `[-1, 1]`.
#[must_use]
pub fn fbm3(seed: u32, x: f32, y: f32, z: f32, params: FbmParams) -> f32 {
    let mut sum = 0.0_f32;
    let mut amplitude = 1.0_f32;
    let mut frequency = 1.0_f32;
    let mut total = 0.0_f32;

    for _ in 0..params.octaves {
        sum += noise3(seed, x * frequency, y * frequency, z * frequency) * amplitude;
        total += amplitude;
        amplitude *= params.gain;
        frequency *= params.lacunarity;
    }

    if total > 0.0 && sum.is_finite() {
        sum / total
    } else {
        0.0
    }
}
