//! Day/night cycle: sky color, light intensity and sun/moon placement as pure
//! functions of the normalized progress through the period.

use std::f32::consts::TAU;

use glam::Vec3;

pub const DEFAULT_PERIOD_SECS: f32 = 30.0;
pub const CELESTIAL_RADIUS: f32 = 100.0;

pub const DAY_SKY: [f32; 3] = [0.53, 0.81, 0.92];
pub const NIGHT_SKY: [f32; 3] = [0.05, 0.05, 0.1];
pub const NIGHT_INTENSITY: f32 = 0.05;

const DAWN_END: f32 = 0.25;
const DUSK_START: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dawn,
    Day,
    Dusk,
}

impl Phase {
    pub fn from_progress(progress: f32) -> Self {
        if progress < DAWN_END {
            Phase::Dawn
        } else if progress < DUSK_START {
            Phase::Day
        } else {
            Phase::Dusk
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Dawn => "dawn",
            Phase::Day => "day",
            Phase::Dusk => "dusk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celestial {
    Sun,
    Moon,
}

impl Celestial {
    pub fn color(self) -> [f32; 4] {
        match self {
            Celestial::Sun => [1.0, 0.9, 0.4, 1.0],
            Celestial::Moon => [0.85, 0.87, 0.95, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSample {
    pub progress: f32,
    pub phase: Phase,
    pub sky_color: [f32; 3],
    pub light_intensity: f32,
    pub celestial_angle: f32,
    pub celestial_position: Vec3,
    pub celestial: Celestial,
}

/// Normalized position in the period, always in [0, 1)
pub fn progress(elapsed: f32, period: f32) -> f32 {
    let p = elapsed.rem_euclid(period) / period;
    // rem_euclid can round up to exactly `period` for tiny negative inputs
    if p >= 1.0 { 0.0 } else { p }
}

pub fn sky_color(progress: f32) -> [f32; 3] {
    let lerp = |f: f32| -> [f32; 3] {
        let mut c = [0.0; 3];
        for i in 0..3 {
            c[i] = NIGHT_SKY[i] + (DAY_SKY[i] - NIGHT_SKY[i]) * f;
        }
        c
    };
    match Phase::from_progress(progress) {
        Phase::Dawn => lerp(progress * 4.0),
        Phase::Day => DAY_SKY,
        Phase::Dusk => {
            let mut c = lerp(1.0 - (progress - DUSK_START) * 4.0);
            for i in 0..3 {
                c[i] = c[i].max(NIGHT_SKY[i]);
            }
            c
        }
    }
}

pub fn light_intensity(progress: f32) -> f32 {
    match Phase::from_progress(progress) {
        Phase::Dawn => (progress * 4.0).max(NIGHT_INTENSITY),
        Phase::Day => 1.0,
        Phase::Dusk => (1.0 - (progress - DUSK_START) * 4.0).max(NIGHT_INTENSITY),
    }
}

pub fn celestial_position(progress: f32) -> Vec3 {
    let angle = progress * TAU;
    Vec3::new(angle.cos() * CELESTIAL_RADIUS, angle.sin() * CELESTIAL_RADIUS, 0.0)
}

pub fn sample(progress: f32) -> CycleSample {
    CycleSample {
        progress,
        phase: Phase::from_progress(progress),
        sky_color: sky_color(progress),
        light_intensity: light_intensity(progress),
        celestial_angle: progress * TAU,
        celestial_position: celestial_position(progress),
        celestial: if progress < 0.5 { Celestial::Sun } else { Celestial::Moon },
    }
}

/// Cycle driver. Sky color and intensity are recomputed at most once per
/// `lighting_refresh`; the celestial body moves on every update.
#[derive(Debug, Clone)]
pub struct DayNightCycle {
    pub period: f32,
    pub lighting_refresh: f32,
    last_lighting_at: Option<f32>,
    current: CycleSample,
}

impl DayNightCycle {
    pub fn new(period: f32, lighting_refresh: f32) -> Self {
        Self {
            period,
            lighting_refresh,
            last_lighting_at: None,
            current: sample(0.0),
        }
    }

    pub fn sample_at(&self, elapsed: f32) -> CycleSample {
        sample(progress(elapsed, self.period))
    }

    pub fn update(&mut self, elapsed: f32) -> CycleSample {
        let p = progress(elapsed, self.period);

        let stale = match self.last_lighting_at {
            None => true,
            Some(at) => (elapsed - at).abs() >= self.lighting_refresh,
        };
        if stale {
            self.current.sky_color = sky_color(p);
            self.current.light_intensity = light_intensity(p);
            self.current.phase = Phase::from_progress(p);
            self.last_lighting_at = Some(elapsed);
        }

        self.current.progress = p;
        self.current.celestial_angle = p * TAU;
        self.current.celestial_position = celestial_position(p);
        self.current.celestial = if p < 0.5 { Celestial::Sun } else { Celestial::Moon };
        self.current
    }

    pub fn current(&self) -> &CycleSample {
        &self.current
    }
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_SECS, 0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn progress_stays_in_unit_interval() {
        for i in -200..2000 {
            let t = i as f32 * 0.173;
            let p = progress(t, DEFAULT_PERIOD_SECS);
            assert!((0.0..1.0).contains(&p), "t={t} p={p}");
        }
        assert!((0.0..1.0).contains(&progress(-1e-9, DEFAULT_PERIOD_SECS)));
    }

    #[test]
    fn progress_wraps_at_period_boundary() {
        let period = DEFAULT_PERIOD_SECS;
        for k in 1..4 {
            let boundary = k as f32 * period;
            let before = progress(boundary - 1e-3, period);
            let after = progress(boundary + 1e-3, period);
            // the wrap 1 -> 0 is the same point on the cycle
            assert!(1.0 - before < EPS && after < EPS);
            let pos_before = celestial_position(before);
            let pos_after = celestial_position(after);
            assert!((pos_before - pos_after).length() < 0.1);
        }
    }

    #[test]
    fn intensity_is_continuous_at_band_edges() {
        for edge in [0.25f32, 0.75] {
            let below = light_intensity(edge - 1e-4);
            let above = light_intensity(edge + 1e-4);
            assert!((below - above).abs() < EPS, "edge {edge}: {below} vs {above}");
            assert!((below - 1.0).abs() < EPS);
        }
        let end = light_intensity(1.0 - 1e-4);
        let start = light_intensity(0.0);
        assert!((end - start).abs() < EPS, "wrap: {end} vs {start}");
    }

    #[test]
    fn sky_is_continuous_and_floored() {
        for edge in [0.25f32, 0.75] {
            let a = sky_color(edge - 1e-4);
            let b = sky_color(edge + 1e-4);
            for i in 0..3 {
                assert!((a[i] - b[i]).abs() < EPS);
            }
        }
        let night = sky_color(0.9999);
        for i in 0..3 {
            assert!(night[i] >= NIGHT_SKY[i]);
            assert!((night[i] - sky_color(0.0)[i]).abs() < EPS);
        }
        assert_eq!(sky_color(0.5), DAY_SKY);
    }

    #[test]
    fn celestial_orbit_and_tint() {
        let noon = sample(0.25);
        assert!((noon.celestial_position - Vec3::new(0.0, 100.0, 0.0)).length() < 1e-3);
        assert_eq!(noon.celestial, Celestial::Sun);
        assert_eq!(sample(0.5).celestial, Celestial::Moon);
        assert_eq!(sample(0.4999).celestial, Celestial::Sun);
        assert!((sample(0.0).celestial_position - Vec3::new(100.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn lighting_is_throttled_but_orbit_is_not() {
        let mut cycle = DayNightCycle::new(30.0, 0.1);
        let first = cycle.update(3.0);
        let second = cycle.update(3.05);
        assert_eq!(first.light_intensity, second.light_intensity);
        assert_ne!(first.celestial_position, second.celestial_position);

        let third = cycle.update(3.2);
        assert!(third.light_intensity > first.light_intensity);
    }
}
