//! Distance- and age-driven appearance.
//!
//! Appearance carries no state of its own: every frame the color, size and
//! opacity of each live particle are recomputed from its radius and age.

use rayon::prelude::*;

use crate::config::{AppearanceConfig, BandColor, BandThresholds, Palette};
use crate::pool::{ParticlePool, radius_of};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub color: [f32; 3],
    pub size: f32,
    pub opacity: f32,
}

/// Named distance ranges, outermost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Far,
    Mid,
    Near,
    VeryNear,
}

impl Band {
    pub fn classify(r: f32, thresholds: &BandThresholds) -> Self {
        if r > thresholds.far {
            Band::Far
        } else if r > thresholds.mid {
            Band::Mid
        } else if r > thresholds.near {
            Band::Near
        } else {
            Band::VeryNear
        }
    }

    fn color(self, palette: &Palette) -> &BandColor {
        match self {
            Band::Far => &palette.far,
            Band::Mid => &palette.mid,
            Band::Near => &palette.near,
            Band::VeryNear => &palette.very_near,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppearanceMapper {
    look: AppearanceConfig,
    inner_radius: f32,
}

impl AppearanceMapper {
    pub fn new(look: AppearanceConfig, inner_radius: f32) -> Self {
        Self { look, inner_radius }
    }

    /// `max(0, 1 - r / H)`: 0 at and beyond `H`, approaching 1 at the center.
    pub fn heat(&self, r: f32) -> f32 {
        (1.0 - r / self.look.heat_scale).max(0.0)
    }

    pub fn color(&self, r: f32) -> [f32; 3] {
        let heat = self.heat(r);
        let BandColor { cool, hot } = *Band::classify(r, &self.look.bands).color(&self.look.palette);
        [
            cool[0] + (hot[0] - cool[0]) * heat,
            cool[1] + (hot[1] - cool[1]) * heat,
            cool[2] + (hot[2] - cool[2]) * heat,
        ]
    }

    /// Grows with heat down to the shrink radius, then collapses linearly to
    /// zero at the consumption radius.
    pub fn size(&self, r: f32) -> f32 {
        let look = &self.look;
        let grown = |r: f32| look.base_size * (1.0 + look.size_growth * self.heat(r));

        if r > look.shrink_radius {
            grown(r)
        } else {
            let span = look.shrink_radius - self.inner_radius;
            let t = ((r - self.inner_radius) / span).clamp(0.0, 1.0);
            grown(look.shrink_radius) * t
        }
    }

    pub fn opacity(&self, r: f32, age: f32) -> f32 {
        let look = &self.look;
        let fade_in = (look.restart_opacity + age * look.fade_in_rate).min(look.max_opacity);
        let fade_out = (r / look.fade_distance).min(1.0);
        (fade_in * fade_out).clamp(0.0, 1.0)
    }

    pub fn map(&self, r: f32, age: f32) -> Appearance {
        Appearance {
            color: self.color(r),
            size: self.size(r),
            opacity: self.opacity(r, age),
        }
    }

    /// Recolors every active slot from its current radius and age.
    pub fn apply(&self, pool: &mut ParticlePool) {
        let ParticlePool {
            positions,
            ages,
            active,
            colors,
            sizes,
            opacities,
            ..
        } = pool;

        colors
            .par_chunks_exact_mut(3)
            .zip(sizes.par_iter_mut())
            .zip(opacities.par_iter_mut())
            .zip(positions.par_chunks_exact(3))
            .zip(ages.par_iter())
            .zip(active.par_iter())
            .filter(|(_, active)| **active)
            .for_each(|(((((color, size), opacity), position), &age), _)| {
                let look = self.map(radius_of(position), age);
                color.copy_from_slice(&look.color);
                *size = look.size;
                *opacity = look.opacity;
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> AppearanceMapper {
        AppearanceMapper::new(AppearanceConfig::default(), 1.2)
    }

    #[test]
    fn test_band_classification() {
        let bands = BandThresholds::default();
        assert_eq!(Band::classify(12.0, &bands), Band::Far);
        assert_eq!(Band::classify(8.0, &bands), Band::Mid);
        assert_eq!(Band::classify(6.0, &bands), Band::Mid);
        assert_eq!(Band::classify(5.0, &bands), Band::Near);
        assert_eq!(Band::classify(4.5, &bands), Band::Near);
        assert_eq!(Band::classify(4.0, &bands), Band::VeryNear);
        assert_eq!(Band::classify(0.0, &bands), Band::VeryNear);
    }

    #[test]
    fn test_heat_is_zero_outside_scale() {
        let mapper = mapper();
        assert_eq!(mapper.heat(10.0), 0.0);
        assert_eq!(mapper.heat(14.0), 0.0);
        assert!((mapper.heat(5.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_core_color_exceeds_unit_range() {
        let color = mapper().color(1.5);
        assert!(color.iter().any(|&c| c > 1.0));
    }

    #[test]
    fn test_far_color_is_cool() {
        let color = mapper().color(13.0);
        assert_eq!(color, AppearanceConfig::default().palette.far.cool);
    }

    #[test]
    fn test_size_grows_then_shrinks() {
        let mapper = mapper();
        let base = AppearanceConfig::default().base_size;

        assert!((mapper.size(12.0) - base).abs() < 1e-6);
        assert!(mapper.size(6.0) > mapper.size(9.0));
        assert!(mapper.size(4.0) >= mapper.size(6.0));
        assert!(mapper.size(3.0) < mapper.size(4.0));
        assert!(mapper.size(2.0) < mapper.size(3.0));
        assert_eq!(mapper.size(1.2), 0.0);
        assert_eq!(mapper.size(0.5), 0.0);
    }

    #[test]
    fn test_size_continuous_at_shrink_radius() {
        let mapper = mapper();
        assert!((mapper.size(4.0) - mapper.size(4.0001)).abs() < 1e-3);
    }

    #[test]
    fn test_opacity_fades_in_with_age() {
        let mapper = mapper();
        let look = AppearanceConfig::default();
        assert!((mapper.opacity(12.0, 0.0) - look.restart_opacity).abs() < 1e-6);
        assert!(mapper.opacity(12.0, 1.0) > mapper.opacity(12.0, 0.5));
        assert_eq!(mapper.opacity(12.0, 100.0), look.max_opacity);
    }

    #[test]
    fn test_opacity_fades_out_near_center() {
        let mapper = mapper();
        let settled = mapper.opacity(6.0, 100.0);
        assert_eq!(settled, 1.0);
        assert!((mapper.opacity(1.5, 100.0) - 0.5).abs() < 1e-6);
        assert!(mapper.opacity(1.2, 100.0) < mapper.opacity(2.0, 100.0));
    }

    #[test]
    fn test_apply_skips_inactive_slots() {
        let mut pool = ParticlePool::allocate(2, 0).unwrap();
        pool.positions[0] = 3.0;
        pool.positions[3] = 3.0;
        pool.active[0] = true;

        mapper().apply(&mut pool);

        assert!(pool.sizes()[0] > 0.0);
        assert_eq!(pool.sizes()[1], 0.0);
        assert_eq!(&pool.colors()[3..6], &[0.0, 0.0, 0.0]);
    }
}
