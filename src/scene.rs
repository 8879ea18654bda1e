//! Scene compositor. Owns every visual layer, advances them with a
//! single tick, and draws them back-to-front.

use crate::config::SimConfig;
use crate::disk::AccretionDisk;
use crate::effects::{draw_ergosphere, draw_frame_dragging, EmitterEffect};
use crate::particles::ParticleField;
use egui::{Color32, Painter, Pos2, Rect, Stroke};
use rand::Rng;

const STAR_COUNT: usize = 400;

#[derive(Clone, Debug)]
pub struct Star {
    pub pos: Pos2,
    pub size: f32,
    pub twinkle: f32,
}

pub struct SceneCompositor {
    pub disk: AccretionDisk,
    pub field: ParticleField,
    pub top_jet: EmitterEffect,
    pub bottom_jet: EmitterEffect,
    pub hawking: EmitterEffect,
    pub stars: Vec<Star>,
    width: f32,
    height: f32,
    center: Pos2,
    time: f32,
}

impl SceneCompositor {
    pub fn new(width: f32, height: f32, config: &SimConfig) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            disk: AccretionDisk::new(),
            field: ParticleField::new(width, height, config.particle_count),
            top_jet: EmitterEffect::jet(true),
            bottom_jet: EmitterEffect::jet(false),
            hawking: EmitterEffect::hawking(),
            stars: scatter_stars(&mut rng, width, height),
            width,
            height,
            center: Pos2::new(width / 2.0, height / 2.0),
            time: 0.0,
        }
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Adopt a new viewport. A no-op when the size is unchanged, so
    /// calling it every frame is safe and never reshuffles the stars.
    pub fn resize(&mut self, width: f32, height: f32) {
        if (width - self.width).abs() < 0.5 && (height - self.height).abs() < 0.5 {
            return;
        }
        self.width = width;
        self.height = height;
        self.center = Pos2::new(width / 2.0, height / 2.0);
        self.field.set_viewport(width, height);
        let mut rng = rand::thread_rng();
        self.stars = scatter_stars(&mut rng, width, height);
    }

    /// Advance every layer by one step. Disabled layers keep their pools
    /// but stop spawning and draining.
    pub fn tick(&mut self, config: &SimConfig, dt: f32) {
        self.time += dt;
        let mut rng = rand::thread_rng();

        for star in &mut self.stars {
            star.twinkle += 0.02;
        }

        self.disk.update(config);
        self.field.update(config, dt);

        if config.relativistic_jets {
            self.top_jet.update(config, self.center, self.height, &mut rng);
            self.bottom_jet.update(config, self.center, self.height, &mut rng);
        } else {
            self.top_jet.pool.clear();
            self.bottom_jet.pool.clear();
        }

        if config.hawking_radiation {
            self.hawking.update(config, self.center, self.height, &mut rng);
        } else {
            self.hawking.pool.clear();
        }
    }

    /// Draw the full stack, back to front: background, stars, disk,
    /// shadow and horizon, rotation effects, emitters, particles.
    pub fn draw(&self, painter: &Painter, rect: Rect, config: &SimConfig) {
        painter.rect_filled(rect, 0.0, Color32::from_rgb(5, 5, 8));

        if config.starfield {
            self.draw_stars(painter, &rect);
        }

        self.disk.draw(painter, &rect, self.center, config, self.time);
        self.draw_black_hole(painter, &rect, config);

        if config.ergosphere {
            draw_ergosphere(painter, &rect, self.center, config, self.time);
        }
        if config.frame_dragging {
            draw_frame_dragging(painter, &rect, self.center, config, self.time);
        }
        if config.relativistic_jets {
            self.top_jet.draw(painter, &rect);
            self.bottom_jet.draw(painter, &rect);
        }
        if config.hawking_radiation {
            self.hawking.draw(painter, &rect);
        }

        self.field.draw(painter, &rect, config);
    }

    fn draw_stars(&self, painter: &Painter, rect: &Rect) {
        let origin = rect.min.to_vec2();
        for star in &self.stars {
            let alpha = 0.2 + (star.twinkle.sin() * 0.5 + 0.5) * 0.4;
            painter.circle_filled(
                star.pos + origin,
                star.size,
                Color32::from_rgba_unmultiplied(255, 255, 255, (alpha * 255.0) as u8),
            );
        }
    }

    /// Shadow, event horizon, photon sphere and Einstein ring.
    fn draw_black_hole(&self, painter: &Painter, rect: &Rect, config: &SimConfig) {
        let center = rect.min + self.center.to_vec2();
        let rs = config.schwarzschild_radius;

        // Layered discs approximate the radial shadow gradient out to
        // 2.6 radii.
        let shadow_radius = rs * 2.6;
        for layer in 0..12 {
            let t = layer as f32 / 12.0;
            let radius = shadow_radius * (1.0 - t * 0.6);
            let alpha = 30 + (t * 120.0) as u8;
            painter.circle_filled(center, radius, Color32::from_rgba_unmultiplied(0, 0, 0, alpha));
        }
        painter.circle_filled(center, rs, Color32::BLACK);

        // Photon sphere at 1.5 radii, breathing slowly.
        let photon_radius = rs * 1.5;
        let pulse = (self.time * 2.0).sin() * 0.1 + 0.9;
        painter.circle_stroke(
            center,
            photon_radius,
            Stroke::new(
                4.0,
                Color32::from_rgba_unmultiplied(255, 200, 100, (80.0 * pulse) as u8),
            ),
        );
        painter.circle_stroke(
            center,
            photon_radius,
            Stroke::new(
                8.0,
                Color32::from_rgba_unmultiplied(255, 160, 60, (30.0 * pulse) as u8),
            ),
        );

        // Einstein ring, slightly out of phase with the photon sphere.
        let ring_radius = photon_radius * 1.4;
        let ring_pulse = (self.time * 1.5 + 1.0).sin() * 0.15 + 0.85;
        for (width, alpha) in [(12.0, 25.0), (5.0, 60.0), (2.0, 120.0)] {
            painter.circle_stroke(
                center,
                ring_radius,
                Stroke::new(
                    width,
                    Color32::from_rgba_unmultiplied(255, 235, 180, (alpha * ring_pulse) as u8),
                ),
            );
        }
    }
}

fn scatter_stars(rng: &mut impl Rng, width: f32, height: f32) -> Vec<Star> {
    (0..STAR_COUNT)
        .map(|_| Star {
            pos: Pos2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
            size: rng.gen::<f32>() * 1.2 + 0.3,
            twinkle: rng.gen::<f32>() * std::f32::consts::TAU,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_time_and_layers() {
        let config = SimConfig::default();
        let mut scene = SceneCompositor::new(800.0, 600.0, &config);
        assert_eq!(scene.field.particles.len(), 300);

        let angles: Vec<f32> = scene.disk.hotspots.iter().map(|s| s.angle).collect();
        scene.tick(&config, 1.0 / 60.0);
        assert!(scene.time() > 0.0);
        for (spot, before) in scene.disk.hotspots.iter().zip(angles) {
            assert!(spot.angle > before);
        }
    }

    #[test]
    fn resize_is_idempotent() {
        let config = SimConfig::default();
        let mut scene = SceneCompositor::new(800.0, 600.0, &config);
        scene.resize(1024.0, 768.0);
        assert_eq!(scene.center(), Pos2::new(512.0, 384.0));

        let star_positions: Vec<Pos2> = scene.stars.iter().map(|s| s.pos).collect();
        scene.resize(1024.0, 768.0);
        // Same size again: stars stay where they were.
        let unchanged: Vec<Pos2> = scene.stars.iter().map(|s| s.pos).collect();
        assert_eq!(star_positions, unchanged);
        assert_eq!(scene.center(), Pos2::new(512.0, 384.0));
    }

    #[test]
    fn resize_does_not_touch_particles() {
        let config = SimConfig::default();
        let mut scene = SceneCompositor::new(800.0, 600.0, &config);
        let positions: Vec<Pos2> = scene.field.particles.iter().map(|p| p.pos).collect();

        scene.resize(1920.0, 1080.0);
        let after: Vec<Pos2> = scene.field.particles.iter().map(|p| p.pos).collect();
        assert_eq!(positions, after);
    }

    #[test]
    fn disabled_emitters_stay_empty() {
        let mut config = SimConfig::default();
        config.relativistic_jets = false;
        config.hawking_radiation = false;

        let mut scene = SceneCompositor::new(800.0, 600.0, &config);
        for _ in 0..200 {
            scene.tick(&config, 1.0 / 60.0);
        }
        assert!(scene.top_jet.pool.is_empty());
        assert!(scene.bottom_jet.pool.is_empty());
        assert!(scene.hawking.pool.is_empty());
    }

    #[test]
    fn enabled_emitters_fill_over_time() {
        let mut config = SimConfig::default();
        config.relativistic_jets = true;
        config.hawking_radiation = true;

        let mut scene = SceneCompositor::new(800.0, 600.0, &config);
        for _ in 0..500 {
            scene.tick(&config, 1.0 / 60.0);
        }
        assert!(!scene.top_jet.pool.is_empty());
        assert!(!scene.bottom_jet.pool.is_empty());
        assert!(!scene.hawking.pool.is_empty());
    }
}
