//! Optional relativistic effects layered over the core simulation:
//! polar jets, Hawking radiation, the ergosphere ring and frame-dragging
//! spirals.

use crate::config::SimConfig;
use crate::particles::hsla;
use egui::{Painter, Pos2, Rect, Vec2};
use rand::Rng;
use std::f32::consts::TAU;

/// A short-lived particle owned by an emitter pool.
#[derive(Clone, Debug)]
pub struct Emitted {
    pub pos: Pos2,
    pub vel: Vec2,
    pub life: f32,
    pub hue: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitterKind {
    /// Collimated jet firing from one pole. `top` selects the direction.
    Jet { top: bool },
    /// Faint quanta leaking off the schwarzschild radius.
    Hawking,
}

/// Capped pool of emitted particles with per-kind spawn, motion and
/// retirement rules.
pub struct EmitterEffect {
    pub kind: EmitterKind,
    pub pool: Vec<Emitted>,
    capacity: usize,
}

impl EmitterEffect {
    pub fn jet(top: bool) -> Self {
        Self {
            kind: EmitterKind::Jet { top },
            pool: Vec::new(),
            capacity: 50,
        }
    }

    pub fn hawking() -> Self {
        Self {
            kind: EmitterKind::Hawking,
            pool: Vec::new(),
            capacity: 30,
        }
    }

    fn spawn_chance(&self) -> f32 {
        match self.kind {
            EmitterKind::Jet { .. } => 0.1,
            EmitterKind::Hawking => 0.05,
        }
    }

    fn decay(&self) -> f32 {
        match self.kind {
            EmitterKind::Jet { .. } => 0.01,
            EmitterKind::Hawking => 0.02,
        }
    }

    pub(crate) fn spawn(&mut self, rng: &mut impl Rng, center: Pos2, config: &SimConfig) {
        let emitted = match self.kind {
            EmitterKind::Jet { top } => {
                let dir = if top { -1.0 } else { 1.0 };
                Emitted {
                    pos: Pos2::new(center.x + (rng.gen::<f32>() - 0.5) * 6.0, center.y),
                    vel: Vec2::new(
                        (rng.gen::<f32>() - 0.5) * 0.6,
                        dir * (5.0 + rng.gen::<f32>() * 5.0),
                    ),
                    life: 1.0,
                    hue: 180.0 + rng.gen::<f32>() * 40.0,
                }
            }
            EmitterKind::Hawking => {
                // Born exactly on the schwarzschild radius, moving outward.
                let angle = rng.gen::<f32>() * TAU;
                let dir = Vec2::new(angle.cos(), angle.sin());
                Emitted {
                    pos: center + dir * config.schwarzschild_radius,
                    vel: dir * 2.0,
                    life: 1.0,
                    hue: rng.gen::<f32>() * 360.0,
                }
            }
        };
        self.pool.push(emitted);
    }

    pub fn update(&mut self, config: &SimConfig, center: Pos2, height: f32, rng: &mut impl Rng) {
        if self.pool.len() < self.capacity && rng.gen::<f32>() < self.spawn_chance() {
            self.spawn(rng, center, config);
        }

        let decay = self.decay();
        let kind = self.kind;
        self.pool.retain_mut(|p| {
            p.pos += p.vel;
            p.life -= decay;
            if p.life <= 0.0 {
                return false;
            }
            match kind {
                // Jets die once they leave the screen band.
                EmitterKind::Jet { .. } => p.pos.y > -200.0 && p.pos.y < height + 200.0,
                EmitterKind::Hawking => true,
            }
        });
    }

    pub fn draw(&self, painter: &Painter, rect: &Rect) {
        let origin = rect.min.to_vec2();
        let radius = match self.kind {
            EmitterKind::Jet { .. } => 2.0,
            EmitterKind::Hawking => 1.5,
        };
        for p in &self.pool {
            painter.circle_filled(p.pos + origin, radius, hsla(p.hue, 1.0, 0.7, p.life));
        }
    }
}

/// Violet ring just outside the horizon where nothing can stand still.
pub fn draw_ergosphere(painter: &Painter, rect: &Rect, center: Pos2, config: &SimConfig, time: f32) {
    let center = rect.min + center.to_vec2();
    let radius = config.schwarzschild_radius * 1.2;
    let pulse = (time * 1.8).sin() * 0.1 + 0.9;
    painter.circle_stroke(
        center,
        radius,
        egui::Stroke::new(3.0, hsla(275.0, 0.9, 0.6, 0.35 * pulse)),
    );
    painter.circle_stroke(
        center,
        radius,
        egui::Stroke::new(8.0, hsla(275.0, 0.9, 0.5, 0.12 * pulse)),
    );
}

/// Spiral streaks showing spacetime dragged around the spinning hole.
pub fn draw_frame_dragging(
    painter: &Painter,
    rect: &Rect,
    center: Pos2,
    config: &SimConfig,
    time: f32,
) {
    let center = rect.min + center.to_vec2();
    let rs = config.schwarzschild_radius;
    let inner = rs * 1.2;
    let outer = rs * 2.0;

    for arm in 0..8 {
        let base = arm as f32 / 8.0 * TAU + time * 0.5;
        let hue = 260.0 + (arm as f32 / 8.0 - 0.5) * 80.0;
        let points: Vec<Pos2> = (0..12)
            .map(|step| {
                let t = step as f32 / 11.0;
                let radius = inner + (outer - inner) * t;
                let angle = base + t * 1.2;
                Pos2::new(
                    center.x + angle.cos() * radius,
                    center.y + angle.sin() * radius,
                )
            })
            .collect();
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(1.5, hsla(hue, 0.8, 0.6, 0.25)),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_center() -> Pos2 {
        Pos2::new(400.0, 300.0)
    }

    #[test]
    fn pools_never_exceed_capacity() {
        let mut rng = rand::thread_rng();
        let config = SimConfig::default();
        let center = test_center();

        let mut jet = EmitterEffect::jet(true);
        let mut hawking = EmitterEffect::hawking();
        for _ in 0..2000 {
            jet.update(&config, center, 600.0, &mut rng);
            hawking.update(&config, center, 600.0, &mut rng);
            assert!(jet.pool.len() <= 50);
            assert!(hawking.pool.len() <= 30);
        }
    }

    #[test]
    fn hawking_spawns_on_schwarzschild_circle_moving_outward() {
        let mut rng = rand::thread_rng();
        let config = SimConfig::default();
        let center = test_center();

        let mut emitter = EmitterEffect::hawking();
        emitter.spawn(&mut rng, center, &config);

        let p = &emitter.pool[0];
        let offset = p.pos - center;
        let dist = offset.length();
        assert!(
            (dist - config.schwarzschild_radius).abs() < 1e-3,
            "spawned at {dist}"
        );
        // Velocity points away from the hole at speed 2.
        assert!((p.vel.length() - 2.0).abs() < 1e-3);
        assert!(offset.dot(p.vel) > 0.0);
    }

    #[test]
    fn top_jet_fires_upward_bottom_jet_downward() {
        let mut rng = rand::thread_rng();
        let config = SimConfig::default();
        let center = test_center();

        let mut top = EmitterEffect::jet(true);
        let mut bottom = EmitterEffect::jet(false);
        top.spawn(&mut rng, center, &config);
        bottom.spawn(&mut rng, center, &config);

        let up = &top.pool[0];
        let down = &bottom.pool[0];
        assert!(up.vel.y <= -5.0 && up.vel.y >= -10.0, "vy = {}", up.vel.y);
        assert!(down.vel.y >= 5.0 && down.vel.y <= 10.0, "vy = {}", down.vel.y);
        assert!(up.hue >= 180.0 && up.hue <= 220.0);
    }

    #[test]
    fn jet_particles_retire_out_of_band() {
        let mut rng = rand::thread_rng();
        let config = SimConfig::default();
        let center = test_center();

        let mut jet = EmitterEffect::jet(true);
        jet.spawn(&mut rng, center, &config);
        // Park it just above the kill line; one step of motion crosses it.
        jet.pool[0].pos.y = -199.0;
        jet.pool[0].vel = Vec2::new(0.0, -6.0);
        jet.update(&config, center, 600.0, &mut rng);
        assert!(jet.pool.iter().all(|p| p.pos.y > -200.0));
    }

    #[test]
    fn decay_rates_limit_lifetime() {
        // A jet particle lives at most 100 ticks, a hawking quantum 50.
        let jet = EmitterEffect::jet(false);
        let hawking = EmitterEffect::hawking();
        assert_eq!(jet.decay(), 0.01);
        assert_eq!(hawking.decay(), 0.02);
    }
}
