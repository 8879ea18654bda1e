//! Particle field for the infall simulation.
//! Gravitational pull toward the hole, tangential swirl, trails, and
//! respawn of particles consumed past the horizon.

use crate::config::SimConfig;
use egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use rand::Rng;
use rayon::prelude::*;
use std::f32::consts::{FRAC_PI_2, TAU};

/// How far off-screen a particle may drift before the infinite-zoom
/// relocation fires.
const ZOOM_MARGIN: f32 = 100.0;
/// Trails only record while the particle is reasonably close to the hole.
const TRAIL_RANGE: f32 = 400.0;
const TRAIL_CAP: usize = 10;
/// Life drained per tick inside the schwarzschild radius.
const ABSORB_RATE: f32 = 0.05;
const DAMPING: f32 = 0.99;

/// Convert HSL + alpha to an egui color. Hue in degrees (wraps),
/// saturation/lightness/alpha in 0..1.
pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Color32 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    Color32::from_rgba_unmultiplied(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Behavioral variant of a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleKind {
    /// Ordinary infalling dust.
    Dust,
    /// Blinks in and out on a fixed period. While "out", the particle is
    /// frozen and drawn as a faint ghost.
    Flicker { period: f32, phase: f32 },
}

impl ParticleKind {
    /// Whether the particle currently exists. Flicker particles are "in"
    /// for the first 70% of each period.
    pub fn exists(&self, time: f32) -> bool {
        match self {
            Self::Dust => true,
            Self::Flicker { period, phase } => {
                let t = (time / period + phase).fract();
                t < 0.7
            }
        }
    }
}

#[derive(Clone)]
pub struct Particle {
    pub pos: Pos2,
    pub vel: Vec2,
    pub life: f32,
    pub size: f32,
    pub hue: f32,
    pub trail: Vec<Pos2>,
    pub kind: ParticleKind,
}

impl Particle {
    fn spawn(rng: &mut impl Rng, width: f32, height: f32) -> Self {
        let kind = if rng.gen_range(0..6) == 0 {
            ParticleKind::Flicker {
                period: 2.0 + rng.gen::<f32>() * 2.0,
                phase: rng.gen::<f32>(),
            }
        } else {
            ParticleKind::Dust
        };
        Self {
            pos: Pos2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
            vel: Vec2::new(
                (rng.gen::<f32>() - 0.5) * 2.0,
                (rng.gen::<f32>() - 0.5) * 2.0,
            ),
            life: 1.0,
            size: rng.gen::<f32>() * 2.0 + 0.5,
            hue: rng.gen::<f32>() * 60.0 + 200.0,
            trail: Vec::with_capacity(TRAIL_CAP),
            kind,
        }
    }

    /// Re-seed a consumed particle on the outer annulus, far from the hole.
    fn respawn(&mut self, rng: &mut impl Rng, center: Pos2, width: f32, height: f32) {
        let angle = rng.gen::<f32>() * TAU;
        let distance = 300.0 + rng.gen::<f32>() * width.max(height) * 0.7;
        self.pos = center + Vec2::new(angle.cos(), angle.sin()) * distance;
        self.vel = Vec2::new(
            (rng.gen::<f32>() - 0.5) * 2.0,
            (rng.gen::<f32>() - 0.5) * 2.0,
        );
        self.life = 1.0;
        self.trail.clear();
    }
}

/// Post-integration hook. Runs on every live particle each tick, after
/// the base forces, so external code can layer extra behavior without
/// touching the integrator.
pub type Modifier = Box<dyn FnMut(&mut Particle, &SimConfig) + Send>;

pub struct ParticleField {
    pub particles: Vec<Particle>,
    width: f32,
    height: f32,
    center: Pos2,
    time: f32,
    modifiers: Vec<Modifier>,
}

impl ParticleField {
    pub fn new(width: f32, height: f32, count: usize) -> Self {
        let mut field = Self {
            particles: Vec::new(),
            width,
            height,
            center: Pos2::new(width / 2.0, height / 2.0),
            time: 0.0,
            modifiers: Vec::new(),
        };
        field.resize_population(count);
        field
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.center = Pos2::new(width / 2.0, height / 2.0);
    }

    /// Grow with fresh spawns or truncate, keeping survivors untouched.
    pub fn resize_population(&mut self, count: usize) {
        let mut rng = rand::thread_rng();
        while self.particles.len() < count {
            self.particles
                .push(Particle::spawn(&mut rng, self.width, self.height));
        }
        self.particles.truncate(count);
    }

    #[allow(dead_code)]
    pub fn add_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// One simulation tick. The force/integration pass runs in parallel;
    /// respawn and relocation need the shared RNG so they run after.
    pub fn update(&mut self, config: &SimConfig, dt: f32) {
        self.time += dt;

        let center = self.center;
        let time = self.time;
        let gravity = config.gravity_strength;
        let mass = config.mass;
        let accretion = config.accretion_speed;
        let rs = config.schwarzschild_radius;

        self.particles.par_iter_mut().for_each(|p| {
            if !p.kind.exists(time) {
                return;
            }

            let to_center = center - p.pos;
            let dist_sq = to_center.x * to_center.x + to_center.y * to_center.y;
            let dist = dist_sq.sqrt();

            if dist > 1.0 {
                let force = gravity * mass / dist_sq;
                let angle = to_center.y.atan2(to_center.x);
                p.vel += Vec2::new(angle.cos(), angle.sin()) * force;
                // Tangential component makes the infall swirl instead of
                // plunging straight in.
                let tangent = angle + FRAC_PI_2;
                p.vel += Vec2::new(tangent.cos(), tangent.sin()) * (0.3 * force * accretion);
            }

            p.vel *= DAMPING;
            p.pos += p.vel;

            // Horizon check uses the start-of-tick distance; a particle
            // sitting exactly on the radius is not yet absorbed.
            if dist < rs {
                p.life -= ABSORB_RATE;
            }

            if dist < TRAIL_RANGE {
                p.trail.push(p.pos);
                if p.trail.len() > TRAIL_CAP {
                    p.trail.remove(0);
                }
            } else {
                p.trail.clear();
            }
        });

        let mut rng = rand::thread_rng();
        let relocation = self.width.max(self.height) * 0.5;
        for p in &mut self.particles {
            if p.life <= 0.0 {
                p.respawn(&mut rng, center, self.width, self.height);
                continue;
            }
            if config.infinite_zoom
                && (p.pos.x < -ZOOM_MARGIN
                    || p.pos.x > self.width + ZOOM_MARGIN
                    || p.pos.y < -ZOOM_MARGIN
                    || p.pos.y > self.height + ZOOM_MARGIN)
            {
                // Re-enter from the opposite side, keeping velocity and
                // life, so escaping matter becomes incoming matter.
                let angle = (p.pos.y - center.y).atan2(p.pos.x - center.x);
                p.pos = center - Vec2::new(angle.cos(), angle.sin()) * relocation;
                p.trail.clear();
            }
        }

        if !self.modifiers.is_empty() {
            let mut modifiers = std::mem::take(&mut self.modifiers);
            for modifier in &mut modifiers {
                for p in &mut self.particles {
                    modifier(p, config);
                }
            }
            self.modifiers = modifiers;
        }
    }

    pub fn draw(&self, painter: &Painter, rect: &Rect, config: &SimConfig) {
        let origin = rect.min.to_vec2();
        let center = self.center;
        let rs = config.schwarzschild_radius;

        for p in &self.particles {
            let ghost = !p.kind.exists(self.time);
            let alpha_scale = if ghost { 0.3 } else { 1.0 };

            if p.trail.len() > 1 && !ghost {
                let points: Vec<Pos2> = p.trail.iter().map(|t| *t + origin).collect();
                let trail_color = hsla(p.hue, 1.0, 0.6, p.life * 0.3);
                painter.add(Shape::line(points, Stroke::new(1.0, trail_color)));
            }

            let to_center = center - p.pos;
            let dist = to_center.length();

            // Gravitational redshift: shift the hue toward red as the
            // particle closes on the hole.
            let mut hue = p.hue;
            let redshift_zone = rs * 3.0;
            if dist < redshift_zone && redshift_zone > 0.0 {
                hue += 80.0 * (redshift_zone - dist) / redshift_zone;
            }
            let fill = hsla(hue, 1.0, 0.6, p.life * alpha_scale);
            let pos = p.pos + origin;

            // Tidal stretching: elongate along the radial direction as the
            // particle nears the horizon.
            let stretch = if rs > 0.0 {
                (1.0 + 3.0 * (1.0 - dist / (rs * 2.0))).clamp(1.0, 4.0)
            } else {
                1.0
            };

            if stretch > 1.05 {
                let angle = to_center.y.atan2(to_center.x);
                let (sin_a, cos_a) = angle.sin_cos();
                let points: Vec<Pos2> = (0..16)
                    .map(|i| {
                        let t = i as f32 / 16.0 * TAU;
                        let ex = t.cos() * p.size * stretch;
                        let ey = t.sin() * p.size;
                        Pos2::new(
                            pos.x + ex * cos_a - ey * sin_a,
                            pos.y + ex * sin_a + ey * cos_a,
                        )
                    })
                    .collect();
                painter.add(Shape::convex_polygon(points, fill, Stroke::NONE));
            } else {
                painter.circle_filled(pos, p.size, fill);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.infinite_zoom = false;
        config
    }

    fn dust_at(field: &mut ParticleField, index: usize, pos: Pos2, vel: Vec2) {
        let p = &mut field.particles[index];
        p.pos = pos;
        p.vel = vel;
        p.life = 1.0;
        p.kind = ParticleKind::Dust;
        p.trail.clear();
    }

    #[test]
    fn radial_and_tangential_force_single_tick() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let center = field.center();
        dust_at(&mut field, 0, center + Vec2::new(300.0, 0.0), Vec2::ZERO);

        let config = test_config(); // gravity 500, mass 150, accretion 5
        field.update(&config, 1.0 / 60.0);

        // F = 500 * 150 / 300^2, radial direction is -x, tangential is -y
        // (90 degrees counterclockwise from the inward pull), both damped.
        let force = 500.0 * 150.0 / (300.0_f32 * 300.0);
        let p = &field.particles[0];
        assert!((p.vel.x - (-force * DAMPING)).abs() < 1e-3, "vx = {}", p.vel.x);
        assert!(
            (p.vel.y - (-0.3 * force * 5.0 * DAMPING)).abs() < 1e-3,
            "vy = {}",
            p.vel.y
        );
        // Within trail range, so one trail point was recorded.
        assert_eq!(p.trail.len(), 1);
    }

    #[test]
    fn absorption_is_strictly_inside_radius() {
        let mut field = ParticleField::new(800.0, 600.0, 2);
        let center = field.center();
        let mut config = test_config();
        config.gravity_strength = 0.0;
        let rs = config.schwarzschild_radius;

        // Exactly on the radius: untouched. Just inside: drained.
        dust_at(&mut field, 0, center + Vec2::new(rs, 0.0), Vec2::ZERO);
        dust_at(&mut field, 1, center + Vec2::new(rs - 0.5, 0.0), Vec2::ZERO);
        field.update(&config, 1.0 / 60.0);

        assert_eq!(field.particles[0].life, 1.0);
        assert!((field.particles[1].life - 0.95).abs() < 1e-6);
    }

    #[test]
    fn consumed_particle_respawns_on_outer_annulus() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let center = field.center();
        let mut config = test_config();
        config.gravity_strength = 0.0;

        dust_at(&mut field, 0, center + Vec2::new(1.5, 0.0), Vec2::ZERO);
        field.particles[0].life = 0.05;
        field.update(&config, 1.0 / 60.0);

        let p = &field.particles[0];
        assert_eq!(p.life, 1.0);
        assert!(p.trail.is_empty());
        let dist = (p.pos - center).length();
        assert!(dist >= 300.0 - 1e-3, "respawned too close: {dist}");
    }

    #[test]
    fn life_never_goes_negative_across_ticks() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let center = field.center();
        let mut config = test_config();
        config.gravity_strength = 0.0;

        dust_at(&mut field, 0, center + Vec2::new(2.0, 0.0), Vec2::ZERO);
        for _ in 0..100 {
            field.update(&config, 1.0 / 60.0);
            let life = field.particles[0].life;
            assert!(life > -1e-6 && life <= 1.0, "life out of range: {life}");
        }
    }

    #[test]
    fn trail_is_capped() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let center = field.center();
        let mut config = test_config();
        config.gravity_strength = 0.0;

        dust_at(&mut field, 0, center + Vec2::new(200.0, 0.0), Vec2::ZERO);
        for _ in 0..30 {
            field.update(&config, 1.0 / 60.0);
            // Keep it alive and in place so the trail keeps recording.
            field.particles[0].life = 1.0;
        }
        assert!(field.particles[0].trail.len() <= TRAIL_CAP);
    }

    #[test]
    fn trail_clears_beyond_range() {
        let mut field = ParticleField::new(2000.0, 2000.0, 1);
        let center = field.center();
        let mut config = test_config();
        config.gravity_strength = 0.0;

        dust_at(&mut field, 0, center + Vec2::new(200.0, 0.0), Vec2::ZERO);
        field.update(&config, 1.0 / 60.0);
        assert_eq!(field.particles[0].trail.len(), 1);

        field.particles[0].pos = center + Vec2::new(500.0, 0.0);
        field.update(&config, 1.0 / 60.0);
        assert!(field.particles[0].trail.is_empty());
    }

    #[test]
    fn escaped_particle_relocates_opposite_at_half_viewport() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let center = field.center();
        let mut config = test_config();
        config.gravity_strength = 0.0;
        config.infinite_zoom = true;

        // Parked well past the right margin, no velocity so the position
        // at relocation time is exact.
        dust_at(
            &mut field,
            0,
            Pos2::new(800.0 + 150.0, center.y),
            Vec2::ZERO,
        );
        field.update(&config, 1.0 / 60.0);

        let p = &field.particles[0];
        let dist = (p.pos - center).length();
        assert!((dist - 400.0).abs() < 1e-3, "relocated at {dist}");
        // Exited to the right, so it re-enters from the left.
        assert!(p.pos.x < center.x);
        assert_eq!(p.vel, Vec2::ZERO);
        assert_eq!(p.life, 1.0);
    }

    #[test]
    fn zoom_disabled_lets_particles_leave() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let mut config = test_config();
        config.gravity_strength = 0.0;
        config.infinite_zoom = false;

        let far = Pos2::new(800.0 + 150.0, 300.0);
        dust_at(&mut field, 0, far, Vec2::ZERO);
        field.update(&config, 1.0 / 60.0);
        assert_eq!(field.particles[0].pos, far);
    }

    #[test]
    fn flicker_duty_cycle_is_seventy_percent() {
        let kind = ParticleKind::Flicker {
            period: 1.0,
            phase: 0.0,
        };
        let mut on = 0;
        for i in 0..1000 {
            if kind.exists(i as f32 / 1000.0) {
                on += 1;
            }
        }
        assert!((690..=710).contains(&on), "duty cycle {on}/1000");
    }

    #[test]
    fn flicker_particle_is_frozen_while_out() {
        let mut field = ParticleField::new(800.0, 600.0, 1);
        let center = field.center();
        let config = test_config();

        let pos = center + Vec2::new(300.0, 0.0);
        field.particles[0].pos = pos;
        field.particles[0].vel = Vec2::ZERO;
        // Phase chosen so the particle is "out" for small times.
        field.particles[0].kind = ParticleKind::Flicker {
            period: 100.0,
            phase: 0.71,
        };
        field.update(&config, 1.0 / 60.0);
        assert_eq!(field.particles[0].pos, pos);
        assert_eq!(field.particles[0].vel, Vec2::ZERO);
    }

    #[test]
    fn modifiers_run_after_integration() {
        let mut field = ParticleField::new(800.0, 600.0, 3);
        let config = test_config();

        field.add_modifier(Box::new(|p, _config| {
            p.hue = 0.0;
        }));
        field.update(&config, 1.0 / 60.0);
        for p in &field.particles {
            assert_eq!(p.hue, 0.0);
        }
    }

    #[test]
    fn resize_population_grows_and_shrinks() {
        let mut field = ParticleField::new(800.0, 600.0, 100);
        assert_eq!(field.particles.len(), 100);

        field.particles[0].hue = 123.0;
        field.resize_population(150);
        assert_eq!(field.particles.len(), 150);
        // Survivors keep their state.
        assert_eq!(field.particles[0].hue, 123.0);

        field.resize_population(10);
        assert_eq!(field.particles.len(), 10);
        assert_eq!(field.particles[0].hue, 123.0);
    }

    #[test]
    fn hsla_primaries() {
        assert_eq!(hsla(0.0, 1.0, 0.5, 1.0), Color32::from_rgb(255, 0, 0));
        assert_eq!(hsla(120.0, 1.0, 0.5, 1.0), Color32::from_rgb(0, 255, 0));
        assert_eq!(hsla(240.0, 1.0, 0.5, 1.0), Color32::from_rgb(0, 0, 255));
        // Hue wraps.
        assert_eq!(hsla(360.0, 1.0, 0.5, 1.0), hsla(0.0, 1.0, 0.5, 1.0));
    }
}
