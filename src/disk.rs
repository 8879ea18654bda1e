//! Accretion disk renderer. Concentric flattened rings with a
//! temperature gradient, drawn as two vertical lobes, plus orbiting
//! hotspots on the inner rings.

use crate::config::SimConfig;
use egui::{Color32, Painter, Pos2, Rect, Shape, Stroke};
use rand::Rng;
use std::f32::consts::TAU;

pub const RING_COUNT: usize = 25;
pub const HOTSPOT_COUNT: usize = 8;
/// Vertical squash of each ring ellipse, giving the edge-on look.
const FLATTENING: f32 = 0.18;

#[derive(Clone, Debug)]
pub struct Hotspot {
    pub angle: f32,
    pub speed: f32,
    pub intensity: f32,
}

pub struct AccretionDisk {
    pub hotspots: Vec<Hotspot>,
}

impl AccretionDisk {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let hotspots = (0..HOTSPOT_COUNT)
            .map(|_| Hotspot {
                angle: rng.gen::<f32>() * TAU,
                speed: 0.001 + rng.gen::<f32>() * 0.002,
                intensity: rng.gen::<f32>(),
            })
            .collect();
        Self { hotspots }
    }

    pub fn update(&mut self, config: &SimConfig) {
        for spot in &mut self.hotspots {
            spot.angle += spot.speed * config.accretion_speed;
        }
    }

    /// Ring radius for index 0..RING_COUNT, spanning 1.5 to 4 times the
    /// schwarzschild radius.
    pub fn ring_radius(ring: usize, rs: f32) -> f32 {
        let t = ring as f32 / RING_COUNT as f32;
        let inner = rs * 1.5;
        let outer = rs * 4.0;
        inner + (outer - inner) * t
    }

    /// Temperature falls off linearly from the inner edge outward.
    pub fn ring_temperature(ring: usize) -> f32 {
        1.0 - ring as f32 / RING_COUNT as f32
    }

    /// Blackbody-ish tiers: white-hot inner rings, orange middle, deep
    /// red rim.
    pub fn temperature_color(temperature: f32) -> Color32 {
        if temperature > 0.7 {
            let t = (temperature - 0.7) / 0.3;
            Color32::from_rgb(255, (200.0 + 55.0 * t) as u8, (150.0 + 105.0 * t) as u8)
        } else if temperature > 0.4 {
            let t = (temperature - 0.4) / 0.3;
            Color32::from_rgb(255, (100.0 + 100.0 * t) as u8, (50.0 * t) as u8)
        } else {
            let t = temperature / 0.4;
            Color32::from_rgb((150.0 + 105.0 * t) as u8, (30.0 + 70.0 * t) as u8, 0)
        }
    }

    pub fn draw(&self, painter: &Painter, rect: &Rect, center: Pos2, config: &SimConfig, time: f32) {
        let center = rect.min + center.to_vec2();
        let rs = config.schwarzschild_radius;
        let band = (rs * 4.0 - rs * 1.5) / RING_COUNT as f32;

        // Far lobe first so the near lobe overdraws it.
        for (lobe_sign, lobe_alpha) in [(-1.0, 0.45), (1.0, 0.8)] {
            let lobe_center = Pos2::new(center.x, center.y + lobe_sign * rs * 0.3);
            for ring in 0..RING_COUNT {
                let radius = Self::ring_radius(ring, rs);
                let temperature = Self::ring_temperature(ring);
                let color = Self::temperature_color(temperature);
                let alpha = (0.25 + 0.5 * temperature) * lobe_alpha;
                let stroke_color = Color32::from_rgba_unmultiplied(
                    color.r(),
                    color.g(),
                    color.b(),
                    (alpha * 255.0) as u8,
                );
                let points = ellipse_points(lobe_center, radius, radius * FLATTENING, 48);
                painter.add(Shape::closed_line(
                    points,
                    Stroke::new(band * 1.2, stroke_color),
                ));

                // Bright inner edge on the hottest rings.
                if temperature > 0.5 {
                    let edge = Color32::from_rgba_unmultiplied(
                        255,
                        255,
                        230,
                        (0.3 * temperature * lobe_alpha * 255.0) as u8,
                    );
                    let points = ellipse_points(lobe_center, radius, radius * FLATTENING, 48);
                    painter.add(Shape::closed_line(points, Stroke::new(1.0, edge)));
                }

                if ring % 2 == 0 {
                    self.draw_hotspots(painter, lobe_center, radius, ring, config, time, lobe_alpha);
                }
            }
        }
    }

    fn draw_hotspots(
        &self,
        painter: &Painter,
        lobe_center: Pos2,
        radius: f32,
        ring: usize,
        config: &SimConfig,
        time: f32,
        lobe_alpha: f32,
    ) {
        for spot in &self.hotspots {
            let angle = spot.angle + ring as f32 * 0.1 + time * config.accretion_speed * 0.1;
            let pos = Pos2::new(
                lobe_center.x + angle.cos() * radius,
                lobe_center.y + angle.sin() * radius * FLATTENING,
            );
            let glow = spot.intensity * lobe_alpha;
            // Layered circles stand in for a radial gradient.
            painter.circle_filled(
                pos,
                4.0,
                Color32::from_rgba_unmultiplied(255, 240, 200, (glow * 60.0) as u8),
            );
            painter.circle_filled(
                pos,
                2.0,
                Color32::from_rgba_unmultiplied(255, 255, 240, (glow * 160.0) as u8),
            );
        }
    }
}

impl Default for AccretionDisk {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ellipse_points(center: Pos2, rx: f32, ry: f32, segments: usize) -> Vec<Pos2> {
    (0..segments)
        .map(|i| {
            let t = i as f32 / segments as f32 * TAU;
            Pos2::new(center.x + t.cos() * rx, center.y + t.sin() * ry)
        })
        .collect()
}
