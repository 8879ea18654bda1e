//! Headless raster renderer. Draws the scene into an accumulation
//! buffer with frame-to-frame fade (the long-exposure look the live
//! painter cannot do), runs the lens post-process, and exports PNGs.

use anyhow::Context;
use log::warn;

use crate::config::SimConfig;
use crate::disk::AccretionDisk;
use crate::lens::{CpuLens, FrameBuffer, LensParams, LensStage};
use crate::particles::hsla;
use crate::scene::SceneCompositor;

const BACKGROUND: [f32; 3] = [5.0, 5.0, 8.0];
/// Fraction of the previous frame surviving into the next one.
const PERSISTENCE: f32 = 0.9;

pub struct FrameRenderer {
    width: u32,
    height: u32,
    accum: Vec<[f32; 3]>,
    lens: Option<Box<dyn LensStage>>,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        let lens: Option<Box<dyn LensStage>> = match CpuLens::new(width, height) {
            Some(lens) => Some(Box::new(lens)),
            None => {
                warn!("lens stage unavailable, rendering without distortion");
                None
            }
        };
        Self {
            width,
            height,
            accum: vec![BACKGROUND; (width * height) as usize],
            lens,
        }
    }

    pub fn lens_available(&self) -> bool {
        self.lens.is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.accum = vec![BACKGROUND; (width * height) as usize];
        if let Some(lens) = &mut self.lens {
            lens.resize(width, height);
        }
    }

    /// Render one frame of the scene. The accumulator keeps a faded copy
    /// of previous frames, so moving particles leave streaks.
    pub fn render(&mut self, scene: &SceneCompositor, config: &SimConfig) -> FrameBuffer {
        let (sw, sh) = scene.size();
        self.resize(sw as u32, sh as u32);
        self.fade();

        if config.starfield {
            for star in &scene.stars {
                let alpha = 0.2 + (star.twinkle.sin() * 0.5 + 0.5) * 0.4;
                self.plot_soft(star.pos.x, star.pos.y, star.size, [255.0, 255.0, 255.0], alpha);
            }
        }

        self.raster_disk(scene, config);
        self.raster_black_hole(scene, config);

        if config.relativistic_jets {
            for p in scene.top_jet.pool.iter().chain(&scene.bottom_jet.pool) {
                let c = color_rgb(hsla(p.hue, 1.0, 0.7, 1.0));
                self.plot_soft(p.pos.x, p.pos.y, 2.0, c, p.life);
            }
        }
        if config.hawking_radiation {
            for p in &scene.hawking.pool {
                let c = color_rgb(hsla(p.hue, 1.0, 0.7, 1.0));
                self.plot_soft(p.pos.x, p.pos.y, 1.5, c, p.life);
            }
        }

        self.raster_particles(scene, config);

        let mut frame = self.quantize();
        if config.lens_enabled {
            if let Some(lens) = &mut self.lens {
                let center = scene.center();
                let params = LensParams::snapshot(config, (center.x, center.y));
                lens.process(&mut frame, &params, scene.time());
            }
        }
        frame
    }

    /// Render and save a still to `path` (format from the extension).
    pub fn snapshot(
        &mut self,
        scene: &SceneCompositor,
        config: &SimConfig,
        path: &str,
    ) -> anyhow::Result<()> {
        let frame = self.render(scene, config);
        frame
            .save(path)
            .with_context(|| format!("writing snapshot to {path}"))?;
        Ok(())
    }

    fn fade(&mut self) {
        for px in &mut self.accum {
            for (c, bg) in px.iter_mut().zip(BACKGROUND) {
                *c = *c * PERSISTENCE + bg * (1.0 - PERSISTENCE);
            }
        }
    }

    fn raster_disk(&mut self, scene: &SceneCompositor, config: &SimConfig) {
        let center = scene.center();
        let rs = config.schwarzschild_radius;
        let time = scene.time();

        for (lobe_sign, lobe_alpha) in [(-1.0_f32, 0.45), (1.0, 0.8)] {
            let cy = center.y + lobe_sign * rs * 0.3;
            for ring in 0..crate::disk::RING_COUNT {
                let radius = AccretionDisk::ring_radius(ring, rs);
                let temperature = AccretionDisk::ring_temperature(ring);
                let color = color_rgb(AccretionDisk::temperature_color(temperature));
                let alpha = (0.1 + 0.25 * temperature) * lobe_alpha;
                let segments = (radius * 2.0).max(60.0) as usize;
                for i in 0..segments {
                    let t = i as f32 / segments as f32 * std::f32::consts::TAU;
                    let x = center.x + t.cos() * radius;
                    let y = cy + t.sin() * radius * 0.18;
                    self.add_pixel(x, y, color, alpha);
                }

                if ring % 2 == 0 {
                    for spot in &scene.disk.hotspots {
                        let angle =
                            spot.angle + ring as f32 * 0.1 + time * config.accretion_speed * 0.1;
                        let x = center.x + angle.cos() * radius;
                        let y = cy + angle.sin() * radius * 0.18;
                        self.plot_soft(x, y, 3.0, [255.0, 245.0, 220.0], spot.intensity * lobe_alpha);
                    }
                }
            }
        }
    }

    fn raster_particles(&mut self, scene: &SceneCompositor, config: &SimConfig) {
        let center = scene.center();
        let rs = config.schwarzschild_radius;
        let time = scene.time();

        for p in &scene.field.particles {
            let ghost = !p.kind.exists(time);
            let alpha_scale = if ghost { 0.3 } else { 1.0 };

            let dist = (center - p.pos).length();
            let mut hue = p.hue;
            let redshift_zone = rs * 3.0;
            if dist < redshift_zone && redshift_zone > 0.0 {
                hue += 80.0 * (redshift_zone - dist) / redshift_zone;
            }
            let color = color_rgb(hsla(hue, 1.0, 0.6, 1.0));
            self.plot_soft(p.pos.x, p.pos.y, p.size, color, p.life * alpha_scale);
        }
    }

    fn raster_black_hole(&mut self, scene: &SceneCompositor, config: &SimConfig) {
        let center = scene.center();
        let rs = config.schwarzschild_radius;
        let shadow = rs * 2.6;

        let x0 = ((center.x - shadow).floor().max(0.0)) as u32;
        let x1 = ((center.x + shadow).ceil().min(self.width as f32 - 1.0)) as u32;
        let y0 = ((center.y - shadow).floor().max(0.0)) as u32;
        let y1 = ((center.y + shadow).ceil().min(self.height as f32 - 1.0)) as u32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - center.x;
                let dy = y as f32 - center.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > shadow {
                    continue;
                }
                let darkness = if dist <= rs {
                    1.0
                } else {
                    (1.0 - (dist - rs) / (shadow - rs)).powi(2) * 0.85
                };
                let px = &mut self.accum[(y * self.width + x) as usize];
                for c in px.iter_mut() {
                    *c *= 1.0 - darkness;
                }
            }
        }

        // Photon sphere and Einstein ring as additive circles.
        let time = scene.time();
        let pulse = (time * 2.0).sin() * 0.1 + 0.9;
        self.plot_circle(center.x, center.y, rs * 1.5, [255.0, 200.0, 100.0], 0.35 * pulse);
        let ring_pulse = (time * 1.5 + 1.0).sin() * 0.15 + 0.85;
        self.plot_circle(center.x, center.y, rs * 2.1, [255.0, 235.0, 180.0], 0.45 * ring_pulse);
    }

    fn plot_circle(&mut self, cx: f32, cy: f32, radius: f32, color: [f32; 3], alpha: f32) {
        let segments = (radius * 4.0).max(90.0) as usize;
        for i in 0..segments {
            let t = i as f32 / segments as f32 * std::f32::consts::TAU;
            self.add_pixel(cx + t.cos() * radius, cy + t.sin() * radius, color, alpha);
        }
    }

    /// Additive soft circle with linear falloff from the center.
    fn plot_soft(&mut self, cx: f32, cy: f32, radius: f32, color: [f32; 3], alpha: f32) {
        let r = radius.max(0.5);
        let ir = r.ceil() as i32;
        for dy in -ir..=ir {
            for dx in -ir..=ir {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d > r {
                    continue;
                }
                let falloff = 1.0 - d / r;
                self.add_pixel(cx + dx as f32, cy + dy as f32, color, alpha * falloff);
            }
        }
    }

    fn add_pixel(&mut self, x: f32, y: f32, color: [f32; 3], alpha: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return;
        }
        let px = &mut self.accum[(y * self.width + x) as usize];
        for (c, add) in px.iter_mut().zip(color) {
            *c = (*c + add * alpha).min(255.0);
        }
    }

    fn quantize(&self) -> FrameBuffer {
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for px in &self.accum {
            for c in px {
                data.push(c.clamp(0.0, 255.0) as u8);
            }
        }
        FrameBuffer::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| FrameBuffer::new(self.width, self.height))
    }
}

fn color_rgb(color: egui::Color32) -> [f32; 3] {
    [color.r() as f32, color.g() as f32, color.b() as f32]
}
