//! Gravitational lens post-process over a raster frame.
//! Pulls background pixels toward the hole inside the lens radius and
//! applies gravitational-redshift dimming close to the horizon.

use image::{ImageBuffer, Rgb};
use log::warn;

use crate::config::SimConfig;

pub type FrameBuffer = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Snapshot of the lens inputs for one frame, in pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub struct LensParams {
    pub center: (f32, f32),
    pub schwarzschild_radius: f32,
    pub event_horizon: f32,
    /// 0..100 slider value.
    pub strength: f32,
}

impl LensParams {
    pub fn snapshot(config: &SimConfig, center: (f32, f32)) -> Self {
        Self {
            center,
            schwarzschild_radius: config.schwarzschild_radius,
            event_horizon: config.event_horizon,
            strength: config.lens_strength,
        }
    }
}

/// A lens implementation. Construction may fail (a GPU backend without a
/// device, for instance), in which case the caller degrades to no lens.
pub trait LensStage {
    fn resize(&mut self, width: u32, height: u32);
    fn process(&mut self, frame: &mut FrameBuffer, params: &LensParams, time: f32);
}

/// CPU displacement-sampling lens. Each output pixel inside the lens
/// radius samples the source frame displaced toward the hole.
pub struct CpuLens {
    width: u32,
    height: u32,
    source: Vec<u8>,
}

impl CpuLens {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            warn!("lens disabled: zero-sized frame {width}x{height}");
            return None;
        }
        Some(Self {
            width,
            height,
            source: vec![0; (width * height * 3) as usize],
        })
    }
}

impl LensStage for CpuLens {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.source.resize((width * height * 3) as usize, 0);
    }

    fn process(&mut self, frame: &mut FrameBuffer, params: &LensParams, time: f32) {
        if frame.width() != self.width || frame.height() != self.height {
            self.resize(frame.width(), frame.height());
        }
        self.source.copy_from_slice(frame.as_raw());

        let (cx, cy) = params.center;
        let rs = params.schwarzschild_radius;
        let lens_radius = params.event_horizon * 3.0;
        // Subtle breathing keeps the distortion alive even on a
        // static background.
        let strength = (params.strength / 100.0) * (1.0 + 0.05 * time.sin());

        let width = self.width as i32;
        let height = self.height as i32;
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= lens_radius || dist <= params.event_horizon || dist < 1.0 {
                    continue;
                }

                let falloff = (lens_radius - dist) / lens_radius;
                let displacement = strength * falloff * 50.0;
                let sx = (x as f32 + dx / dist * displacement)
                    .round()
                    .clamp(0.0, (width - 1) as f32) as u32;
                let sy = (y as f32 + dy / dist * displacement)
                    .round()
                    .clamp(0.0, (height - 1) as f32) as u32;

                let src = ((sy * self.width + sx) * 3) as usize;
                let mut rgb = [
                    self.source[src],
                    self.source[src + 1],
                    self.source[src + 2],
                ];

                // Redshift dimming near the horizon.
                if dist < rs * 2.0 {
                    let ratio = (rs / dist.max(rs * 1.1)).clamp(0.0, 0.95);
                    let redshift = 1.0 / (1.0 - ratio).sqrt() - 1.0;
                    let dim = (1.0 - redshift * 0.3).clamp(0.0, 1.0);
                    for channel in &mut rgb {
                        *channel = (*channel as f32 * dim) as u8;
                    }
                }

                frame.put_pixel(x as u32, y as u32, Rgb(rgb));
            }
        }
    }
}
