//! Black Hole Studio - Main Application
//! Interactive 2D black hole visualization with egui GUI

mod config;
mod disk;
mod effects;
mod lens;
mod particles;
mod presets;
mod render;
mod scene;

use config::SimConfig;
use eframe::egui;
use log::{error, info};
use presets::PresetId;
use render::FrameRenderer;
use scene::SceneCompositor;
use std::time::Instant;

/// Main application state
struct BlackHoleApp {
    config: SimConfig,
    scene: SceneCompositor,
    renderer: FrameRenderer,
    last_update: Instant,

    // UI state
    show_settings: bool,
    last_dt: f32,
    lens_available: bool,
    status_message: Option<String>,
}

impl BlackHoleApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_unmultiplied(12, 12, 22, 245);
        visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(16, 16, 28, 240);
        cc.egui_ctx.set_visuals(visuals);

        let mut config = SimConfig::default();
        PresetId::default().apply_to(&mut config);
        let scene = SceneCompositor::new(1280.0, 720.0, &config);
        let renderer = FrameRenderer::new(1280, 720);

        // Checked once so the lens checkbox can grey out when the stage
        // cannot be built.
        let lens_available = renderer.lens_available();
        if !lens_available {
            info!("gravitational lens unavailable, running without it");
        }

        Self {
            config,
            scene,
            renderer,
            last_update: Instant::now(),
            show_settings: true,
            last_dt: 0.016,
            lens_available,
            status_message: None,
        }
    }

    fn apply_preset(&mut self, preset: PresetId) {
        if preset.apply_to(&mut self.config) {
            self.scene.field.resize_population(self.config.particle_count);
        }
    }

    fn save_config(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("blackhole.json")
            .save_file()
        {
            let path = path.to_string_lossy().to_string();
            match self.config.save(&path) {
                Ok(()) => self.status_message = Some(format!("Saved {path}")),
                Err(e) => {
                    error!("saving config: {e:#}");
                    self.status_message = Some(format!("Save failed: {e}"));
                }
            }
        }
    }

    fn load_config(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            let path = path.to_string_lossy().to_string();
            match SimConfig::load(&path) {
                Ok(config) => {
                    self.config = config;
                    self.scene.field.resize_population(self.config.particle_count);
                    self.status_message = Some(format!("Loaded {path}"));
                }
                Err(e) => {
                    error!("loading config: {e:#}");
                    self.status_message = Some(format!("Load failed: {e}"));
                }
            }
        }
    }

    fn save_snapshot(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("blackhole.png")
            .save_file()
        {
            let path = path.to_string_lossy().to_string();
            match self.renderer.snapshot(&self.scene, &self.config, &path) {
                Ok(()) => self.status_message = Some(format!("Snapshot {path}")),
                Err(e) => {
                    error!("snapshot: {e:#}");
                    self.status_message = Some(format!("Snapshot failed: {e}"));
                }
            }
        }
    }
}

impl eframe::App for BlackHoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32().min(0.1);
        self.last_update = now;
        self.last_dt = dt;

        self.render_top_bar(ctx);
        if self.show_settings {
            self.render_settings_panel(ctx);
        }
        self.render_canvas(ctx, dt);

        ctx.request_repaint();
    }
}

impl BlackHoleApp {
    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🕳 Black Hole Studio");
                ui.separator();

                ui.toggle_value(&mut self.show_settings, "⚙ Settings");
                ui.separator();

                if ui.button("📷 Snapshot").clicked() {
                    self.save_snapshot();
                }
                ui.separator();

                ui.label(format!("{:.0} fps", 1.0 / self.last_dt.max(1e-4)));
                ui.label(format!("{} particles", self.scene.field.particles.len()));

                if let Some(msg) = &self.status_message {
                    ui.separator();
                    ui.weak(msg.clone());
                }
            });
        });
    }

    fn render_settings_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("settings_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Black Hole");
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    ui.label("Preset:");
                    let current = self.config.current_preset;
                    egui::ComboBox::from_id_source("preset_combo")
                        .selected_text(current.name())
                        .show_ui(ui, |ui| {
                            for preset in PresetId::all() {
                                let response = ui
                                    .selectable_label(current == preset, preset.name())
                                    .on_hover_text(preset.description());
                                if response.clicked() {
                                    self.apply_preset(preset);
                                }
                            }
                        });
                });

                ui.add_space(8.0);
                ui.label("Mass");
                let mut mass = self.config.mass;
                if ui
                    .add(egui::Slider::new(&mut mass, 50.0..=300.0))
                    .changed()
                {
                    // Any manual mass edit re-derives the radii and kicks
                    // the config out of its named preset.
                    self.config.set_mass(mass);
                    self.config.current_preset = PresetId::Custom;
                }
                ui.weak(format!(
                    "rs {:.0} px, horizon {:.0} px",
                    self.config.schwarzschild_radius, self.config.event_horizon
                ));

                ui.add_space(8.0);
                ui.label("Particles");
                let mut count = self.config.particle_count;
                if ui
                    .add(egui::Slider::new(&mut count, 50..=2000))
                    .changed()
                {
                    self.config.particle_count = count;
                    self.scene.field.resize_population(count);
                }

                ui.label("Gravity Strength");
                ui.add(egui::Slider::new(
                    &mut self.config.gravity_strength,
                    0.0..=1000.0,
                ));

                ui.label("Accretion Speed");
                ui.add(egui::Slider::new(
                    &mut self.config.accretion_speed,
                    1.0..=20.0,
                ));

                ui.add_space(8.0);
                ui.separator();
                ui.heading("Effects");
                ui.add_space(4.0);

                ui.checkbox(&mut self.config.infinite_zoom, "Infinite Zoom");
                ui.checkbox(&mut self.config.starfield, "Starfield");
                ui.checkbox(&mut self.config.relativistic_jets, "Relativistic Jets");
                ui.checkbox(&mut self.config.hawking_radiation, "Hawking Radiation");
                ui.checkbox(&mut self.config.ergosphere, "Ergosphere");
                ui.checkbox(&mut self.config.frame_dragging, "Frame Dragging");

                ui.add_space(4.0);
                ui.add_enabled_ui(self.lens_available, |ui| {
                    ui.checkbox(&mut self.config.lens_enabled, "Gravitational Lens")
                        .on_disabled_hover_text("Lens backend unavailable");
                });
                if self.config.lens_enabled {
                    ui.label("Lens Strength");
                    ui.add(egui::Slider::new(
                        &mut self.config.lens_strength,
                        0.0..=100.0,
                    ));
                    ui.weak("Applied to snapshots");
                }

                ui.add_space(8.0);
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("💾 Save Config").clicked() {
                        self.save_config();
                    }
                    if ui.button("📂 Load Config").clicked() {
                        self.load_config();
                    }
                });
            });
    }

    fn render_canvas(&mut self, ctx: &egui::Context, dt: f32) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());

            self.scene.resize(rect.width(), rect.height());
            self.scene.tick(&self.config, dt);

            let painter = ui.painter_at(rect);
            self.scene.draw(&painter, rect, &self.config);
        });
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("Black Hole Studio")
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        ..Default::default()
    };

    eframe::run_native(
        "Black Hole Studio",
        options,
        Box::new(|cc| Box::new(BlackHoleApp::new(cc))),
    )
}
