//! Configuration for Black Hole Studio.
//! A flat parameter store read by every simulation layer each frame.

use serde::{Deserialize, Serialize};

use crate::presets::PresetId;

/// Simulation parameters. Owned by the host application; the simulation
/// layers only read it. `schwarzschild_radius` and `event_horizon` are
/// derived from `mass` and must never be written directly outside of
/// [`SimConfig::set_mass`] and preset application.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SimConfig {
    pub mass: f32,
    pub particle_count: usize,
    pub gravity_strength: f32,
    pub lens_strength: f32,
    pub accretion_speed: f32,

    pub schwarzschild_radius: f32,
    pub event_horizon: f32,

    pub infinite_zoom: bool,
    pub lens_enabled: bool,
    pub relativistic_jets: bool,
    pub hawking_radiation: bool,
    pub ergosphere: bool,
    pub frame_dragging: bool,
    #[serde(default = "default_true")]
    pub starfield: bool,

    #[serde(default)]
    pub current_preset: PresetId,
}

fn default_true() -> bool {
    true
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut config = Self {
            mass: 150.0,
            particle_count: 300,
            gravity_strength: 500.0,
            lens_strength: 50.0,
            accretion_speed: 5.0,
            schwarzschild_radius: 0.0,
            event_horizon: 0.0,
            infinite_zoom: true,
            lens_enabled: false,
            relativistic_jets: false,
            hawking_radiation: false,
            ergosphere: false,
            frame_dragging: false,
            starfield: true,
            current_preset: PresetId::Custom,
        };
        config.set_mass(150.0);
        config
    }
}

impl SimConfig {
    /// Set the black hole mass and re-derive the dependent radii.
    /// Both derived fields are in sync before this returns.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.schwarzschild_radius = 60.0 * (mass / 150.0);
        self.event_horizon = 1.5 * self.schwarzschild_radius;
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a config from JSON. For custom configs the derived radii are
    /// recomputed so a hand-edited file cannot desynchronize them from
    /// the mass. Named presets keep their display radii as saved.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config: SimConfig = serde_json::from_str(&json)?;
        if config.current_preset == PresetId::Custom {
            config.set_mass(config.mass);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_radii_follow_mass() {
        let mut config = SimConfig::default();
        assert_eq!(config.schwarzschild_radius, 60.0);
        assert_eq!(config.event_horizon, 90.0);

        config.set_mass(300.0);
        assert_eq!(config.schwarzschild_radius, 120.0);
        assert_eq!(config.event_horizon, 180.0);

        config.set_mass(75.0);
        assert_eq!(config.schwarzschild_radius, 30.0);
        assert_eq!(config.event_horizon, 45.0);
    }

    #[test]
    fn load_rederives_radii() {
        let mut config = SimConfig::default();
        config.set_mass(200.0);
        // Sabotage the derived fields in the serialized form.
        config.schwarzschild_radius = 1.0;
        config.event_horizon = 1.0;

        let path = std::env::temp_dir().join("bhstudio-config-rederive.json");
        let path = path.to_string_lossy().to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = SimConfig::load(&path).unwrap();
        assert_eq!(loaded.mass, 200.0);
        assert_eq!(loaded.schwarzschild_radius, 80.0);
        assert_eq!(loaded.event_horizon, 120.0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn named_preset_radii_survive_load() {
        let mut config = SimConfig::default();
        PresetId::SagittariusA.apply_to(&mut config);
        // Display radius 70 deliberately differs from the mass formula.
        assert_eq!(config.schwarzschild_radius, 70.0);

        let path = std::env::temp_dir().join("bhstudio-config-preset.json");
        let path = path.to_string_lossy().to_string();
        config.save(&path).unwrap();

        let loaded = SimConfig::load(&path).unwrap();
        assert_eq!(loaded.current_preset, PresetId::SagittariusA);
        assert_eq!(loaded.schwarzschild_radius, 70.0);
        assert_eq!(loaded.event_horizon, 105.0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_load_round_trip() {
        let mut config = SimConfig::default();
        config.particle_count = 777;
        config.relativistic_jets = true;
        config.accretion_speed = 12.0;

        let path = std::env::temp_dir().join("bhstudio-config-roundtrip.json");
        let path = path.to_string_lossy().to_string();
        config.save(&path).unwrap();

        let loaded = SimConfig::load(&path).unwrap();
        assert_eq!(loaded.particle_count, 777);
        assert!(loaded.relativistic_jets);
        assert_eq!(loaded.accretion_speed, 12.0);
        std::fs::remove_file(&path).ok();
    }
}
