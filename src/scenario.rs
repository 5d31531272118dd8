use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::{project, Coordinate};
use crate::wind::{read_csv, CsvDialect, LongitudePolicy, WindField};

fn default_ticks() -> u64 {
    500
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Wind-driven balloons and point-to-point dirigibles.
    #[default]
    Airships,
    PredatorPrey,
}

/// Axis-aligned sampling rectangle for random spawn points, in planar units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindSource {
    pub path: PathBuf,
    #[serde(default)]
    pub dialect: CsvDialect,
    #[serde(default)]
    pub longitude: LongitudePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonSettings {
    pub spawn_probability: f64,
    pub cap: usize,
    pub min_steps: u32,
    pub max_steps: u32,
}

impl Default for BalloonSettings {
    fn default() -> Self {
        Self {
            spawn_probability: 0.2,
            cap: 40,
            min_steps: 50,
            max_steps: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirigibleSettings {
    pub spawn_probability: f64,
    pub cap: usize,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for DirigibleSettings {
    fn default() -> Self {
        Self {
            spawn_probability: 0.2,
            cap: 15,
            min_speed: 5_000.0,
            max_speed: 20_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorPreySettings {
    pub predators: usize,
    pub prey: usize,
    pub predator_speed: SpeedRange,
    pub prey_speed: SpeedRange,
}

impl Default for PredatorPreySettings {
    fn default() -> Self {
        Self {
            predators: 2,
            prey: 10,
            predator_speed: SpeedRange {
                min: 8_000.0,
                max: 12_000.0,
            },
            prey_speed: SpeedRange {
                min: 4_000.0,
                max: 8_000.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn position(&self) -> Coordinate {
        project(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    /// Absent means a fresh entropy seed on every run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub mode: SimulationMode,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    pub envelope: Envelope,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub wind: Option<WindSource>,
    #[serde(default)]
    pub balloons: BalloonSettings,
    #[serde(default)]
    pub dirigibles: DirigibleSettings,
    #[serde(default)]
    pub cities: Vec<City>,
    #[serde(default)]
    pub predator_prey: PredatorPreySettings,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        let envelope = &self.envelope;
        for (axis, min, max) in [
            ("x", envelope.min_x, envelope.max_x),
            ("y", envelope.min_y, envelope.max_y),
        ] {
            ensure!(
                min.is_finite() && max.is_finite() && (max - min).is_finite(),
                "scenario '{}': envelope {axis} bounds must be finite with a finite width",
                self.name
            );
            ensure!(
                min < max,
                "scenario '{}': envelope must have min < max on the {axis} axis",
                self.name
            );
        }
        for (label, p) in [
            ("balloons.spawn_probability", self.balloons.spawn_probability),
            ("dirigibles.spawn_probability", self.dirigibles.spawn_probability),
        ] {
            ensure!(
                (0.0..=1.0).contains(&p),
                "scenario '{}': {label} must lie in [0, 1], got {p}",
                self.name
            );
        }
        ensure!(
            self.balloons.min_steps <= self.balloons.max_steps,
            "scenario '{}': balloons.min_steps exceeds max_steps",
            self.name
        );
        for (label, min, max) in [
            ("dirigibles", self.dirigibles.min_speed, self.dirigibles.max_speed),
            (
                "predator_prey.predator_speed",
                self.predator_prey.predator_speed.min,
                self.predator_prey.predator_speed.max,
            ),
            (
                "predator_prey.prey_speed",
                self.predator_prey.prey_speed.min,
                self.predator_prey.prey_speed.max,
            ),
        ] {
            ensure!(
                min.is_finite() && max.is_finite() && min > 0.0 && min <= max,
                "scenario '{}': {label} speed range must be finite and positive with min <= max",
                self.name
            );
        }
        if self.mode == SimulationMode::PredatorPrey {
            ensure!(
                self.predator_prey.prey > 0,
                "scenario '{}': predator_prey mode needs at least one prey",
                self.name
            );
        }
        Ok(())
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or_else(default_ticks)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml_str(&data).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Reads the scenario's wind table. Without a `wind` section the field is
    /// empty and every balloon lookup misses.
    pub fn load_wind(&self, scenario: &Scenario) -> Result<WindField> {
        let Some(source) = &scenario.wind else {
            if scenario.mode == SimulationMode::Airships {
                warn!(scenario = %scenario.name, "no wind table configured, balloons will not drift");
            }
            return Ok(WindField::default());
        };
        let path = self.base_dir.join(&source.path);
        let records = read_csv(&path, source.dialect)
            .with_context(|| format!("Failed to read wind table {}", path.display()))?;
        Ok(WindField::build(records, source.longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: minimal
envelope: { min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 }
"#;

    #[test]
    fn defaults_fill_missing_sections() {
        let scenario = Scenario::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(scenario.mode, SimulationMode::Airships);
        assert_eq!(scenario.seed, None);
        assert_eq!(scenario.tick_interval_ms, 1_000);
        assert_eq!(scenario.balloons.cap, 40);
        assert_eq!(scenario.ticks(None), 500);
        assert_eq!(scenario.ticks(Some(3)), 3);
        assert!(scenario.wind.is_none());
    }

    #[test]
    fn inverted_envelope_is_rejected() {
        let text = MINIMAL.replace("max_x: 10.0", "max_x: -1.0");
        assert!(Scenario::from_yaml_str(&text).is_err());
    }

    #[test]
    fn probability_out_of_range_is_rejected() {
        let text = format!("{MINIMAL}balloons: {{ spawn_probability: 1.5 }}\n");
        let err = Scenario::from_yaml_str(&text).unwrap_err();
        assert!(format!("{err:#}").contains("balloons.spawn_probability"));
    }

    #[test]
    fn infinite_speed_is_rejected() {
        let text = format!("{MINIMAL}dirigibles: {{ spawn_probability: 1.0, max_speed: .inf }}\n");
        let err = Scenario::from_yaml_str(&text).unwrap_err();
        assert!(format!("{err:#}").contains("dirigibles speed range"));

        let text = format!("{MINIMAL}predator_prey: {{ prey_speed: {{ min: .nan, max: 5.0 }} }}\n");
        assert!(Scenario::from_yaml_str(&text).is_err());
    }

    #[test]
    fn envelope_must_be_finite_and_not_overflow() {
        let text = MINIMAL.replace("max_y: 10.0", "max_y: .inf");
        assert!(Scenario::from_yaml_str(&text).is_err());

        let text = MINIMAL
            .replace("min_x: 0.0", "min_x: -1.0e308")
            .replace("max_x: 10.0", "max_x: 1.0e308");
        let err = Scenario::from_yaml_str(&text).unwrap_err();
        assert!(format!("{err:#}").contains("finite width"));
    }

    #[test]
    fn predator_mode_without_prey_is_rejected() {
        let text = format!("{MINIMAL}mode: predator_prey\npredator_prey: {{ prey: 0 }}\n");
        assert!(Scenario::from_yaml_str(&text).is_err());
    }

    #[test]
    fn wind_loads_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("wind.csv"), "U;V;la;lo\n1,5;2;10;20\n").unwrap();
        let text = format!(
            "{MINIMAL}wind: {{ path: wind.csv, dialect: semicolon, longitude: absolute }}\n"
        );
        let scenario = Scenario::from_yaml_str(&text).unwrap();
        let field = ScenarioLoader::new(dir.path()).load_wind(&scenario).unwrap();
        assert_eq!(field.len(), 1);
        assert_eq!(field.policy(), LongitudePolicy::Absolute);
        let wind = field.lookup(&project(10.0, 20.0)).unwrap();
        assert_eq!(wind.u, 150.0);
    }
}
