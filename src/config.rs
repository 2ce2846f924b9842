//! Simulation configuration (spec.md §6). Deserialized with `serde`,
//! validated into concrete runtime types (`Environment`, `worldgen`
//! strategies) by [`crate::scheduler::Simulation::from_config`]; anything
//! inconsistent aborts construction with a [`crate::error::ConfigError`]
//! before any tick runs (spec.md §7).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::coord::Coord;
use crate::error::ConfigError;
use crate::molecule::{Molecule, MoleculeType};

/// The known `kind` tags for [`RawEnergyStrategyConfig`]. Kept separate from
/// [`EnergyStrategyConfig`] so an unrecognized tag can be reported as a
/// [`ConfigError::UnknownEnergyStrategy`] instead of a generic `serde_json`
/// parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase")]
enum EnergyStrategyKind {
    Solar,
    Geyser,
}

/// As deserialized from config JSON: `kind` is taken as a bare string so
/// [`RawEnergyStrategyConfig::resolve`] can validate it itself, rather than
/// letting `serde`'s internally-tagged enum matching reject an unrecognized
/// `kind` before construction ever reaches [`crate::scheduler::Simulation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnergyStrategyConfig {
    pub kind: String,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub amount: Option<i32>,
    #[serde(default)]
    pub safety_radius: Option<i32>,
    #[serde(default)]
    pub sample_fraction: Option<f64>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub interval: Option<u64>,
}

impl RawEnergyStrategyConfig {
    pub fn resolve(&self) -> Result<EnergyStrategyConfig, ConfigError> {
        let kind: EnergyStrategyKind = self
            .kind
            .parse()
            .map_err(|_| ConfigError::UnknownEnergyStrategy(self.kind.clone()))?;
        Ok(match kind {
            EnergyStrategyKind::Solar => EnergyStrategyConfig::Solar {
                probability: self.probability.unwrap_or(0.0),
                amount: self.amount.unwrap_or(0),
                safety_radius: self.safety_radius.unwrap_or(0),
                sample_fraction: self.sample_fraction,
            },
            EnergyStrategyKind::Geyser => EnergyStrategyConfig::Geyser {
                count: self.count.unwrap_or(0),
                interval: self.interval.unwrap_or(0),
                amount: self.amount.unwrap_or(0),
                safety_radius: self.safety_radius.unwrap_or(0),
            },
        })
    }
}

/// Validated, ready-to-build energy strategy shape; produced only via
/// [`RawEnergyStrategyConfig::resolve`].
#[derive(Debug, Clone)]
pub enum EnergyStrategyConfig {
    Solar {
        probability: f64,
        amount: i32,
        safety_radius: i32,
        sample_fraction: Option<f64>,
    },
    Geyser {
        count: usize,
        interval: u64,
        amount: i32,
        safety_radius: i32,
    },
}

/// A molecule to seed directly into the world at construction time, relative
/// to no organism (unlike a program artifact's `initial_world_objects`, which
/// are placed relative to a spawn position).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialWorldObjectConfig {
    pub position: Vec<i32>,
    pub molecule_type: String,
    #[serde(default)]
    pub value: i32,
}

impl InitialWorldObjectConfig {
    pub fn position_coord(&self) -> Coord {
        Coord::new(self.position.clone())
    }

    /// Resolves `molecule_type` into a concrete molecule, failing with
    /// [`ConfigError::UnknownMoleculeType`] for anything but `CODE`, `DATA`,
    /// `ENERGY`, or `STRUCTURE`.
    pub fn resolve(&self) -> Result<Molecule, ConfigError> {
        let ty = MoleculeType::from_name(&self.molecule_type)
            .map_err(|_| ConfigError::UnknownMoleculeType(self.molecule_type.clone()))?;
        Ok(Molecule::new(ty, self.value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialOrganismConfig {
    pub program_id: Option<String>,
    pub position: Vec<i32>,
    pub initial_energy: i64,
    #[serde(default)]
    pub dv: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub world_shape: Vec<i32>,
    #[serde(default)]
    pub toroidal: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub energy_strategies: Vec<RawEnergyStrategyConfig>,
    #[serde(default)]
    pub auto_pause_ticks: Option<Vec<u64>>,
    #[serde(default)]
    pub max_ticks: Option<u64>,
    #[serde(default)]
    pub initial_world_objects: Vec<InitialWorldObjectConfig>,
    #[serde(default)]
    pub initial_organisms: Vec<InitialOrganismConfig>,
}

impl InitialOrganismConfig {
    pub fn position_coord(&self) -> Coord {
        Coord::new(self.position.clone())
    }

    pub fn dv_coord(&self, world_dim: usize) -> Coord {
        match &self.dv {
            Some(dv) => Coord::new(dv.clone()),
            None => Coord::zeros(world_dim),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn deserializes_from_camel_case_json() {
        let json = r#"{
            "worldShape": [10, 10],
            "toroidal": true,
            "seed": 42,
            "energyStrategies": [
                {"kind": "solar", "probability": 0.1, "amount": 5, "safetyRadius": 1}
            ],
            "initialOrganisms": [
                {"programId": "p1", "position": [0, 0], "initialEnergy": 100}
            ]
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.world_shape, vec![10, 10]);
        assert!(config.toroidal);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.energy_strategies.len(), 1);
        assert_eq!(config.initial_organisms[0].program_id.as_deref(), Some("p1"));
    }

    #[test]
    fn resolve_rejects_unknown_energy_strategy_kind() {
        let raw = RawEnergyStrategyConfig {
            kind: "volcano".into(),
            probability: None,
            amount: None,
            safety_radius: None,
            sample_fraction: None,
            count: None,
            interval: None,
        };
        assert!(matches!(
            raw.resolve(),
            Err(ConfigError::UnknownEnergyStrategy(k)) if k == "volcano"
        ));
    }

    #[test]
    fn resolve_accepts_known_energy_strategy_kinds() {
        let solar = RawEnergyStrategyConfig {
            kind: "solar".into(),
            probability: Some(0.2),
            amount: Some(3),
            safety_radius: Some(1),
            sample_fraction: None,
            count: None,
            interval: None,
        };
        assert!(matches!(solar.resolve(), Ok(EnergyStrategyConfig::Solar { .. })));

        let geyser = RawEnergyStrategyConfig {
            kind: "geyser".into(),
            probability: None,
            amount: Some(4),
            safety_radius: Some(0),
            sample_fraction: None,
            count: Some(2),
            interval: Some(5),
        };
        assert!(matches!(geyser.resolve(), Ok(EnergyStrategyConfig::Geyser { .. })));
    }

    #[test]
    fn world_object_resolve_rejects_unknown_molecule_type() {
        let obj = InitialWorldObjectConfig {
            position: vec![0, 0],
            molecule_type: "PLASMA".into(),
            value: 1,
        };
        assert!(matches!(
            obj.resolve(),
            Err(ConfigError::UnknownMoleculeType(name)) if name == "PLASMA"
        ));
    }

    #[test]
    fn world_object_resolve_accepts_known_molecule_type() {
        let obj = InitialWorldObjectConfig {
            position: vec![1, 1],
            molecule_type: "energy".into(),
            value: 7,
        };
        let molecule = obj.resolve().unwrap();
        assert_eq!(molecule, crate::molecule::Molecule::new(crate::molecule::MoleculeType::Energy, 7));
    }
}
