//! Buildings of the preset village

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use village_types::BuildingId;

/// What a building is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Townhall,
    Cannon,
    ArcherTower,
    WizardTower,
    Monolith,
    CreditStorage,
    BuilderHouse,
}

impl BuildingKind {
    /// Preset layout order; building ids follow it starting at 1
    pub const PRESET: [BuildingKind; 7] = [
        BuildingKind::Townhall,
        BuildingKind::Cannon,
        BuildingKind::ArcherTower,
        BuildingKind::WizardTower,
        BuildingKind::Monolith,
        BuildingKind::CreditStorage,
        BuildingKind::BuilderHouse,
    ];

    /// Only the defensive buildings can be upgraded
    pub fn is_upgradable(&self) -> bool {
        matches!(
            self,
            BuildingKind::Cannon
                | BuildingKind::ArcherTower
                | BuildingKind::WizardTower
                | BuildingKind::Monolith
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildingKind::Townhall => "Townhall",
            BuildingKind::Cannon => "Cannon",
            BuildingKind::ArcherTower => "Archer Tower",
            BuildingKind::WizardTower => "Wizard Tower",
            BuildingKind::Monolith => "Monolith",
            BuildingKind::CreditStorage => "Credit Storage",
            BuildingKind::BuilderHouse => "Builder House",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BuildingKind {
    type Err = String;

    /// Accepts `archer-tower`, `archer_tower`, `ArcherTower` and friends
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        BuildingKind::PRESET
            .into_iter()
            .find(|kind| kind.name().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| format!("unknown building: {}", s))
    }
}

/// A placed building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub level: u32,
    /// Set by an ignored disruption, cleared when its Repair completes
    pub damaged: bool,
}

impl Building {
    pub fn new(id: BuildingId, kind: BuildingKind) -> Self {
        Self {
            id,
            kind,
            level: 1,
            damaged: false,
        }
    }

    /// The preset village, every building at level 1
    pub fn preset() -> Vec<Building> {
        BuildingKind::PRESET
            .into_iter()
            .zip(1..)
            .map(|(kind, raw)| Building::new(BuildingId::from_raw(raw), kind))
            .collect()
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Lv. {}", self.kind, self.level)?;
        if self.damaged {
            write!(f, " (damaged)")?;
        }
        Ok(())
    }
}
