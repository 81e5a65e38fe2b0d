//! Upgrade missions

use crate::building::Building;
use serde::{Deserialize, Serialize};
use std::fmt;
use village_types::BuildingId;

/// "Upgrade X to Level N" goal for one building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: u32,
    pub building: BuildingId,
    pub target_level: u32,
    pub description: String,
    pub completed: bool,
}

impl Mission {
    pub fn for_building(id: u32, building: &Building) -> Self {
        let target_level = building.level + 1;
        Self {
            id,
            building: building.id,
            target_level,
            description: format!("Upgrade {} to Level {}", building.kind, target_level),
            completed: false,
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.completed { "x" } else { " " };
        write!(f, "[{}] {}", mark, self.description)
    }
}

/// One mission per upgradable building, in preset order, at most `count`
pub fn generate(buildings: &[Building], count: usize) -> Vec<Mission> {
    buildings
        .iter()
        .filter(|building| building.kind.is_upgradable())
        .take(count)
        .zip(1..)
        .map(|(building, id)| Mission::for_building(id, building))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_skips_non_upgradable() {
        let missions = generate(&Building::preset(), 2);
        assert_eq!(missions.len(), 2);
        assert_eq!(missions[0].description, "Upgrade Cannon to Level 2");
        assert_eq!(missions[1].description, "Upgrade Archer Tower to Level 2");
    }

    #[test]
    fn test_generate_capped_by_upgradable_count() {
        assert_eq!(generate(&Building::preset(), 10).len(), 4);
    }

    #[test]
    fn test_mission_display() {
        let mut mission = generate(&Building::preset(), 1).remove(0);
        assert_eq!(mission.to_string(), "[ ] Upgrade Cannon to Level 2");
        mission.completed = true;
        assert_eq!(mission.to_string(), "[x] Upgrade Cannon to Level 2");
    }
}
