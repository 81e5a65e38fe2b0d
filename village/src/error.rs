use crate::building::BuildingKind;
use sim_scheduler::SchedulerError;
use thiserror::Error;
use village_types::BuildingId;

/// Village-level errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VillageError {
    #[error("Insufficient credits: needed {needed}, available {available}")]
    InsufficientResources { needed: u64, available: u64 },

    #[error("Unknown building: {0}")]
    UnknownBuilding(BuildingId),

    #[error("No {0} in the village")]
    MissingBuilding(BuildingKind),

    #[error("{0} cannot be upgraded")]
    NotUpgradable(BuildingKind),

    #[error("{0} is damaged and awaiting repair")]
    BuildingDamaged(BuildingKind),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}
