//! Hero quests.
//!
//! Quests are long-running objectives attached to a hero. The allocation
//! engine only asks where a quest wants its hero to go; completion and
//! expiry are decided by `World::update_quests`.

use super::city::CityId;
use super::player::PlayerId;
use super::unit::ArmyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestKind {
    /// Kill the given enemy hero.
    KillHero(ArmyId),
    /// Capture the given city.
    CaptureCity(CityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quest {
    pub hero: ArmyId,
    pub owner: PlayerId,
    pub kind: QuestKind,
    /// Last turn on which the quest may be completed.
    pub deadline: u32,
}

/// Result of evaluating a quest at the end of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestStatus {
    Pending,
    Completed,
    Expired,
}
