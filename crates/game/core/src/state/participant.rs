use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{ParticipantId, Timestamp};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Invited,
    Joined,
    Declined,
    Left,
}

/// Role flags supplied when a participant is added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantFlags {
    pub host: bool,
    pub npc: bool,
}

impl ParticipantFlags {
    pub const PLAYER: Self = Self {
        host: false,
        npc: false,
    };
    pub const HOST: Self = Self {
        host: true,
        npc: false,
    };
    pub const NPC: Self = Self {
        host: false,
        npc: true,
    };
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub team_id: u32,
    pub is_host: bool,
    pub is_npc: bool,
    pub status: ParticipantStatus,
    pub joined_at: Option<Timestamp>,
    /// Insertion sequence; breaks speed ties in the turn order.
    pub join_order: u32,
}

impl Participant {
    pub fn is_joined(&self) -> bool {
        self.status == ParticipantStatus::Joined
    }
}
