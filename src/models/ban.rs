//! Moderation bans

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Timestamp;
use crate::utils::errors::LotteryError;

/// Which role a ban applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BanKind {
    /// May no longer join waitlists
    Entrant,
    /// May no longer create events
    Organizer,
}

impl BanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BanKind::Entrant => "entrant",
            BanKind::Organizer => "organizer",
        }
    }
}

impl fmt::Display for BanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BanKind {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrant" => Ok(BanKind::Entrant),
            "organizer" => Ok(BanKind::Organizer),
            other => Err(LotteryError::CorruptRecord(format!("Unknown ban kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ban {
    pub subject_id: String,
    pub kind: BanKind,
    pub banned_by: String,
    pub banned_at: Timestamp,
}
