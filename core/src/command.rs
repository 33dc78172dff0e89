use serde::{Deserialize, Serialize};

/// Discrete control messages delivered by the host's message channel.
/// Variants may be added, never removed or reordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlMessage {
    // ── Track control ─────────────────────────────
    DisableEarth,
    EnableEarth,
    DisableShip,
    EnableShip,

    // ── Global pause ──────────────────────────────
    Pause,
    Unpause,

    // ── Accumulators ──────────────────────────────
    ResetTime,
    SyncTime,

    // ── Diagnostics ───────────────────────────────
    Status,
}

impl ControlMessage {
    /// Parse a raw channel token. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let msg = match token.trim() {
            "disableEarth" | "pauseEarth"  => Self::DisableEarth,
            "enableEarth"  | "resumeEarth" => Self::EnableEarth,
            "disableShip"  | "pauseShip"   => Self::DisableShip,
            "enableShip"   | "resumeShip"  => Self::EnableShip,
            "pause"                        => Self::Pause,
            "unpause"                      => Self::Unpause,
            "resetTime"    | "reset"       => Self::ResetTime,
            "syncTime"     | "sync"        => Self::SyncTime,
            "status"                       => Self::Status,
            _ => return None,
        };
        Some(msg)
    }

    /// The canonical host token for this message.
    pub fn token(&self) -> &'static str {
        match self {
            Self::DisableEarth => "disableEarth",
            Self::EnableEarth  => "enableEarth",
            Self::DisableShip  => "disableShip",
            Self::EnableShip   => "enableShip",
            Self::Pause        => "pause",
            Self::Unpause      => "unpause",
            Self::ResetTime    => "resetTime",
            Self::SyncTime     => "syncTime",
            Self::Status       => "status",
        }
    }
}
