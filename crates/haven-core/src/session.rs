//! Session state: conversation mode, verification and consent flags
//!
//! Wire form is a flat JSON object:
//!
//!   { "mode": "friend", "adult_verified": false, "romance_consented": false,
//!     "explicit_consented": false, "pending_consent": null, "model": "gpt-4o" }
//!
//! Every field is optional on input. Missing, null or unrecognised values fall
//! back to friend / false / none so a stale or hand-edited client state can
//! never widen what the server allows.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conversation intimacy tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Friend,
    #[serde(alias = "romance")]
    Romantic,
    #[serde(alias = "intimate")]
    Explicit,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Friend, Mode::Romantic, Mode::Explicit];

    /// Lenient parse used for wire input and CLI arguments.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "friend" => Some(Mode::Friend),
            "romantic" | "romance" => Some(Mode::Romantic),
            "explicit" | "intimate" | "18+" => Some(Mode::Explicit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Friend => "friend",
            Mode::Romantic => "romantic",
            Mode::Explicit => "explicit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Friend => "Friend",
            Mode::Romantic => "Romantic",
            Mode::Explicit => "Explicit (18+)",
        }
    }

    /// Position in the escalation order; friend is lowest.
    pub fn rank(&self) -> u8 {
        match self {
            Mode::Friend => 0,
            Mode::Romantic => 1,
            Mode::Explicit => 2,
        }
    }

    /// Flags that must be set before this mode may become active, in the
    /// order they are asked for.
    pub fn prerequisites(&self) -> &'static [ConsentKind] {
        match self {
            Mode::Friend => &[],
            Mode::Romantic => &[ConsentKind::Romance],
            Mode::Explicit => &[ConsentKind::Adult, ConsentKind::Explicit],
        }
    }

    /// Natural-language form of a structured mode request. The server's intent
    /// parser recognises this phrasing for every mode.
    pub fn request_hint(&self) -> String {
        format!("Switch to {} mode.", self.as_str())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::parse(s).ok_or_else(|| format!("unknown mode: {}", s))
    }
}

/// The single yes/no question that can be outstanding on a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentKind {
    Romance,
    Adult,
    #[serde(alias = "intimate")]
    Explicit,
}

impl ConsentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "romance" | "romantic" => Some(ConsentKind::Romance),
            "adult" => Some(ConsentKind::Adult),
            "explicit" | "intimate" => Some(ConsentKind::Explicit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentKind::Romance => "romance",
            ConsentKind::Adult => "adult",
            ConsentKind::Explicit => "explicit",
        }
    }

    /// Mode the user was reaching for when this question was raised.
    pub fn implied_mode(&self) -> Mode {
        match self {
            ConsentKind::Romance => Mode::Romantic,
            ConsentKind::Adult | ConsentKind::Explicit => Mode::Explicit,
        }
    }

    pub fn is_granted(&self, state: &SessionState) -> bool {
        match self {
            ConsentKind::Romance => state.romance_consented,
            ConsentKind::Adult => state.adult_verified,
            ConsentKind::Explicit => state.explicit_consented,
        }
    }

    /// Set the flag this question guards. Flags only ever go from false to true.
    pub fn grant(&self, state: &mut SessionState) {
        match self {
            ConsentKind::Romance => state.romance_consented = true,
            ConsentKind::Adult => state.adult_verified = true,
            ConsentKind::Explicit => state.explicit_consented = true,
        }
    }
}

impl fmt::Display for ConsentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-conversation consent state. Owned by the server, mirrored by clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: Mode,
    #[serde(default, deserialize_with = "null_as_false")]
    pub adult_verified: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub romance_consented: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub explicit_consented: bool,
    #[serde(default, deserialize_with = "lenient_pending")]
    pub pending_consent: Option<ConsentKind>,
    /// Reply-generation model id. Opaque to the state machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Companion persona descriptor, `First-Gender-Ethnicity-Generation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion: Option<String>,
}

impl SessionState {
    /// Fresh conversation: friend mode, nothing verified or consented.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_companion(mut self, companion: impl Into<String>) -> Self {
        self.companion = Some(companion.into());
        self
    }

    /// First unmet prerequisite for `mode`, adult verification before explicit consent.
    pub fn missing_prerequisite(&self, mode: Mode) -> Option<ConsentKind> {
        mode.prerequisites()
            .iter()
            .copied()
            .find(|kind| !kind.is_granted(self))
    }

    pub fn permits(&self, mode: Mode) -> bool {
        self.missing_prerequisite(mode).is_none()
    }

    pub fn has_pending_consent(&self) -> bool {
        self.pending_consent.is_some()
    }

    /// Mode is backed by its flags and any pending question names the first
    /// prerequisite still missing for the mode it was raised for.
    pub fn is_consistent(&self) -> bool {
        if !self.permits(self.mode) {
            return false;
        }
        match self.pending_consent {
            None => true,
            Some(kind) => self.missing_prerequisite(kind.implied_mode()) == Some(kind),
        }
    }

    /// Copy with any inconsistency repaired: an unauthorised mode drops to
    /// friend, and a pending question is re-pointed at whatever is still
    /// missing for its mode (or cleared when nothing is).
    pub fn healed(&self) -> SessionState {
        let mut next = self.clone();
        if !next.permits(next.mode) {
            next.mode = Mode::Friend;
        }
        if let Some(kind) = next.pending_consent {
            next.pending_consent = next.missing_prerequisite(kind.implied_mode());
        }
        next
    }
}

fn lenient_mode<'de, D>(deserializer: D) -> Result<Mode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Mode::parse).unwrap_or_default())
}

fn lenient_pending<'de, D>(deserializer: D) -> Result<Option<ConsentKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ConsentKind::parse))
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_friend_with_nothing_granted() {
        let s = SessionState::new();
        assert_eq!(s.mode, Mode::Friend);
        assert!(!s.adult_verified && !s.romance_consented && !s.explicit_consented);
        assert!(s.pending_consent.is_none());
        assert!(s.is_consistent());
    }

    #[test]
    fn explicit_asks_adult_before_explicit() {
        let mut s = SessionState::new();
        assert_eq!(s.missing_prerequisite(Mode::Explicit), Some(ConsentKind::Adult));
        s.adult_verified = true;
        assert_eq!(s.missing_prerequisite(Mode::Explicit), Some(ConsentKind::Explicit));
        s.explicit_consented = true;
        assert!(s.permits(Mode::Explicit));
        // explicit does not depend on romance
        assert!(!s.permits(Mode::Romantic));
    }

    #[test]
    fn healed_repoints_stale_pending() {
        let s = SessionState {
            adult_verified: true,
            pending_consent: Some(ConsentKind::Adult),
            ..SessionState::new()
        };
        assert!(!s.is_consistent());
        let h = s.healed();
        assert_eq!(h.pending_consent, Some(ConsentKind::Explicit));
        assert!(h.is_consistent());
    }
}
