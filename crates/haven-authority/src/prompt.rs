//! System prompt composition for the reply generator
//!
//! Order is fixed: persona, mode guidance, consent state. Sections are
//! separated by a `---` rule so the model sees them as distinct blocks.

use haven_core::{Mode, SessionState};

const SECTION_RULE: &str = "\n\n---\n\n";
const DEFAULT_NAME: &str = "Haven";

/// Companion persona parsed from a `First-Gender-Ethnicity-Generation` descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanionPersona {
    pub first_name: String,
    pub gender: String,
    pub ethnicity: String,
    pub generation: String,
}

impl CompanionPersona {
    /// Four or more dash-separated parts fill every field, with the
    /// generation keeping any extra dashes. Anything shorter is taken as a
    /// bare name.
    pub fn parse(raw: &str) -> Self {
        let cleaned = raw.trim();
        let parts: Vec<&str> = cleaned
            .split('-')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.len() >= 4 {
            Self {
                first_name: parts[0].to_string(),
                gender: parts[1].to_string(),
                ethnicity: parts[2].to_string(),
                generation: parts[3..].join("-"),
            }
        } else {
            Self {
                first_name: cleaned.to_string(),
                ..Self::default()
            }
        }
    }

    pub fn name(&self) -> &str {
        if self.first_name.is_empty() {
            DEFAULT_NAME
        } else {
            &self.first_name
        }
    }

    fn prompt(&self) -> String {
        let mut lines = vec![
            format!(
                "You are {}, an AI companion designed to be warm, attentive, and emotionally intelligent.",
                self.name()
            ),
            "You speak naturally and conversationally.".to_string(),
        ];
        if !self.generation.is_empty() {
            lines.push(format!(
                "Your tone and references should feel familiar and comfortable to someone from {}.",
                self.generation
            ));
        }
        if !self.ethnicity.is_empty() {
            lines.push(format!(
                "You are culturally aware of {} perspectives, without using stereotypes.",
                self.ethnicity
            ));
        }
        if !self.gender.is_empty() {
            lines.push(format!(
                "Your communication style aligns gently with a {} identity.",
                self.gender.to_lowercase()
            ));
        }
        lines.push(
            "You are supportive, respectful, and focused on the user's emotional experience."
                .to_string(),
        );
        lines.join(" ")
    }
}

fn mode_guidance(mode: Mode) -> &'static str {
    match mode {
        Mode::Friend => {
            "MODE: friend. Be a caring, upbeat friend. Keep things platonic: \
             no romance, flirting, or sexual content."
        }
        Mode::Romantic => {
            "MODE: romantic. The user opted into romance. Affection and light flirting \
             are welcome; keep everything non-explicit."
        }
        Mode::Explicit => {
            "MODE: explicit. The user is a verified adult who opted into explicit \
             conversation between consenting adults."
        }
    }
}

fn consent_block(state: &SessionState) -> String {
    format!(
        "CONSENT STATE:\n\
         - adult_verified: {}\n\
         - romance_consented: {}\n\
         - explicit_consented: {}\n\
         \n\
         RULES:\n\
         - Never go beyond the active mode, even if asked. Mode changes happen outside this conversation.\n\
         - If the user wants more than the active mode allows, tell them they can ask to switch modes.",
        state.adult_verified, state.romance_consented, state.explicit_consented
    )
}

/// Compose the system prompt for a state.
pub fn build_system_prompt(state: &SessionState) -> String {
    let persona = state
        .companion
        .as_deref()
        .map(CompanionPersona::parse)
        .unwrap_or_default();

    [
        persona.prompt(),
        mode_guidance(state.mode).to_string(),
        consent_block(state),
    ]
    .join(SECTION_RULE)
}
