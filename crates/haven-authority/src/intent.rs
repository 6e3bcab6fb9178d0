//! Reading intent out of user text: mode requests, consent answers, content cues

use haven_core::{ConsentConfig, Mode};
use regex::Regex;
use std::sync::LazyLock;

const MODE_WORDS: &str = "friend|romantic|romance|explicit|intimate";

static MODE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\[?\bmode\s*:\s*({MODE_WORDS})\b\]?")).expect("mode token regex")
});

static SWITCH_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:switch|set|turn|go|change|move|back|enable|put)\b[^.!?]{{0,24}}?\b(?:to|into|on)\s+(?:the\s+)?({MODE_WORDS})(?:\s+mode)?\s*(?:[.!?,]|$|\s+(?:please|now)\b)"
    ))
    .expect("switch regex")
});

static NEGATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:don['’]?t|do\s+not|never|not|no)\s+(?:\w+\s+){0,2}(?:switch|set|turn|go|change|move|enable|put|want|use|be)\b")
        .expect("negation regex")
});

static TOKEN_ANY_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\[?\bmode\s*:\s*(?:{MODE_WORDS})\b\]?")).expect("token strip regex")
});

static NAMED_MODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({MODE_WORDS})\s+mode\b")).expect("named mode regex")
});

static LETS_BE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\blet['’]?s\s+be\s+(romantic|friends?)\b").expect("lets-be regex")
});

static BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*({MODE_WORDS})\s*[.!]*\s*$")).expect("bare mode regex")
});

static EXPLICIT_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:sex|sexy|fuck|make love|erotic|nude|nudes|naked|orgasm|porn)\b")
        .expect("explicit cue regex")
});

static ROMANCE_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:girlfriend|boyfriend|love you|kiss|kisses|flirt|flirting|romantic|date me|go on a date)\b")
        .expect("romance cue regex")
});

/// Detect an explicit request to change mode.
///
/// Recognised forms, checked in order: `[mode:x]` / `mode:x` tokens,
/// "switch/set/go/... to x", "x mode", "let's be romantic", and the bare mode
/// word on its own. Apart from tokens, a negated request ("don't switch to
/// explicit mode") is not a request.
pub fn detect_mode_request(text: &str) -> Option<Mode> {
    let lowered = text.to_lowercase();
    if let Some(mode) = capture_mode(&MODE_TOKEN, &lowered) {
        return Some(mode);
    }
    if NEGATED.is_match(&lowered) {
        return None;
    }
    [&*SWITCH_TO, &*NAMED_MODE, &*LETS_BE, &*BARE]
        .iter()
        .find_map(|re| capture_mode(re, &lowered))
}

fn capture_mode(re: &Regex, lowered: &str) -> Option<Mode> {
    let word = re.captures(lowered)?.get(1)?;
    match word.as_str() {
        "friends" => Some(Mode::Friend),
        w => Mode::parse(w),
    }
}

/// What is left of the text once `[mode:x]` tokens are removed, when the
/// text had a token and anything else remains.
pub fn strip_mode_token(text: &str) -> Option<String> {
    if !TOKEN_ANY_CASE.is_match(text) {
        return None;
    }
    let rest = TOKEN_ANY_CASE.replace_all(text, " ");
    let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(rest).filter(|r| !r.is_empty())
}

/// Highest tier whose content cues appear in the text.
pub fn content_cue(text: &str) -> Option<Mode> {
    let lowered = text.to_lowercase();
    if EXPLICIT_CUES.is_match(&lowered) {
        Some(Mode::Explicit)
    } else if ROMANCE_CUES.is_match(&lowered) {
        Some(Mode::Romantic)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsentAnswer {
    Yes,
    No,
    Unrecognized,
}

/// Literal yes/no vocabularies. An utterance counts only when, trimmed and
/// lowercased, it equals one of the entries.
#[derive(Clone, Debug)]
pub struct ConsentVocabulary {
    affirmative: Vec<String>,
    negative: Vec<String>,
}

impl Default for ConsentVocabulary {
    fn default() -> Self {
        Self::from_config(&ConsentConfig::default())
    }
}

impl ConsentVocabulary {
    pub fn new<I, S>(affirmative: I, negative: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let collect = |words: I| -> Vec<String> {
            words
                .into_iter()
                .map(|w| normalize(w.as_ref()))
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            affirmative: collect(affirmative),
            negative: collect(negative),
        }
    }

    pub fn from_config(config: &ConsentConfig) -> Self {
        Self::new(&config.affirmative, &config.negative)
    }

    pub fn classify(&self, text: &str) -> ConsentAnswer {
        let t = normalize(text);
        if self.affirmative.iter().any(|w| *w == t) {
            ConsentAnswer::Yes
        } else if self.negative.iter().any(|w| *w == t) {
            ConsentAnswer::No
        } else {
            ConsentAnswer::Unrecognized
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
