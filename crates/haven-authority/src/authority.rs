//! Transition authority: decides the next session state for each turn

use crate::generator::ReplyGenerator;
use crate::intent::{self, ConsentAnswer, ConsentVocabulary};
use crate::replies;
use haven_core::{ConsentConfig, ConsentKind, Message, Mode, Result, SessionState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the authority did with a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Pending question still open; the answer was neither yes nor no.
    Reasked { kind: ConsentKind },
    /// Pending question answered no. Mode is untouched.
    Declined { kind: ConsentKind, mode: Mode },
    /// A prerequisite for `target` is missing; `kind` is now pending.
    /// `granted` is set when this follows a yes to an earlier question.
    Requested {
        kind: ConsentKind,
        target: Mode,
        granted: Option<ConsentKind>,
    },
    /// Mode changed.
    Switched {
        from: Mode,
        to: Mode,
        granted: Option<ConsentKind>,
    },
    /// Requested mode is already active.
    Unchanged {
        mode: Mode,
        granted: Option<ConsentKind>,
    },
    /// Ordinary conversation, answered by the reply generator.
    Converse,
}

/// Pure result of applying one intent to one state.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub step: Step,
}

/// Full outcome of a turn: the authoritative state and the assistant reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub state: SessionState,
    pub reply: String,
    pub step: Step,
}

impl Decision {
    pub fn into_parts(self) -> (SessionState, String) {
        (self.state, self.reply)
    }
}

pub struct TransitionAuthority {
    generator: Arc<dyn ReplyGenerator>,
    vocabulary: ConsentVocabulary,
    implicit_escalation: bool,
}

impl TransitionAuthority {
    pub fn new(generator: Arc<dyn ReplyGenerator>) -> Self {
        Self::with_consent_config(generator, &ConsentConfig::default())
    }

    pub fn with_consent_config(generator: Arc<dyn ReplyGenerator>, consent: &ConsentConfig) -> Self {
        Self {
            generator,
            vocabulary: ConsentVocabulary::from_config(consent),
            implicit_escalation: consent.implicit_escalation,
        }
    }

    /// Decide the next state and reply for one turn.
    ///
    /// `history` is the conversation before this turn; it is not modified.
    /// Reply-generation failures are returned as errors and no state is
    /// produced for the turn.
    pub async fn decide(
        &self,
        current: &SessionState,
        text: &str,
        history: &[Message],
    ) -> Result<Decision> {
        let Transition { state, step } = self.transition(current, text);

        let reply = match replies::render(&step) {
            Some(settled) => match followup(&step, text) {
                Some(rest) => match self.converse(&state, history, &rest).await {
                    Ok(generated) => format!("{}\n\n{}", settled, generated),
                    // the mode change stands even when the follow-up fails
                    Err(e) => {
                        warn!("Follow-up after mode token failed: {}", e);
                        settled
                    }
                },
                None => settled,
            },
            None => self.converse(&state, history, text).await?,
        };

        Ok(Decision { state, reply, step })
    }

    async fn converse(&self, state: &SessionState, history: &[Message], text: &str) -> Result<String> {
        let mut context = history.to_vec();
        context.push(Message::user(text));
        debug!("Generating reply: mode={} history={}", state.mode, context.len());
        self.generator.generate(state, &context).await
    }

    /// The state machine proper. Never fails and never calls out.
    pub fn transition(&self, current: &SessionState, text: &str) -> Transition {
        let mut state = current.healed();
        if state != *current {
            info!(
                "Healed inconsistent client state: mode {} -> {}, pending {:?} -> {:?}",
                current.mode, state.mode, current.pending_consent, state.pending_consent
            );
        }

        let transition = if let Some(kind) = state.pending_consent {
            match self.vocabulary.classify(text) {
                ConsentAnswer::Yes => {
                    kind.grant(&mut state);
                    state.pending_consent = None;
                    info!("Consent granted: {}", kind);
                    escalate(state, kind.implied_mode(), Some(kind))
                }
                ConsentAnswer::No => {
                    state.pending_consent = None;
                    info!("Consent declined: {}", kind);
                    let mode = state.mode;
                    Transition {
                        state,
                        step: Step::Declined { kind, mode },
                    }
                }
                ConsentAnswer::Unrecognized => Transition {
                    state,
                    step: Step::Reasked { kind },
                },
            }
        } else if let Some(target) = intent::detect_mode_request(text) {
            escalate(state, target, None)
        } else if let Some(kind) = self.implicit_prerequisite(&state, text) {
            info!("Content cue needs consent: {}", kind);
            let target = kind.implied_mode();
            state.pending_consent = Some(kind);
            Transition {
                state,
                step: Step::Requested {
                    kind,
                    target,
                    granted: None,
                },
            }
        } else {
            Transition {
                state,
                step: Step::Converse,
            }
        };

        debug_assert!(transition.state.is_consistent(), "{:?}", transition.state);
        transition
    }

    /// Missing prerequisite for a tier the text reaches for without asking
    /// to switch. Cues at or below the current mode, or for tiers already
    /// permitted, raise nothing.
    fn implicit_prerequisite(&self, state: &SessionState, text: &str) -> Option<ConsentKind> {
        if !self.implicit_escalation {
            return None;
        }
        let cue = intent::content_cue(text)?;
        if cue.rank() <= state.mode.rank() {
            return None;
        }
        state.missing_prerequisite(cue)
    }
}

/// Text to converse on after a settled mode change, when the request came as
/// a `[mode:x]` token with more text around it.
fn followup(step: &Step, text: &str) -> Option<String> {
    match step {
        Step::Switched { granted: None, .. } | Step::Unchanged { granted: None, .. } => {
            intent::strip_mode_token(text)
        }
        _ => None,
    }
}

fn escalate(mut state: SessionState, target: Mode, granted: Option<ConsentKind>) -> Transition {
    if target == state.mode {
        return Transition {
            state,
            step: Step::Unchanged {
                mode: target,
                granted,
            },
        };
    }

    match state.missing_prerequisite(target) {
        Some(kind) => {
            state.pending_consent = Some(kind);
            info!("Mode {} requested, asking for {}", target, kind);
            Transition {
                state,
                step: Step::Requested {
                    kind,
                    target,
                    granted,
                },
            }
        }
        None => {
            let from = state.mode;
            state.mode = target;
            state.pending_consent = None;
            info!("Mode switched: {} -> {}", from, target);
            Transition {
                state,
                step: Step::Switched {
                    from,
                    to: target,
                    granted,
                },
            }
        }
    }
}
