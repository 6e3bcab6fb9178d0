//! Assistant lines for turns the authority settles without the generator

use crate::authority::Step;
use haven_core::{ConsentKind, Mode};

pub fn consent_question(kind: ConsentKind) -> &'static str {
    match kind {
        ConsentKind::Romance => {
            "I can be romantic only if you want that. Would you like to opt into Romantic mode? \
             You can say yes or no."
        }
        ConsentKind::Adult => {
            "Before we go further, I need to confirm you're an adult. Are you 18 or older? \
             You can say yes or no."
        }
        ConsentKind::Explicit => {
            "I can do explicit adult conversation only with your clear opt-in. \
             Do you want to enter Explicit mode? You can say yes or no."
        }
    }
}

fn acknowledgement(kind: ConsentKind) -> &'static str {
    match kind {
        ConsentKind::Adult => "Thanks for confirming.",
        ConsentKind::Romance | ConsentKind::Explicit => "Thank you.",
    }
}

fn switched(to: Mode) -> String {
    format!("Okay, we're in {} mode now.", to.label())
}

/// Text for a settled step. `None` for ordinary conversation, which the
/// generator answers.
pub fn render(step: &Step) -> Option<String> {
    let text = match step {
        Step::Converse => return None,
        Step::Reasked { kind } => format!(
            "I just need a yes or no so I know where we stand. {}",
            consent_question(*kind)
        ),
        Step::Declined { mode, .. } => {
            format!("No problem. We'll stay in {} mode.", mode.label())
        }
        Step::Requested { kind, granted, .. } => match granted {
            Some(g) => format!("{} {}", acknowledgement(*g), consent_question(*kind)),
            None => consent_question(*kind).to_string(),
        },
        Step::Switched { to, granted, .. } => match granted {
            Some(g) => format!("{} {}", acknowledgement(*g), switched(*to)),
            None => switched(*to),
        },
        Step::Unchanged { mode, .. } => format!("We're already in {} mode.", mode.label()),
    };
    Some(text)
}
