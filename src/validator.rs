//! Local prompt filters run before any external call.

use crate::models::{Config, RefusalReason};
use tracing::info;

pub const MIN_PROMPT_CHARS: usize = 3;
pub const MAX_PROMPT_CHARS: usize = 200;

const VOWELS: &str = "aeiouyàâéèêëîïôûùç";
const MAX_REPEAT_RUN: usize = 4;

/// Outcome of the local filters. Carries the trimmed prompt when it may go on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Refused(RefusalReason),
    /// Bypass mode: skip the remaining filters and every external call.
    Bypass(String),
    Proceed(String),
}

/// Run the size, gibberish and forbidden-term filters in that order.
///
/// In bypass mode the forbidden-term filter never runs.
pub fn validate_prompt(prompt: &str, config: &Config) -> Validation {
    let clean = prompt.trim();

    let len = clean.chars().count();
    if !(MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS).contains(&len) {
        info!("Prompt refused: size {} out of bounds", len);
        return Validation::Refused(RefusalReason::PromptSizeInvalid);
    }

    if is_gibberish(clean) {
        info!("Prompt refused: gibberish");
        return Validation::Refused(RefusalReason::PromptGibberishNotAllowed);
    }

    if config.mock {
        return Validation::Bypass(clean.to_string());
    }

    if let Some(term) = find_forbidden_term(clean, &config.forbidden_terms) {
        info!("Prompt refused: forbidden term '{}'", term);
        return Validation::Refused(RefusalReason::PromptRefusedViolence);
    }

    Validation::Proceed(clean.to_string())
}

pub fn is_gibberish(text: &str) -> bool {
    let lower = text.to_lowercase();
    !lower.chars().any(|c| VOWELS.contains(c)) || has_repeated_run(text)
}

/// True when one character repeats five or more times in a row. Line breaks
/// never count towards a run.
fn has_repeated_run(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            previous = None;
            run = 0;
            continue;
        }
        if previous == Some(c) {
            run += 1;
            if run > MAX_REPEAT_RUN {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }
    false
}

fn find_forbidden_term<'a>(text: &str, terms: &'a [String]) -> Option<&'a str> {
    let lower = text.to_lowercase();
    terms
        .iter()
        .find(|term| lower.contains(&term.to_lowercase()))
        .map(String::as_str)
}
