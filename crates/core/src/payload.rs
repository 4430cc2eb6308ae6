//! Assembly of the model-ready request from history, guides and the prompt.
//!
//! The payload always fits the configured input budget. When it does not,
//! the oldest history turns go first, then guide bodies are shortened evenly,
//! then guides are dropped from the end. The current prompt is never touched.

use crate::chat::{ChatMessage, ModelRole};
use crate::guide::{truncate_chars, GuideText};
use serde::{Deserialize, Serialize};

/// Default cap on the characters sent to the model in one request.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 100_000;

pub const GROUNDING_DIRECTIVE: &str =
    "You MUST use the following external knowledge when answering:";

pub const QUESTION_HEADER: &str = "User question:";

const TURN_SEPARATOR: &str = "\n\n";

/// One role-tagged turn of the model conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTurn {
    pub role: ModelRole,
    pub text: String,
}

impl ModelTurn {
    fn new(role: ModelRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Provider-neutral request handed to the model dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    pub contents: Vec<ModelTurn>,
}

impl ModelRequest {
    /// Characters counted against the input budget.
    pub fn total_chars(&self) -> usize {
        self.system_instruction
            .as_deref()
            .map_or(0, |s| s.chars().count())
            + self
                .contents
                .iter()
                .map(|turn| turn.text.chars().count())
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_input_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Prompt is required.")]
    MissingPrompt,

    #[error("Prompt is too large: {required} characters exceed the limit of {budget}.")]
    PromptTooLarge { required: usize, budget: usize },
}

/// Everything the assembler needs for one request.
#[derive(Debug, Clone, Copy)]
pub struct PayloadInput<'a> {
    pub history: &'a [ChatMessage],
    pub prompt: Option<&'a str>,
    pub system_instruction: Option<&'a str>,
    pub guides: &'a [GuideText],
}

/// Split the request into prior turns and the current prompt.
///
/// An explicit prompt wins; a trailing history entry that merely echoes it is
/// dropped. Without one, the history must end with a user message, which then
/// becomes the prompt. Pending placeholders and blank messages are removed.
pub fn resolve_prompt(
    history: &[ChatMessage],
    prompt: Option<&str>,
) -> Result<(Vec<ModelTurn>, String), AssemblyError> {
    let mut turns: Vec<ModelTurn> = history
        .iter()
        .filter(|message| message.is_forwardable())
        .map(|message| ModelTurn::new(message.role.into(), message.content.clone()))
        .collect();

    let prompt = prompt.map(str::trim).filter(|p| !p.is_empty());

    let current = match prompt {
        Some(prompt) => {
            let echoes_prompt = turns
                .last()
                .is_some_and(|t| t.role == ModelRole::User && t.text.trim() == prompt);
            if echoes_prompt {
                turns.pop();
            }
            prompt.to_string()
        }
        None => {
            let ends_with_user = turns.last().is_some_and(|t| t.role == ModelRole::User);
            match turns.pop() {
                Some(last) if ends_with_user => last.text.trim().to_string(),
                _ => return Err(AssemblyError::MissingPrompt),
            }
        }
    };

    Ok((turns, current))
}

/// Build the model request for one generation call.
pub fn build_payload(
    input: PayloadInput<'_>,
    budget: ContextBudget,
) -> Result<ModelRequest, AssemblyError> {
    let system_instruction = input
        .system_instruction
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (history, prompt) = resolve_prompt(input.history, input.prompt)?;
    let history = normalize_turns(history);

    let assemble = |history: &[ModelTurn], guides: &[GuideText]| ModelRequest {
        system_instruction: system_instruction.clone(),
        contents: merge_adjacent(
            history
                .iter()
                .cloned()
                .chain(std::iter::once(ModelTurn::new(
                    ModelRole::User,
                    final_user_text(guides, &prompt),
                )))
                .collect(),
        ),
    };

    let limit = budget.max_input_chars;

    let fixed = assemble(&[], input.guides).total_chars();
    let start = history_start(&history, fixed, limit);
    let request = assemble(&history[start..], input.guides);

    if request.total_chars() <= limit {
        return Ok(request);
    }

    // History is gone; shrink guides, then drop them from the end.
    for keep in (1..=input.guides.len()).rev() {
        let kept = &input.guides[..keep];
        let full = assemble(&[], kept);
        let overflow = full.total_chars().saturating_sub(limit);
        if overflow == 0 {
            return Ok(full);
        }

        let lengths: Vec<usize> = kept.iter().map(|g| g.text.chars().count()).collect();
        let body_total: usize = lengths.iter().sum();
        if body_total <= overflow {
            continue;
        }

        let cap = fair_share_cap(&lengths, body_total - overflow);
        if cap == 0 {
            continue;
        }

        let shortened: Vec<GuideText> = kept
            .iter()
            .map(|guide| GuideText {
                text: truncate_chars(&guide.text, cap),
                ..guide.clone()
            })
            .collect();
        let request = assemble(&[], &shortened);
        if request.total_chars() <= limit {
            return Ok(request);
        }
    }

    let request = assemble(&[], &[]);
    let required = request.total_chars();
    if required <= limit {
        Ok(request)
    } else {
        Err(AssemblyError::PromptTooLarge {
            required,
            budget: limit,
        })
    }
}

/// Text of the final user turn: the grounding section (if any) plus the prompt.
fn final_user_text(guides: &[GuideText], prompt: &str) -> String {
    if guides.is_empty() {
        return prompt.to_string();
    }

    let mut text = String::from(GROUNDING_DIRECTIVE);
    for guide in guides {
        text.push_str(&format!("\n\n### Guide from {}\n{}", guide.url, guide.text));
    }
    text.push_str(&format!("\n\n{QUESTION_HEADER}\n{prompt}"));
    text
}

/// Merge same-role neighbours and drop leading model turns so the
/// conversation starts with the user and alternates.
fn normalize_turns(turns: Vec<ModelTurn>) -> Vec<ModelTurn> {
    let first_user = turns
        .iter()
        .position(|t| t.role == ModelRole::User)
        .unwrap_or(turns.len());
    merge_adjacent(turns.into_iter().skip(first_user).collect())
}

fn merge_adjacent(turns: Vec<ModelTurn>) -> Vec<ModelTurn> {
    let mut merged: Vec<ModelTurn> = Vec::with_capacity(turns.len());
    for turn in turns {
        match merged.last_mut() {
            Some(previous) if previous.role == turn.role => {
                previous.text.push_str(TURN_SEPARATOR);
                previous.text.push_str(&turn.text);
            }
            _ => merged.push(turn),
        }
    }
    merged
}

/// Index of the oldest turn kept so that `fixed` plus the kept history fits
/// in `limit`.
///
/// `history` is normalized, so it starts with a user turn and alternates.
/// The kept suffix always starts with a user turn; when nothing fits the
/// result is `history.len()`. A trailing user turn is merged into the final
/// user turn, which costs one separator.
fn history_start(history: &[ModelTurn], fixed: usize, limit: usize) -> usize {
    let merge_cost = match history.last() {
        Some(turn) if turn.role == ModelRole::User => TURN_SEPARATOR.chars().count(),
        _ => 0,
    };

    let mut start = history.len();
    let mut used = fixed + merge_cost;
    for (index, turn) in history.iter().enumerate().rev() {
        used += turn.text.chars().count();
        if used > limit {
            break;
        }
        if turn.role == ModelRole::User {
            start = index;
        }
    }
    start
}

/// Largest per-guide cap such that the capped bodies fit in `allowed` chars.
fn fair_share_cap(lengths: &[usize], allowed: usize) -> usize {
    let capped_total = |cap: usize| lengths.iter().map(|&len| len.min(cap)).sum::<usize>();

    let (mut low, mut high) = (0, lengths.iter().copied().max().unwrap_or(0));
    while low < high {
        let mid = (low + high + 1) / 2;
        if capped_total(mid) <= allowed {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}
