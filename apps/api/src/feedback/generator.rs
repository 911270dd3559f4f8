//! Feedback generation — fills the prompt, asks the model, renders two options.
//!
//! Flow: build prompt → two independent completions (joined) →
//!       truncate each to the word limit → Option 1 as a styled box,
//!       Option 2 as a narrative paragraph.
//!
//! Generation never touches the session; callers store the result.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::feedback::prompts::FEEDBACK_PROMPT_TEMPLATE;
use crate::feedback::render::{render_box, render_paragraph, OPTION_ONE_STYLE};
use crate::feedback::truncate::{truncate_words, word_count};
use crate::llm_client::{CompletionModel, LlmError};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Which of the two generated options a teacher picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackChoice {
    #[default]
    #[serde(rename = "option_1", alias = "Feedback Option 1")]
    Option1,
    #[serde(rename = "option_2", alias = "Feedback Option 2")]
    Option2,
}

impl FeedbackChoice {
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackChoice::Option1 => "Feedback Option 1",
            FeedbackChoice::Option2 => "Feedback Option 2",
        }
    }
}

/// Two raw completions for the same prompt, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackDrafts {
    pub first: String,
    pub second: String,
}

/// One presentable option: the truncated model text and its rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackOption {
    pub choice: FeedbackChoice,
    pub label: &'static str,
    pub text: String,
    pub rendered: String,
}

/// Both options shown side by side to the teacher.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackOptions {
    pub word_limit: usize,
    pub option_1: FeedbackOption,
    pub option_2: FeedbackOption,
}

impl FeedbackOptions {
    pub fn get(&self, choice: FeedbackChoice) -> &FeedbackOption {
        match choice {
            FeedbackChoice::Option1 => &self.option_1,
            FeedbackChoice::Option2 => &self.option_2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

pub fn build_feedback_prompt(
    topic: &str,
    response_text: &str,
    word_count: usize,
    word_limit: usize,
) -> String {
    FEEDBACK_PROMPT_TEMPLATE
        .replace("{topic}", topic)
        .replace("{student_response}", response_text)
        .replace("{word_count}", &word_count.to_string())
        .replace("{word_limit}", &word_limit.to_string())
}

/// One model completion for a response. Failures propagate unchanged.
pub async fn generate_feedback(
    model: &dyn CompletionModel,
    topic: &str,
    response_text: &str,
    word_count: usize,
    word_limit: usize,
) -> Result<String, LlmError> {
    let prompt = build_feedback_prompt(topic, response_text, word_count, word_limit);
    model.complete(&prompt).await
}

/// Two independent completions run concurrently. The first result is Option 1.
pub async fn generate_drafts(
    model: &dyn CompletionModel,
    topic: &str,
    response_text: &str,
    word_limit: usize,
) -> Result<FeedbackDrafts, LlmError> {
    let words = word_count(response_text);
    let (first, second) = tokio::try_join!(
        generate_feedback(model, topic, response_text, words, word_limit),
        generate_feedback(model, topic, response_text, words, word_limit),
    )?;
    Ok(FeedbackDrafts { first, second })
}

/// Truncates both drafts and renders them as box (Option 1) and paragraph (Option 2).
pub fn present(drafts: &FeedbackDrafts, word_limit: usize) -> FeedbackOptions {
    let first = truncate_words(&drafts.first, Some(word_limit));
    let second = truncate_words(&drafts.second, Some(word_limit));

    FeedbackOptions {
        word_limit,
        option_1: FeedbackOption {
            choice: FeedbackChoice::Option1,
            label: FeedbackChoice::Option1.label(),
            rendered: render_box(&first, &OPTION_ONE_STYLE),
            text: first,
        },
        option_2: FeedbackOption {
            choice: FeedbackChoice::Option2,
            label: FeedbackChoice::Option2.label(),
            rendered: render_paragraph(&second),
            text: second,
        },
    }
}

/// Full pipeline for one (topic, response) pair.
pub async fn generate_options(
    model: &dyn CompletionModel,
    topic: &str,
    response_text: &str,
    word_limit: usize,
) -> Result<FeedbackOptions, LlmError> {
    info!(
        "Generating feedback drafts with {} (topic={topic:?}, word_limit={word_limit})",
        model.model_name()
    );
    let drafts = generate_drafts(model, topic, response_text, word_limit).await?;
    Ok(present(&drafts, word_limit))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
