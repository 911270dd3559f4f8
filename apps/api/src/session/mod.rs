//! Per-session classroom state: topics, responses, pending drafts, selections
//! and finalized feedback. Nothing here outlives the process.

pub mod handlers;
pub mod store;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::feedback::generator::{FeedbackChoice, FeedbackOptions};
use crate::feedback::truncate::word_count;
use crate::moderation::ModerationVerdict;

pub use store::SessionStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Topic cannot be empty")]
    EmptyTopic,

    #[error("Topic '{0}' already exists")]
    DuplicateTopic(String),

    #[error("Topic '{0}' does not exist")]
    UnknownTopic(String),

    #[error("Please enter a response before submitting")]
    EmptyResponse,

    #[error("Your response has been flagged for inappropriate content: {reason}")]
    Flagged { reason: String },

    #[error("Response {index} not found for topic '{topic}'")]
    ResponseNotFound { topic: String, index: usize },

    #[error("No feedback drafts generated yet for response {index} of '{topic}'")]
    NoDrafts { topic: String, index: usize },

    #[error("No finalized feedback yet for response {index} of '{topic}'")]
    NotFinalized { topic: String, index: usize },
}

/// Addresses one response: its topic plus its position in that topic's list.
/// The topic is stored trimmed, the same way `add_topic` stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedbackKey {
    pub topic: String,
    pub index: usize,
}

impl FeedbackKey {
    pub fn new(topic: impl AsRef<str>, index: usize) -> Self {
        Self {
            topic: topic.as_ref().trim().to_string(),
            index,
        }
    }

    fn not_found(&self) -> SessionError {
        SessionError::ResponseNotFound {
            topic: self.topic.clone(),
            index: self.index,
        }
    }
}

/// Teacher-visible summary of one stored response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary {
    pub index: usize,
    pub text: String,
    pub word_count: usize,
    pub char_count: usize,
    pub has_finalized_feedback: bool,
}

/// Feedback text a student sees once a teacher has finalized it.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedFeedback {
    pub choice: FeedbackChoice,
    pub text: String,
    pub finalized_at: DateTime<Utc>,
}

/// One user's classroom session.
#[derive(Debug, Clone)]
pub struct Session {
    created_at: DateTime<Utc>,
    topics: Vec<String>,
    responses: HashMap<String, Vec<String>>,
    drafts: HashMap<FeedbackKey, FeedbackOptions>,
    selections: HashMap<FeedbackKey, FeedbackChoice>,
    finalized: HashMap<FeedbackKey, FinalizedFeedback>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            topics: Vec::new(),
            responses: HashMap::new(),
            drafts: HashMap::new(),
            selections: HashMap::new(),
            finalized: HashMap::new(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ── Topics ───────────────────────────────────────────────────────────────

    /// Appends a topic. Topics are unique by value and never removed.
    pub fn add_topic(&mut self, topic: &str) -> Result<(), SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        if self.has_topic(topic) {
            return Err(SessionError::DuplicateTopic(topic.to_string()));
        }
        self.topics.push(topic.to_string());
        Ok(())
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Lookups trim the same way `add_topic` does.
    pub fn has_topic(&self, topic: &str) -> bool {
        let topic = topic.trim();
        self.topics.iter().any(|t| t == topic)
    }

    // ── Responses ────────────────────────────────────────────────────────────

    /// Validates, moderates, then appends a response. Returns its index.
    ///
    /// `moderate` runs only after the emptiness check and before any mutation;
    /// a rejected submission leaves the session untouched.
    pub fn submit_response<F>(
        &mut self,
        topic: &str,
        text: &str,
        moderate: F,
    ) -> Result<usize, SessionError>
    where
        F: FnOnce(&str) -> ModerationVerdict,
    {
        let topic = topic.trim();
        if text.trim().is_empty() {
            return Err(SessionError::EmptyResponse);
        }
        if !self.has_topic(topic) {
            return Err(SessionError::UnknownTopic(topic.to_string()));
        }

        let verdict = moderate(text);
        if verdict.flagged {
            return Err(SessionError::Flagged {
                reason: verdict.reason.unwrap_or_default(),
            });
        }

        let list = self.responses.entry(topic.to_string()).or_default();
        list.push(text.to_string());
        Ok(list.len() - 1)
    }

    pub fn responses(&self, topic: &str) -> Result<&[String], SessionError> {
        let topic = topic.trim();
        if !self.has_topic(topic) {
            return Err(SessionError::UnknownTopic(topic.to_string()));
        }
        Ok(self.responses.get(topic).map(Vec::as_slice).unwrap_or(&[]))
    }

    pub fn response(&self, key: &FeedbackKey) -> Result<&str, SessionError> {
        self.responses(&key.topic)?
            .get(key.index)
            .map(String::as_str)
            .ok_or_else(|| key.not_found())
    }

    pub fn response_summaries(&self, topic: &str) -> Result<Vec<ResponseSummary>, SessionError> {
        Ok(self
            .responses(topic)?
            .iter()
            .enumerate()
            .map(|(index, text)| ResponseSummary {
                index,
                word_count: word_count(text),
                char_count: text.chars().count(),
                has_finalized_feedback: self
                    .finalized
                    .contains_key(&FeedbackKey::new(topic, index)),
                text: text.clone(),
            })
            .collect())
    }

    // ── Drafts and selection ─────────────────────────────────────────────────

    /// Replaces any pending options for `key`. Finalized feedback is left alone.
    pub fn store_drafts(
        &mut self,
        key: FeedbackKey,
        options: FeedbackOptions,
    ) -> Result<(), SessionError> {
        self.response(&key)?;
        self.drafts.insert(key, options);
        Ok(())
    }

    pub fn drafts(&self, key: &FeedbackKey) -> Option<&FeedbackOptions> {
        self.drafts.get(key)
    }

    pub fn select(&mut self, key: FeedbackKey, choice: FeedbackChoice) -> Result<(), SessionError> {
        self.response(&key)?;
        self.selections.insert(key, choice);
        Ok(())
    }

    /// The teacher's current pick, Option 1 until they choose otherwise.
    pub fn selection(&self, key: &FeedbackKey) -> FeedbackChoice {
        self.selections.get(key).copied().unwrap_or_default()
    }

    // ── Finalization ─────────────────────────────────────────────────────────

    /// Publishes the rendered text of the chosen option, overwriting any earlier one.
    /// With no explicit `choice` the recorded selection is used.
    pub fn finalize(
        &mut self,
        key: FeedbackKey,
        choice: Option<FeedbackChoice>,
    ) -> Result<FinalizedFeedback, SessionError> {
        self.response(&key)?;
        let choice = choice.unwrap_or_else(|| self.selection(&key));
        let options = self.drafts(&key).ok_or_else(|| SessionError::NoDrafts {
            topic: key.topic.clone(),
            index: key.index,
        })?;

        let finalized = FinalizedFeedback {
            choice,
            text: options.get(choice).rendered.clone(),
            finalized_at: Utc::now(),
        };
        self.selections.insert(key.clone(), choice);
        self.finalized.insert(key, finalized.clone());
        Ok(finalized)
    }

    pub fn finalized(&self, key: &FeedbackKey) -> Option<&FinalizedFeedback> {
        self.finalized.get(key)
    }
}
