//! Word-list moderation for student submissions.
//!
//! The list is installed once per process (`install`) and never reloaded.
//! `check` falls back to the built-in list if nothing was installed.
//!
//! Entries match as whole words, case-insensitively, and each letter also
//! matches its usual look-alikes (`sh1t`, `$hit`, `f*ck`). Inflections and
//! compounds are listed in `words.txt` rather than matched by prefix, so
//! "assassination" and "class" stay clean.

pub mod handlers;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Reason attached to every flagged verdict.
pub const FLAGGED_REASON: &str = "Contains inappropriate content.";

const BUILTIN_WORDS: &str = include_str!("words.txt");

/// Characters a writer commonly swaps in for a letter to dodge a word filter.
const LOOKALIKES: &[(char, &str)] = &[
    ('a', "@*"),
    ('e', "*3"),
    ('i', "*l1!"),
    ('l', "1"),
    ('o', "*0@"),
    ('s', "$5"),
    ('t', "7"),
    ('u', "*v"),
    ('v', "*u"),
];

/// Anything that is not part of a word. Look-alike symbols sit inside the
/// match, so they need no special handling here.
const WORD_EDGE_START: &str = r"(?:^|[^\p{L}\p{N}_])";
const WORD_EDGE_END: &str = r"(?:$|[^\p{L}\p{N}_])";

static MODERATOR: OnceCell<Moderator> = OnceCell::new();

/// Flagged / not-flagged judgment for one submission attempt. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ModerationVerdict {
    fn clean() -> Self {
        Self {
            flagged: false,
            reason: None,
        }
    }

    fn flagged() -> Self {
        Self {
            flagged: true,
            reason: Some(FLAGGED_REASON.to_string()),
        }
    }
}

/// Case-insensitive, whole-word matcher over a fixed list of disallowed words.
#[derive(Debug)]
pub struct Moderator {
    pattern: Option<Regex>,
    word_count: usize,
}

impl Moderator {
    pub fn new<I, S>(words: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut alternatives: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        alternatives.sort();
        alternatives.dedup();
        let word_count = alternatives.len();

        if alternatives.is_empty() {
            return Ok(Self {
                pattern: None,
                word_count,
            });
        }

        // Longest first so multi-word entries win over their prefixes.
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()));
        let body = alternatives
            .iter()
            .map(|w| {
                w.split_whitespace()
                    .map(token_pattern)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!("(?i){WORD_EDGE_START}(?:{body}){WORD_EDGE_END}");
        Ok(Self {
            pattern: Some(Regex::new(&pattern)?),
            word_count,
        })
    }

    /// The compiled-in list plus any extra entries.
    pub fn with_builtin<I, S>(extra: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = builtin_words()
            .map(str::to_string)
            .chain(extra.into_iter().map(|s| s.as_ref().to_string()))
            .collect();
        Self::new(words)
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn check(&self, text: &str) -> ModerationVerdict {
        match &self.pattern {
            Some(re) if re.is_match(text) => ModerationVerdict::flagged(),
            _ => ModerationVerdict::clean(),
        }
    }
}

impl Default for Moderator {
    fn default() -> Self {
        Self::with_builtin(std::iter::empty::<&str>())
            .unwrap_or(Self {
                pattern: None,
                word_count: 0,
            })
    }
}

/// One listed token with every letter widened to its look-alikes.
fn token_pattern(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            let literal = regex::escape(c.encode_utf8(&mut [0; 4]));
            match LOOKALIKES.iter().find(|(letter, _)| *letter == c) {
                Some((_, swaps)) => {
                    let swaps: String = swaps
                        .chars()
                        .map(|s| regex::escape(s.encode_utf8(&mut [0; 4])))
                        .collect();
                    format!("[{literal}{swaps}]")
                }
                None => literal,
            }
        })
        .collect()
}

fn builtin_words() -> impl Iterator<Item = &'static str> {
    BUILTIN_WORDS
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}

/// Installs the process-wide moderator. Returns false if one was already installed.
pub fn install(moderator: Moderator) -> bool {
    let words = moderator.word_count();
    let installed = MODERATOR.set(moderator).is_ok();
    if installed {
        info!("Moderation word list loaded ({words} entries)");
    }
    installed
}

/// Checks `text` against the process-wide word list.
pub fn check(text: &str) -> ModerationVerdict {
    MODERATOR.get_or_init(Moderator::default).check(text)
}
