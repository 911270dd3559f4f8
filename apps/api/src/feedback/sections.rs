//! Best-effort extraction of labelled sections from free-form model feedback.
//!
//! The model is asked for strengths, gaps and suggestions but nothing forces it
//! to use these exact headings. A missing section is a `Missing` value carrying a
//! user-visible placeholder; extraction never fails.

use once_cell::sync::Lazy;
use regex::Regex;

/// The three headings the paragraph presenter looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Strengths,
    AreasForImprovement,
    ActionableSuggestions,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::Strengths,
        Section::AreasForImprovement,
        Section::ActionableSuggestions,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            Section::Strengths => "Strengths",
            Section::AreasForImprovement => "Areas for Improvement",
            Section::ActionableSuggestions => "Actionable Suggestions",
        }
    }

    fn label(self) -> &'static Regex {
        &SECTION_LABELS[self as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Found(String),
    Missing(String),
}

impl SectionBody {
    #[cfg(test)]
    fn text(&self) -> &str {
        match self {
            SectionBody::Found(body) | SectionBody::Missing(body) => body,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SectionBody::Found(body) | SectionBody::Missing(body) => body,
        }
    }

    #[cfg(test)]
    fn is_found(&self) -> bool {
        matches!(self, SectionBody::Found(_))
    }
}

/// A newline followed by a non-blank character opens the next block.
static NEXT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\S").expect("static regex"));

/// Any known heading, even mid-line. Truncation joins lines with spaces, so the
/// headings are the only boundary left in truncated text.
static KNOWN_HEADING: Lazy<Regex> = Lazy::new(|| {
    let alternatives = Section::ALL
        .iter()
        .map(|s| regex::escape(s.heading()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(?:{alternatives}):")).expect("static regex")
});

/// `<heading>:` matchers for the three known sections, in `Section::ALL` order.
static SECTION_LABELS: Lazy<[Regex; 3]> =
    Lazy::new(|| Section::ALL.map(|s| label_pattern(s.heading()).expect("static regex")));

fn label_pattern(section_name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i){}:", regex::escape(section_name)))
}

/// Placeholder returned when a section cannot be found.
pub fn missing_placeholder(section_name: &str) -> String {
    format!(
        "Feedback for {section_name} is not clearly available. \
        Here's a general suggestion: Keep focusing on improving this part."
    )
}

/// Finds `<section_name>: <body>` (case-insensitive) and returns the trimmed body.
///
/// The body runs to the next line that starts a new block, the next known
/// heading, or the end of the text, whichever comes first. A heading with an
/// empty body counts as missing.
pub fn extract_section(feedback: &str, section_name: &str) -> SectionBody {
    let known = Section::ALL
        .into_iter()
        .find(|s| s.heading().eq_ignore_ascii_case(section_name));
    match known {
        Some(section) => body_after(feedback, section.label(), section_name),
        None => match label_pattern(section_name) {
            Ok(label) => body_after(feedback, &label, section_name),
            Err(_) => SectionBody::Missing(missing_placeholder(section_name)),
        },
    }
}

pub fn extract(feedback: &str, section: Section) -> SectionBody {
    extract_section(feedback, section.heading())
}

fn body_after(feedback: &str, label: &Regex, section_name: &str) -> SectionBody {
    let missing = || SectionBody::Missing(missing_placeholder(section_name));

    let Some(found) = label.find(feedback) else {
        return missing();
    };

    let rest = &feedback[found.end()..];
    let rest = rest.trim_start();

    let end = [
        NEXT_LINE.find(rest).map(|m| m.start()),
        KNOWN_HEADING.find(rest).map(|m| m.start()),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(rest.len());

    let body = rest[..end].trim();
    if body.is_empty() {
        missing()
    } else {
        SectionBody::Found(body.to_string())
    }
}
