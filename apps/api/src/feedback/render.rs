//! Two presentations of the same truncated feedback text. Both are pure and infallible.

use askama::{Html, MarkupDisplay, Template};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::feedback::sections::{extract, Section};

/// Title, background and text colour of a feedback box.
#[derive(Debug, Clone, Copy)]
pub struct BoxStyle<'a> {
    pub title: &'a str,
    pub background_color: &'a str,
    pub text_color: &'a str,
}

pub const OPTION_ONE_STYLE: BoxStyle<'static> = BoxStyle {
    title: "Feedback Option 1",
    background_color: "#F1F8FF",
    text_color: "#0E2A47",
};

static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)</?[a-z][^>]*>").expect("static regex"));

/// Removes markup tags the model may have echoed back.
pub fn strip_markup(text: &str) -> String {
    MARKUP_TAG.replace_all(text, "").trim().to_string()
}

/// Feedback box markup. Title, colours and body are all auto-escaped.
#[derive(Template)]
#[template(
    source = r#"<div class="feedback-box" style="border-radius: 10px; background-color: {{ style.background_color }}; color: {{ style.text_color }}; padding: 15px; margin-bottom: 20px; box-shadow: 0px 4px 6px rgba(0, 0, 0, 0.1); font-family: Arial, sans-serif;">
    <h4 style="margin-top: 0; text-align: center;">{{ style.title }}</h4>
    <p style="text-align: justify; margin: 10px 0;">{{ body }}</p>
</div>"#,
    ext = "html"
)]
struct FeedbackBoxTemplate<'a> {
    style: &'a BoxStyle<'a>,
    body: &'a str,
}

/// Wraps sanitized feedback in a styled, titled container.
pub fn render_box(feedback: &str, style: &BoxStyle) -> String {
    let body = strip_markup(feedback);
    FeedbackBoxTemplate { style, body: &body }
        .render()
        .unwrap_or_else(|err| {
            warn!("Feedback box failed to render ({err}); falling back to escaped text");
            MarkupDisplay::new_unsafe(body.as_str(), Html).to_string()
        })
}

/// Splices the three extracted sections into one narrative paragraph.
/// Missing sections contribute their placeholder text.
pub fn render_paragraph(feedback: &str) -> String {
    let [strengths, areas, suggestions] = Section::ALL.map(|s| extract(feedback, s).into_text());
    format!(
        "Your response shows that {strengths}. However, {areas}. To improve, {suggestions}."
    )
}
