// LLM prompt constants for the feedback module.

/// Feedback prompt template.
/// Replace: {topic}, {student_response}, {word_count}, {word_limit}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"Provide specific and constructive feedback on the student's response about "{topic}".

Student Response:
{student_response}

Response Length: {word_count} words

Ensure that your feedback:
- Highlights strengths
- Identifies areas for improvement, specifically if the student is off-topic
- Provides actionable suggestions to help the student stay on-topic

Make sure that your feedback is concise and under {word_limit} words.

Feedback:
"#;
