//! # Prompt formatter
//!
//! Rewrites a raw question into an instruction biased toward a simple,
//! child-appropriate explanation. The rules are keyword heuristics checked in
//! order against the lowercased input:
//!
//! 1. starts with `why` — explain kindly to a 6-year-old, reusing the text
//!    after the leading "why ".
//! 2. starts with `how` — explain in a fun way for a kid.
//! 3. contains `story` or `tell me` — tell a short, fun story.
//! 4. anything else — answer simply and kindly as if to a 6-year-old.
//!
//! Pure function, no side effects; always returns a non-empty string for
//! non-empty input.

/// Build a kid-friendly instruction from a raw question.
///
/// Matching is case-insensitive. The "why" rule keeps the remainder of the
/// question after the fourth character (i.e., after `"why "`), mirroring the
/// other rules, which carry the full lowercased text.
///
/// # Examples
/// ```
/// use wonder_why::prompt::format_question;
///
/// let p = format_question("Why is the sky blue");
/// assert_eq!(p, "Explain this kindly to a 6-year-old: Why is the sky blue");
/// ```
pub fn format_question(question: &str) -> String {
    let lowered = question.to_lowercase();

    if lowered.starts_with("why") {
        let remainder: String = lowered.chars().skip(4).collect();
        format!("Explain this kindly to a 6-year-old: Why {remainder}")
    } else if lowered.starts_with("how") {
        format!("Explain how this works in a fun way for a kid: {lowered}")
    } else if lowered.contains("story") || lowered.contains("tell me") {
        format!("Tell a short, fun story for a child: {lowered}")
    } else {
        format!("Answer this simply and kindly like to a 6-year-old: {lowered}")
    }
}
