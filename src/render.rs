//! Claim rendering: belief/stance-driven phrasing.
//!
//! A pure, deterministic transform from a claim's text and the observer's
//! belief/stance intensities to a single in-character sentence. Negative
//! belief swaps in the claim's negated phrasing; belief magnitude hedges the
//! statement; stance magnitude (and whether its sign agrees with belief)
//! picks the closing clause.

/// Belief magnitude assumed when no belief edge applies: full confidence.
pub const DEFAULT_BELIEF_INTENSITY: f32 = 1.0;

/// Stance magnitude assumed when no stance edge applies: neutral openness.
pub const DEFAULT_STANCE_INTENSITY: f32 = 0.5;

/// Render a claim for the observing character.
///
/// - `belief < 0` selects `negative` (falling back to `content` if absent).
/// - |belief| ≤ 0.2 prefixes "It is unclear whether ", ≤ 0.6 "It is possible
///   that "; 0.7 and above leaves the text unhedged. A prefix lowercases the
///   first letter of the text, since it now continues a clause.
/// - Trailing periods are stripped before the closing clause is applied.
/// - When belief and stance have the same sign: |stance| ≥ 0.7 closes with
///   ", which you are comfortable discussing.", ≤ 0.2 with ", which you
///   avoid discussing.", anything between with a bare period.
/// - When the signs differ: ≥ 0.7 closes with ", but you are open about
///   denying it.", ≥ 0.3 with ", but you deny this.", below that with
///   ", which you avoid discussing.".
pub fn render_claim(
    content: &str,
    negative: Option<&str>,
    belief: Option<f32>,
    stance: Option<f32>,
) -> String {
    let belief_is_negative = belief.is_some_and(|b| b < 0.0);
    let base = if belief_is_negative {
        negative.unwrap_or(content)
    } else {
        content
    };

    let b_intensity = belief.map(f32::abs).unwrap_or(DEFAULT_BELIEF_INTENSITY);
    let s_intensity = stance.map(f32::abs).unwrap_or(DEFAULT_STANCE_INTENSITY);

    let opposite_signs = match (belief, stance) {
        (Some(b), Some(s)) => (b >= 0.0) != (s >= 0.0),
        _ => false,
    };

    let hedged = if b_intensity <= 0.2 {
        format!("It is unclear whether {}", decapitalize(base))
    } else if b_intensity <= 0.6 {
        format!("It is possible that {}", decapitalize(base))
    } else {
        base.to_string()
    };

    let text = hedged.trim_end_matches('.');

    if opposite_signs {
        if s_intensity >= 0.7 {
            format!("{text}, but you are open about denying it.")
        } else if s_intensity >= 0.3 {
            format!("{text}, but you deny this.")
        } else {
            format!("{text}, which you avoid discussing.")
        }
    } else if s_intensity >= 0.7 {
        format!("{text}, which you are comfortable discussing.")
    } else if s_intensity <= 0.2 {
        format!("{text}, which you avoid discussing.")
    } else {
        format!("{text}.")
    }
}

/// Lowercase the first letter so the text reads as a clause continuation.
fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
