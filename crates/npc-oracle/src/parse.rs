//! LLM response parsing and validation into a [`CognitiveFrame`]
//! (spec §4.6 step 2: "Validate: `intent` in enum, `|trustDelta| <= 0.2`,
//! `urgency in [0,1]`, `dialogue` non-null").
//!
//! Unlike a malformed `intent` (which cannot be guessed and is treated as
//! a parse failure), the numeric fields are clamped into range rather than
//! rejected outright -- an LLM that overshoots `trustDelta` by a hair
//! should not cost the agent its whole turn.

use npc_types::{CognitiveFrame, ExtractedTopic, Intent, MemoryCategory};

use crate::error::OracleError;

#[derive(Debug, serde::Deserialize)]
struct RawTopic {
    category: String,
    content: String,
}

#[derive(Debug, serde::Deserialize)]
struct RawFrame {
    #[serde(default)]
    reflection: String,
    #[serde(default)]
    dialogue: String,
    intent: String,
    #[serde(default)]
    mood_shift_arousal: f64,
    #[serde(default)]
    mood_shift_valence: f64,
    #[serde(default)]
    urgency: f64,
    #[serde(default)]
    trust_delta: f64,
    #[serde(default)]
    emotional_weight: f64,
    #[serde(default)]
    extracted_topics: Vec<RawTopic>,
}

/// Parse a raw LLM response string into a validated [`CognitiveFrame`].
///
/// Tries, in order: direct JSON parse, extraction from a markdown code
/// block, and trailing-comma repair on both. Returns
/// [`OracleError::Parse`] if every strategy fails or `intent` does not
/// match a known [`Intent`] variant -- the caller is expected to fall back
/// to [`CognitiveFrame::fallback`] in that case.
pub fn parse_cognitive_frame(raw: &str) -> Result<CognitiveFrame, OracleError> {
    let trimmed = raw.trim();

    if let Ok(parsed) = serde_json::from_str::<RawFrame>(trimmed) {
        return convert(parsed);
    }

    if let Some(block) = extract_json_from_codeblock(trimmed)
        && let Ok(parsed) = serde_json::from_str::<RawFrame>(block)
    {
        return convert(parsed);
    }

    let cleaned = strip_trailing_commas(trimmed);
    if let Ok(parsed) = serde_json::from_str::<RawFrame>(&cleaned) {
        return convert(parsed);
    }

    if let Some(block) = extract_json_from_codeblock(trimmed) {
        let cleaned_inner = strip_trailing_commas(block);
        if let Ok(parsed) = serde_json::from_str::<RawFrame>(&cleaned_inner) {
            return convert(parsed);
        }
    }

    Err(OracleError::Parse(format!("all parse strategies failed for: {trimmed}")))
}

fn convert(raw: RawFrame) -> Result<CognitiveFrame, OracleError> {
    let intent = parse_intent(&raw.intent)?;

    let dialogue = if raw.dialogue.trim().is_empty() { "...".to_owned() } else { raw.dialogue };

    let extracted_topics = raw
        .extracted_topics
        .into_iter()
        .filter_map(|t| parse_category(&t.category).map(|category| ExtractedTopic { category, content: t.content }))
        .collect();

    Ok(CognitiveFrame {
        reflection: raw.reflection,
        dialogue,
        intent,
        mood_shift_arousal: raw.mood_shift_arousal.clamp(0.0, 1.0),
        mood_shift_valence: raw.mood_shift_valence.clamp(0.0, 1.0),
        urgency: raw.urgency.clamp(0.0, 1.0),
        trust_delta: raw.trust_delta.clamp(-0.2, 0.2),
        emotional_weight: raw.emotional_weight.clamp(0.0, 1.0),
        extracted_topics,
    })
}

fn parse_intent(s: &str) -> Result<Intent, OracleError> {
    let quoted = format!("\"{s}\"");
    if let Ok(intent) = serde_json::from_str::<Intent>(&quoted) {
        return Ok(intent);
    }
    match s.to_lowercase().as_str() {
        "investigate" => Ok(Intent::Investigate),
        "guard" => Ok(Intent::Guard),
        "trade" => Ok(Intent::Trade),
        "assist" => Ok(Intent::Assist),
        "flee" => Ok(Intent::Flee),
        "attack" => Ok(Intent::Attack),
        "socialize" => Ok(Intent::Socialize),
        "ignore" => Ok(Intent::Ignore),
        other => Err(OracleError::Parse(format!("unknown intent: {other}"))),
    }
}

fn parse_category(s: &str) -> Option<MemoryCategory> {
    let quoted = format!("\"{s}\"");
    serde_json::from_str::<MemoryCategory>(&quoted).ok()
}

fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let start = text
        .find("```json")
        .map(|i| {
            let after_tag = i.checked_add(7).unwrap_or(i);
            text.get(after_tag..)
                .and_then(|s| s.find('\n'))
                .and_then(|nl| after_tag.checked_add(nl))
                .and_then(|pos| pos.checked_add(1))
                .unwrap_or(after_tag)
        })
        .or_else(|| {
            text.find("```").map(|i| {
                let after_tag = i.checked_add(3).unwrap_or(i);
                text.get(after_tag..)
                    .and_then(|s| s.find('\n'))
                    .and_then(|nl| after_tag.checked_add(nl))
                    .and_then(|pos| pos.checked_add(1))
                    .unwrap_or(after_tag)
            })
        })?;

    let remaining = text.get(start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut i = 0;
    while i < len {
        let c = chars.get(i).copied().unwrap_or(' ');
        if c == ',' {
            let mut j = i.checked_add(1).unwrap_or(i);
            while j < len && chars.get(j).copied().unwrap_or(' ').is_whitespace() {
                j = j.checked_add(1).unwrap_or(j);
            }
            let next = chars.get(j).copied().unwrap_or(' ');
            if next == '}' || next == ']' {
                i = i.checked_add(1).unwrap_or(i);
                continue;
            }
        }
        result.push(c);
        i = i.checked_add(1).unwrap_or(len);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_frame() {
        let raw = r#"{"dialogue": "Welcome, traveler.", "intent": "socialize", "urgency": 0.2, "trust_delta": 0.1}"#;
        let frame = parse_cognitive_frame(raw).expect("valid frame");
        assert_eq!(frame.intent, Intent::Socialize);
        assert_eq!(frame.dialogue, "Welcome, traveler.");
    }

    #[test]
    fn empty_dialogue_becomes_ellipsis() {
        let raw = r#"{"dialogue": "", "intent": "ignore"}"#;
        let frame = parse_cognitive_frame(raw).expect("valid frame");
        assert_eq!(frame.dialogue, "...");
    }

    #[test]
    fn out_of_range_trust_delta_is_clamped() {
        let raw = r#"{"dialogue": "hm", "intent": "guard", "trust_delta": 5.0}"#;
        let frame = parse_cognitive_frame(raw).expect("valid frame");
        assert!((frame.trust_delta - 0.2).abs() < 1e-9);
    }

    #[test]
    fn unknown_intent_is_a_parse_error() {
        let raw = r#"{"dialogue": "hm", "intent": "teleport"}"#;
        assert!(parse_cognitive_frame(raw).is_err());
    }

    #[test]
    fn parse_from_codeblock() {
        let raw = "Here's my response:\n```json\n{\"dialogue\": \"Hi\", \"intent\": \"assist\"}\n```\n";
        let frame = parse_cognitive_frame(raw).expect("valid frame");
        assert_eq!(frame.intent, Intent::Assist);
    }

    #[test]
    fn parse_trailing_comma() {
        let raw = r#"{"dialogue": "Hi", "intent": "assist", "urgency": 0.4,}"#;
        let frame = parse_cognitive_frame(raw).expect("valid frame");
        assert!((frame.urgency - 0.4).abs() < 1e-9);
    }

    #[test]
    fn garbage_response_is_a_parse_error() {
        assert!(parse_cognitive_frame("I think I'll just wander off.").is_err());
    }

    #[test]
    fn unknown_topic_categories_are_dropped_not_fatal() {
        let raw = r#"{"dialogue": "Hi", "intent": "assist", "extracted_topics": [{"category": "nonsense", "content": "x"}, {"category": "event", "content": "y"}]}"#;
        let frame = parse_cognitive_frame(raw).expect("valid frame");
        assert_eq!(frame.extracted_topics.len(), 1);
        assert_eq!(frame.extracted_topics[0].content, "y");
    }
}
