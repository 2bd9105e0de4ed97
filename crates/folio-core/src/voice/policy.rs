//! Ranked voice selection
//!
//! Voices are matched against an ordered rule table. The first rule with any
//! matching voice wins; within a rule the engine's own ordering is kept.

use super::Voice;

/// A named predicate over available voices
#[derive(Clone, Copy)]
pub struct VoiceRule {
    pub label: &'static str,
    pub matches: fn(&Voice) -> bool,
}

impl std::fmt::Debug for VoiceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRule").field("label", &self.label).finish()
    }
}

/// Voices known to render English well on common desktop engines
const WELL_KNOWN_US_VOICES: [&str; 6] = ["Samantha", "Ava", "Allison", "Alex", "Susan", "Zira"];

fn is_us_english(voice: &Voice) -> bool {
    voice.normalized_lang() == "en-us"
}

fn natural_us(voice: &Voice) -> bool {
    is_us_english(voice) && voice.name.contains("Natural")
}

fn google_us(voice: &Voice) -> bool {
    is_us_english(voice) && voice.name.contains("Google")
}

fn enhanced_us(voice: &Voice) -> bool {
    is_us_english(voice) && (voice.name.contains("Premium") || voice.name.contains("Enhanced"))
}

fn well_known_us(voice: &Voice) -> bool {
    is_us_english(voice)
        && WELL_KNOWN_US_VOICES
            .iter()
            .any(|name| voice.name.split_whitespace().any(|word| word == *name))
}

fn any_english(voice: &Voice) -> bool {
    let lang = voice.normalized_lang();
    lang == "en" || lang.starts_with("en-")
}

pub const DEFAULT_RULES: &[VoiceRule] = &[
    VoiceRule { label: "natural en-US", matches: natural_us },
    VoiceRule { label: "google en-US", matches: google_us },
    VoiceRule { label: "enhanced en-US", matches: enhanced_us },
    VoiceRule { label: "well-known en-US", matches: well_known_us },
    VoiceRule { label: "any en-US", matches: is_us_english },
    VoiceRule { label: "any English", matches: any_english },
];

#[derive(Debug, Clone)]
pub struct VoicePolicy {
    /// Exact name (case-insensitive) tried before the rule table
    preferred: Option<String>,
    rules: &'static [VoiceRule],
}

impl Default for VoicePolicy {
    fn default() -> Self {
        Self {
            preferred: None,
            rules: DEFAULT_RULES,
        }
    }
}

impl VoicePolicy {
    pub fn new(preferred: Option<String>) -> Self {
        Self {
            preferred,
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: &'static [VoiceRule]) -> Self {
        self.rules = rules;
        self
    }

    /// Pick a voice, or `None` to let the engine use its default
    pub fn choose<'a>(&self, voices: &'a [Voice]) -> Option<&'a Voice> {
        if let Some(preferred) = &self.preferred {
            if let Some(voice) = voices.iter().find(|v| v.name.eq_ignore_ascii_case(preferred)) {
                return Some(voice);
            }
        }

        self.rules
            .iter()
            .find_map(|rule| voices.iter().find(|voice| (rule.matches)(voice)))
    }
}
