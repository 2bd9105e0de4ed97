//! Optional speech capabilities
//!
//! Speech synthesis and recognition sit behind small traits so the chat
//! session can run without any speech engine. Availability is checked at
//! call time, never cached.

pub mod command;
pub mod policy;
pub mod unsupported;

pub use command::CommandSynthesizer;
pub use policy::{VoicePolicy, VoiceRule, DEFAULT_RULES};
pub use unsupported::Unsupported;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::VoiceSettings;
use crate::error::{RecognitionError, SpeechError};

/// A voice offered by the platform speech engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name, used for ranking
    pub name: String,
    /// BCP 47 style tag such as `en-US`; `en_US` is accepted too
    pub lang: String,
    /// What the engine expects when selecting this voice
    #[serde(default)]
    pub id: String,
}

impl Voice {
    /// A voice the engine selects by its display name
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            lang: lang.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Language tag, lowercased with `_` normalized to `-`
    pub fn normalized_lang(&self) -> String {
        self.lang.replace('_', "-").to_ascii_lowercase()
    }
}

/// One request to speak some text
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// `None` means the platform default voice
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: Option<Voice>, settings: &VoiceSettings) -> Self {
        Self {
            text: text.into(),
            voice,
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
        }
    }
}

/// Recognition parameters; the chat only ever asks for one final utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionOptions {
    pub fn single_utterance(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Voices currently known to the engine. May grow after startup.
    fn voices(&self) -> BoxFuture<'static, Vec<Voice>>;

    /// Start speaking. The future resolves when the utterance ends, fails,
    /// or is cancelled.
    fn speak(&self, utterance: Utterance) -> BoxFuture<'static, Result<(), SpeechError>>;

    /// Stop whatever is being spoken
    fn cancel(&self);
}

pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Listen for one utterance and resolve with its transcript
    fn listen(&self, options: RecognitionOptions) -> BoxFuture<'static, Result<String, RecognitionError>>;

    /// Stop an active listen; its future should resolve with `Aborted`
    fn stop(&self);
}

/// The pair of speech engines handed to a chat session
#[derive(Clone)]
pub struct VoiceIo {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
}

impl VoiceIo {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        Self {
            synthesizer,
            recognizer,
        }
    }

    /// Neither speech capability is present
    pub fn unsupported() -> Self {
        let engine = Arc::new(Unsupported);
        Self::new(engine.clone(), engine)
    }
}
