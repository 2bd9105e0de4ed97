//! Error types for the chat core

use thiserror::Error;

/// Failures while talking to the chat backend or loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The backend answered with a non-success HTTP status
    #[error("chat request failed with status: {0}")]
    Status(u16),

    /// Connection, request or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The streamed body was not valid UTF-8
    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) if !status.is_success() => ChatError::Status(status.as_u16()),
            _ => ChatError::Transport(e.to_string()),
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Config(e.to_string())
    }
}

/// Text-to-speech failure reported by a synthesizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech synthesis is not available")]
    Unavailable,

    /// The utterance was cancelled before it finished
    #[error("speech was interrupted")]
    Interrupted,

    #[error("speech synthesis failed: {0}")]
    Failed(String),
}

/// Speech-to-text failure reported by a recognizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("no speech was detected")]
    NoSpeech,

    #[error("recognition was aborted")]
    Aborted,

    #[error("microphone access was denied")]
    NotAllowed,

    #[error("speech recognition failed: {0}")]
    Failed(String),
}

impl RecognitionError {
    /// Benign failures clear listening state without telling the user
    pub fn is_benign(&self) -> bool {
        matches!(self, RecognitionError::NoSpeech | RecognitionError::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_silence_and_abort_are_benign() {
        assert!(RecognitionError::NoSpeech.is_benign());
        assert!(RecognitionError::Aborted.is_benign());
        assert!(!RecognitionError::NotAllowed.is_benign());
        assert!(!RecognitionError::Failed("network".into()).is_benign());
    }
}
