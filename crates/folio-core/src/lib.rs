pub mod ai;
pub mod config;
pub mod content;
pub mod error;
pub mod session;
pub mod state;
pub mod voice;

// Re-export main types for convenience
pub use ai::{ChatBackend, ChunkStream, RemoteChatClient, Utf8Decoder};
pub use config::{Config, Endpoints, VoiceSettings};
pub use error::{ChatError, RecognitionError, SpeechError};
pub use session::{ChatSession, Notice, SessionEvent, SessionSnapshot};
pub use state::{ChatMessage, ChatRole, Conversation, MessageId, SubmissionSource};
pub use voice::{
    CommandSynthesizer, RecognitionOptions, SpeechRecognizer, SpeechSynthesizer, Unsupported,
    Utterance, Voice, VoiceIo, VoicePolicy,
};
