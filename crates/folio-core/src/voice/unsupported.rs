use futures_util::future::{self, BoxFuture, FutureExt};

use super::{RecognitionOptions, SpeechRecognizer, SpeechSynthesizer, Utterance, Voice};
use crate::error::{RecognitionError, SpeechError};

/// Stand-in for platforms without speech engines
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl SpeechSynthesizer for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    fn voices(&self) -> BoxFuture<'static, Vec<Voice>> {
        future::ready(Vec::new()).boxed()
    }

    fn speak(&self, _utterance: Utterance) -> BoxFuture<'static, Result<(), SpeechError>> {
        future::ready(Err(SpeechError::Unavailable)).boxed()
    }

    fn cancel(&self) {}
}

impl SpeechRecognizer for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    fn listen(&self, _options: RecognitionOptions) -> BoxFuture<'static, Result<String, RecognitionError>> {
        future::ready(Err(RecognitionError::Failed("speech recognition is not supported".into()))).boxed()
    }

    fn stop(&self) {}
}
