//! Chat session: submission pipeline, stream ingestion and voice I/O
//!
//! A session owns one conversation. All asynchronous work runs on spawned
//! tasks that hold a clone of the session's shared state plus its liveness
//! token. Every continuation re-checks the token while holding the state
//! lock, and `shutdown` cancels the token under that same lock, so nothing
//! mutates a session after it has been torn down.

use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::{ChatBackend, Utf8Decoder};
use crate::config::VoiceSettings;
use crate::content::ERROR_MESSAGE;
use crate::error::{Result, SpeechError};
use crate::state::{ChatMessage, ChatRole, Conversation, MessageId, SubmissionSource};
use crate::voice::{RecognitionOptions, Utterance, VoiceIo, VoicePolicy};

/// Something the user should be told about right away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SpeechUnsupported,
    RecognitionUnsupported,
    RecognitionFailed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::SpeechUnsupported => {
                "Text-to-speech is not supported on this system.".to_string()
            }
            Notice::RecognitionUnsupported => {
                "Voice input is not supported on this system.".to_string()
            }
            Notice::RecognitionFailed(reason) => {
                format!("Voice input failed: {}. Please try again.", reason)
            }
        }
    }
}

/// Emitted whenever the session changes, for redraw-on-change front ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Changed,
    Notice(Notice),
}

/// Point-in-time copy of everything a front end renders
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub loading: bool,
    pub listening: bool,
    pub speaking: Option<MessageId>,
}

#[derive(Debug, Default)]
struct ChatState {
    conversation: Conversation,
    input: String,
    loading: bool,
    listening: bool,
    speaking: Option<MessageId>,
    // Bumped on every speak/listen transition so that a stale completion
    // cannot clear the state of a newer request.
    speech_generation: u64,
    listen_generation: u64,
}

struct Shared {
    state: Mutex<ChatState>,
    backend: Arc<dyn ChatBackend>,
    voice: VoiceIo,
    policy: VoicePolicy,
    settings: VoiceSettings,
    liveness: CancellationToken,
    events: mpsc::UnboundedSender<SessionEvent>,
}

/// One mounted chat client. Dropping it tears the session down.
pub struct ChatSession {
    shared: Arc<Shared>,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        voice: VoiceIo,
        settings: VoiceSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let policy = VoicePolicy::new(settings.preferred_voice.clone());
        let shared = Arc::new(Shared {
            state: Mutex::new(ChatState::default()),
            backend,
            voice,
            policy,
            settings,
            liveness: CancellationToken::new(),
            events,
        });
        (Self { shared }, rx)
    }

    /// Submit `text`. Returns the ingestion task when the submission is
    /// accepted, `None` when it is empty, a request is already in flight,
    /// or the session has been shut down.
    pub fn submit(&self, text: &str, source: SubmissionSource) -> Option<JoinHandle<()>> {
        self.shared.submit(text, source)
    }

    /// Submit the current input buffer
    pub fn submit_input(&self) -> Option<JoinHandle<()>> {
        let text = self.shared.state.lock().input.clone();
        self.shared.submit(&text, SubmissionSource::Typed)
    }

    /// Put an example question in the input and submit it
    pub fn submit_example(&self, question: &str) -> Option<JoinHandle<()>> {
        self.set_input(question);
        self.shared.submit(question, SubmissionSource::Example)
    }

    pub fn set_input(&self, text: &str) {
        if self.shared.with_state(|state| state.input = text.to_string()).is_some() {
            self.shared.notify();
        }
    }

    pub fn input(&self) -> String {
        self.shared.state.lock().input.clone()
    }

    /// Speak message `id`, or stop it if it is already being spoken
    pub fn toggle_speech(&self, id: MessageId) -> Option<JoinHandle<()>> {
        self.shared.toggle_speech(id)
    }

    /// Start listening for one utterance, or stop an active session
    pub fn toggle_listening(&self) -> Option<JoinHandle<()>> {
        self.shared.toggle_listening()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.state.lock().conversation.messages().to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().loading
    }

    pub fn is_listening(&self) -> bool {
        self.shared.state.lock().listening
    }

    pub fn speaking(&self) -> Option<MessageId> {
        self.shared.state.lock().speaking
    }

    pub fn last_assistant_id(&self) -> Option<MessageId> {
        self.shared
            .state
            .lock()
            .conversation
            .last_assistant()
            .map(|m| m.id)
    }

    /// Most recent assistant reply that has finished streaming and has text
    pub fn last_complete_reply_id(&self) -> Option<MessageId> {
        let state = self.shared.state.lock();
        let messages = state.conversation.messages();
        let settled = if state.loading {
            messages.len().saturating_sub(1)
        } else {
            messages.len()
        };
        messages[..settled]
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant && !m.content.trim().is_empty())
            .map(|m| m.id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state.lock();
        SessionSnapshot {
            messages: state.conversation.messages().to_vec(),
            input: state.input.clone(),
            loading: state.loading,
            listening: state.listening,
            speaking: state.speaking,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.shared.liveness.is_cancelled()
    }

    /// Tear the session down: suppress all pending updates and stop any
    /// speech activity. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl Shared {
    /// Run `f` on the state unless the session has been torn down
    fn with_state<R>(&self, f: impl FnOnce(&mut ChatState) -> R) -> Option<R> {
        let mut state = self.state.lock();
        if self.liveness.is_cancelled() {
            return None;
        }
        Some(f(&mut state))
    }

    fn notify(&self) {
        let _ = self.events.send(SessionEvent::Changed);
    }

    fn notice(&self, notice: Notice) {
        info!(notice = ?notice, "user notice");
        let _ = self.events.send(SessionEvent::Notice(notice));
    }

    fn submit(self: &Arc<Self>, text: &str, source: SubmissionSource) -> Option<JoinHandle<()>> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }

        let accepted = self.with_state(|state| {
            if state.loading {
                return false;
            }
            state.conversation.append(ChatMessage::user(message));
            state.conversation.append(ChatMessage::assistant_placeholder());
            state.input.clear();
            state.loading = true;
            true
        });
        if accepted != Some(true) {
            debug!(source = source.as_str(), "submission ignored");
            return None;
        }

        info!(source = source.as_str(), "message sent");
        self.notify();

        let shared = Arc::clone(self);
        let message = message.to_string();
        Some(tokio::spawn(async move { shared.ingest(message).await }))
    }

    async fn ingest(self: Arc<Self>, message: String) {
        let outcome = tokio::select! {
            biased;
            _ = self.liveness.cancelled() => {
                debug!("session torn down with a stream in flight");
                return;
            }
            outcome = self.stream_reply(&message) => outcome,
        };

        let settled = self.with_state(|state| {
            if let Err(e) = &outcome {
                warn!(error = %e, "chat request failed");
                state.conversation.replace_last(ERROR_MESSAGE);
            }
            state.loading = false;
        });
        if settled.is_some() {
            self.notify();
        }
    }

    async fn stream_reply(&self, message: &str) -> Result<()> {
        let mut stream = self.backend.open(message).await?;
        let mut decoder = Utf8Decoder::new();
        let mut received = 0usize;

        while let Some(chunk) = stream.next().await {
            let text = decoder.decode(&chunk?)?;
            if text.is_empty() {
                continue;
            }
            received += text.len();
            let applied = self.with_state(|state| {
                state.conversation.update_last(|content| content.push_str(&text));
            });
            if applied.is_none() {
                return Ok(());
            }
            self.notify();
        }

        decoder.finish()?;
        debug!(bytes = received, "chat stream complete");
        Ok(())
    }

    fn toggle_speech(self: &Arc<Self>, id: MessageId) -> Option<JoinHandle<()>> {
        if self.liveness.is_cancelled() {
            return None;
        }
        let synthesizer = Arc::clone(&self.voice.synthesizer);
        if !synthesizer.is_available() {
            self.notice(Notice::SpeechUnsupported);
            return None;
        }

        enum Action {
            Stopped,
            Start { text: String, generation: u64 },
        }

        let action = self.with_state(|state| {
            if state.speaking == Some(id) {
                synthesizer.cancel();
                state.speaking = None;
                state.speech_generation += 1;
                return Some(Action::Stopped);
            }
            let text = state.conversation.get(id)?.content.clone();
            if text.trim().is_empty() {
                return None;
            }
            if state.speaking.is_some() {
                synthesizer.cancel();
            }
            state.speech_generation += 1;
            state.speaking = Some(id);
            Some(Action::Start {
                text,
                generation: state.speech_generation,
            })
        })??;

        let (text, generation) = match action {
            Action::Stopped => {
                debug!(message = %id, "speech stopped");
                self.notify();
                return None;
            }
            Action::Start { text, generation } => (text, generation),
        };

        self.notify();

        let shared = Arc::clone(self);
        Some(tokio::spawn(async move {
            let voices = tokio::select! {
                biased;
                _ = shared.liveness.cancelled() => return,
                voices = synthesizer.voices() => voices,
            };
            let voice = shared.policy.choose(&voices).cloned();
            debug!(message = %id, voice = ?voice.as_ref().map(|v| &v.name), "speaking message");

            // Only start if no newer speak/stop happened while listing voices
            let pending = shared
                .with_state(|state| {
                    if state.speech_generation != generation {
                        return None;
                    }
                    Some(synthesizer.speak(Utterance::new(text, voice, &shared.settings)))
                })
                .flatten();
            let Some(pending) = pending else {
                debug!(message = %id, "speech superseded before it started");
                return;
            };

            let result = tokio::select! {
                biased;
                _ = shared.liveness.cancelled() => return,
                result = pending => result,
            };
            match &result {
                Ok(()) | Err(SpeechError::Interrupted) => {}
                Err(e) => warn!(error = %e, "speech synthesis failed"),
            }

            let cleared = shared.with_state(|state| {
                if state.speech_generation != generation {
                    return false;
                }
                state.speaking = None;
                true
            });
            if cleared == Some(true) {
                shared.notify();
            }
        }))
    }

    fn toggle_listening(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.liveness.is_cancelled() {
            return None;
        }
        let recognizer = Arc::clone(&self.voice.recognizer);
        if !recognizer.is_available() {
            self.notice(Notice::RecognitionUnsupported);
            return None;
        }

        let generation = self.with_state(|state| {
            state.listen_generation += 1;
            if state.listening {
                recognizer.stop();
                state.listening = false;
                None
            } else {
                state.listening = true;
                Some(state.listen_generation)
            }
        })?;
        self.notify();
        let generation = generation?;

        let pending = recognizer.listen(RecognitionOptions::single_utterance(&self.settings.locale));
        debug!(locale = %self.settings.locale, "listening");

        let shared = Arc::clone(self);
        Some(tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = shared.liveness.cancelled() => return,
                result = pending => result,
            };

            let current = shared.with_state(|state| {
                if state.listen_generation != generation {
                    return false;
                }
                state.listening = false;
                true
            });
            if current != Some(true) {
                return;
            }
            shared.notify();

            let transcript = match result {
                Ok(transcript) => transcript.trim().to_string(),
                Err(e) if e.is_benign() => {
                    debug!(error = %e, "recognition ended without a transcript");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "speech recognition failed");
                    shared.notice(Notice::RecognitionFailed(e.to_string()));
                    return;
                }
            };
            if transcript.is_empty() {
                return;
            }

            if shared.with_state(|state| state.input = transcript.clone()).is_none() {
                return;
            }
            shared.notify();

            // Leave the transcript on screen briefly before sending it
            tokio::select! {
                biased;
                _ = shared.liveness.cancelled() => return,
                _ = tokio::time::sleep(shared.settings.auto_submit_delay()) => {}
            }

            if let Some(ingest) = shared.submit(&transcript, SubmissionSource::Voice) {
                let _ = ingest.await;
            }
        }))
    }

    fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if self.liveness.is_cancelled() {
                return;
            }
            self.liveness.cancel();
            state.speaking = None;
            state.listening = false;
        }
        self.voice.synthesizer.cancel();
        self.voice.recognizer.stop();
        info!("chat session shut down");
    }
}
