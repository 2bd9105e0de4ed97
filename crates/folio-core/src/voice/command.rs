//! Text-to-speech through a local command line program
//!
//! `say` (macOS) and `espeak-ng`/`espeak` are looked up on `PATH` every time
//! they are needed, so installing one while the client runs is picked up.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use futures_util::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{SpeechSynthesizer, Utterance, Voice};
use crate::error::SpeechError;

/// Words per minute both engines use at rate 1.0
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engine {
    Say,
    Espeak,
}

const CANDIDATES: [(&str, Engine); 3] = [
    ("say", Engine::Say),
    ("espeak-ng", Engine::Espeak),
    ("espeak", Engine::Espeak),
];

#[derive(Default)]
pub struct CommandSynthesizer {
    /// Directories to search instead of `PATH`
    search_path: Option<OsString>,
    /// Cancels the utterance currently playing, if any
    current: Mutex<Option<CancellationToken>>,
}

impl CommandSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for speech programs in `path` (same syntax as `PATH`)
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
            ..Self::default()
        }
    }

    fn locate(&self) -> Option<(PathBuf, Engine)> {
        let path = match &self.search_path {
            Some(path) => path.clone(),
            None => env::var_os("PATH")?,
        };
        CANDIDATES.iter().find_map(|(program, engine)| {
            env::split_paths(&path)
                .map(|dir| dir.join(program))
                .find(|candidate| candidate.is_file())
                .map(|found| (found, *engine))
        })
    }
}

fn say_args(utterance: &Utterance) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.id.clone());
    }
    args.push("-r".to_string());
    args.push(words_per_minute(utterance.rate).to_string());
    args.push("--".to_string());
    args.push(say_text(utterance));
    args
}

/// `say` has no pitch or volume flags; both go in as embedded speech commands
fn say_text(utterance: &Utterance) -> String {
    let mut text = String::new();
    if utterance.volume != 1.0 {
        text.push_str(&format!("[[volm {:.2}]] ", utterance.volume.clamp(0.0, 1.0)));
    }
    if utterance.pitch > 0.0 && utterance.pitch != 1.0 {
        // pbas counts semitones; a signed value shifts the voice's own base
        let semitones = 12.0 * utterance.pitch.log2();
        text.push_str(&format!("[[pbas {:+.1}]] ", semitones));
    }
    text.push_str(&utterance.text);
    text
}

fn espeak_args(utterance: &Utterance) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.id.clone());
    }
    // espeak pitch is 0..=99 around 50, amplitude 0..=200 around 100
    let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;
    args.extend([
        "-s".to_string(),
        words_per_minute(utterance.rate).to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "--".to_string(),
        utterance.text.clone(),
    ]);
    args
}

fn words_per_minute(rate: f32) -> u32 {
    (BASE_WORDS_PER_MINUTE * rate).round().max(1.0) as u32
}

/// Parse `say -v ?` output, e.g. `Samantha   en_US   # Hello, my name is Samantha.`
fn parse_say_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let described = line.split('#').next()?.trim_end();
            let (name, lang) = described.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || lang.is_empty() {
                return None;
            }
            Some(Voice::new(name, lang))
        })
        .collect()
}

/// Parse `espeak-ng --voices` output, skipping the header row.
///
/// espeak selects voices by file (`gmw/en-US`), not by the display name.
fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            match columns.as_slice() {
                [_, lang, _, name, file, ..] => {
                    Some(Voice::new(name.replace('_', " "), *lang).with_id(*file))
                }
                _ => None,
            }
        })
        .collect()
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_available(&self) -> bool {
        self.locate().is_some()
    }

    fn voices(&self) -> BoxFuture<'static, Vec<Voice>> {
        let Some((program, engine)) = self.locate() else {
            return future::ready(Vec::new()).boxed();
        };

        async move {
            let mut command = Command::new(&program);
            match engine {
                Engine::Say => command.args(["-v", "?"]),
                Engine::Espeak => command.arg("--voices"),
            };
            let output = command.stdin(Stdio::null()).kill_on_drop(true).output().await;

            match output {
                Ok(output) if output.status.success() => {
                    let text = String::from_utf8_lossy(&output.stdout);
                    match engine {
                        Engine::Say => parse_say_voices(&text),
                        Engine::Espeak => parse_espeak_voices(&text),
                    }
                }
                Ok(output) => {
                    warn!(status = %output.status, "listing voices failed");
                    Vec::new()
                }
                Err(e) => {
                    warn!(error = %e, "listing voices failed");
                    Vec::new()
                }
            }
        }
        .boxed()
    }

    fn speak(&self, utterance: Utterance) -> BoxFuture<'static, Result<(), SpeechError>> {
        let Some((program, engine)) = self.locate() else {
            return future::ready(Err(SpeechError::Unavailable)).boxed();
        };

        let args = match engine {
            Engine::Say => say_args(&utterance),
            Engine::Espeak => espeak_args(&utterance),
        };

        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }

        async move {
            let mut child = Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| SpeechError::Failed(e.to_string()))?;
            debug!(program = %program.display(), "speaking");

            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => Ok(()),
                    Ok(status) => Err(SpeechError::Failed(format!("exited with {}", status))),
                    Err(e) => Err(SpeechError::Failed(e.to_string())),
                },
                _ = token.cancelled() => {
                    let _ = child.kill().await;
                    Err(SpeechError::Interrupted)
                }
            }
        }
        .boxed()
    }

    fn cancel(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoiceSettings;

    fn tuned(rate: f32, pitch: f32, volume: f32) -> VoiceSettings {
        VoiceSettings {
            rate,
            pitch,
            volume,
            ..VoiceSettings::default()
        }
    }

    #[test]
    fn parses_say_voice_listing() {
        let output = "Alex                en_US    # Most people recognize me by my voice.\n\
                      Bad News            en_US    # The light you see at the end of the tunnel.\n\
                      Eddy (English (UK)) en_GB    # Hello! My name is Eddy.\n";
        let voices = parse_say_voices(output);
        assert_eq!(
            voices,
            vec![
                Voice::new("Alex", "en_US"),
                Voice::new("Bad News", "en_US"),
                Voice::new("Eddy (English (UK))", "en_GB"),
            ]
        );
        assert_eq!(voices[1].id, "Bad News");
    }

    #[test]
    fn parses_espeak_voice_listing() {
        let output = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                      2  en-gb          --/M      English_(Great_Britain) gmw/en\n \
                      5  en-us          --/M      English_(America)  gmw/en-US\n";
        let voices = parse_espeak_voices(output);
        assert_eq!(voices.len(), 2);
        assert_eq!(
            voices[1],
            Voice::new("English (America)", "en-us").with_id("gmw/en-US")
        );
    }

    #[test]
    fn espeak_arguments_select_voice_by_file() {
        let voice = Voice::new("English (America)", "en-us").with_id("gmw/en-US");
        let utterance = Utterance::new("hello", Some(voice), &tuned(1.0, 1.2, 0.5));
        assert_eq!(
            espeak_args(&utterance),
            vec!["-v", "gmw/en-US", "-s", "175", "-p", "60", "-a", "50", "--", "hello"]
        );
    }

    #[test]
    fn say_arguments_include_voice() {
        let voice = Voice::new("Samantha", "en_US");
        let utterance = Utterance::new("hi", Some(voice), &tuned(2.0, 1.0, 1.0));
        assert_eq!(say_args(&utterance), vec!["-v", "Samantha", "-r", "350", "--", "hi"]);
    }

    #[test]
    fn say_embeds_pitch_and_volume() {
        let utterance = Utterance::new("hi", None, &tuned(1.0, 0.5, 0.5));
        assert_eq!(
            say_args(&utterance),
            vec!["-r", "175", "--", "[[volm 0.50]] [[pbas -12.0]] hi"]
        );
    }

    #[cfg(unix)]
    mod engine {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;
        use std::time::{Duration, Instant};

        const LISTING: &str = "printf '%s\\n' \
            'Pty Language Age/Gender VoiceName File Other Languages' \
            ' 5  en-us  --/M  English_(America)  gmw/en-US'";

        /// Install a fake `espeak-ng` whose `--voices` runs `listing` and
        /// whose speech runs `speech`
        fn fake_espeak(dir: &Path, listing: &str, speech: &str) {
            let path = dir.join("espeak-ng");
            let script = format!(
                "#!/bin/sh\nif [ \"$1\" = \"--voices\" ]; then\n{}\nexit 0\nfi\n{}\n",
                listing, speech
            );
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[tokio::test]
        async fn availability_is_checked_on_each_call() {
            let dir = tempfile::tempdir().unwrap();
            let synthesizer = CommandSynthesizer::with_search_path(dir.path());
            assert!(!synthesizer.is_available());
            let result = synthesizer
                .speak(Utterance::new("hi", None, &VoiceSettings::default()))
                .await;
            assert!(matches!(result, Err(SpeechError::Unavailable)));

            fake_espeak(dir.path(), LISTING, "exit 0");
            assert!(synthesizer.is_available());
        }

        #[tokio::test(flavor = "current_thread")]
        async fn slow_voice_listing_does_not_block_the_runtime() {
            let dir = tempfile::tempdir().unwrap();
            fake_espeak(dir.path(), &format!("sleep 1\n{}", LISTING), "exit 0");
            let synthesizer = CommandSynthesizer::with_search_path(dir.path());

            let listing = tokio::spawn(synthesizer.voices());
            let start = Instant::now();
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(start.elapsed() < Duration::from_millis(500));

            let voices = listing.await.unwrap();
            assert_eq!(
                voices,
                vec![Voice::new("English (America)", "en-us").with_id("gmw/en-US")]
            );
        }

        #[tokio::test]
        async fn listed_voice_reaches_espeak_by_file() {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("args.log");
            fake_espeak(
                dir.path(),
                LISTING,
                &format!("printf '%s\\n' \"$*\" >> '{}'", log.display()),
            );
            let synthesizer = CommandSynthesizer::with_search_path(dir.path());

            let voice = synthesizer.voices().await.into_iter().next();
            let utterance = Utterance::new("hello", voice, &tuned(1.0, 1.2, 0.5));
            synthesizer.speak(utterance).await.unwrap();

            assert_eq!(
                fs::read_to_string(&log).unwrap(),
                "-v gmw/en-US -s 175 -p 60 -a 50 -- hello\n"
            );
        }

        #[tokio::test]
        async fn new_speech_and_cancel_interrupt_playback() {
            let dir = tempfile::tempdir().unwrap();
            fake_espeak(dir.path(), LISTING, "exec sleep 5");
            let synthesizer = CommandSynthesizer::with_search_path(dir.path());
            let settings = VoiceSettings::default();

            let first = tokio::spawn(synthesizer.speak(Utterance::new("one", None, &settings)));
            tokio::time::sleep(Duration::from_millis(100)).await;

            let second = synthesizer.speak(Utterance::new("two", None, &settings));
            let first = tokio::time::timeout(Duration::from_secs(3), first)
                .await
                .expect("first utterance should stop when a new one starts")
                .unwrap();
            assert!(matches!(first, Err(SpeechError::Interrupted)));

            let second = tokio::spawn(second);
            tokio::time::sleep(Duration::from_millis(100)).await;
            synthesizer.cancel();
            let second = tokio::time::timeout(Duration::from_secs(3), second)
                .await
                .expect("cancel should stop playback")
                .unwrap();
            assert!(matches!(second, Err(SpeechError::Interrupted)));
        }
    }
}
