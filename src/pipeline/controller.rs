//! Session lifecycle: wiring, worker threads and shutdown.

use crate::audio::capture::CaptureSource;
use crate::audio::debug_dump::DebugRecorder;
use crate::audio::playback::PlaybackSink;
use crate::defaults;
use crate::error::Result;
use crate::pipeline::events::{LogReporter, RelayEvent, StatusReporter};
use crate::pipeline::recognition::RecognitionWorker;
use crate::pipeline::synthesis::SynthesisWorker;
use crate::pipeline::transcript::TranscriptTracker;
use crate::recognizer;
#[cfg(feature = "cpal-audio")]
use crate::recognizer::SpeechRecognizer;
use crate::synth::engine::SynthesisEngine;
use crate::synth::queue::SynthesisQueue;
use crate::synth::voice::{Gender, Language, VoiceSelector};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Observable relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Initializing,
    Running,
    Stopping,
}

/// Session options resolved from config and CLI.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Input device name, `None` for the system default.
    pub input_device: Option<String>,
    /// Output device name, `None` for automatic selection.
    pub output_device: Option<String>,
    /// Directory holding per-language model subdirectories.
    pub models_dir: PathBuf,
    /// Recognition and synthesis language.
    pub language: Language,
    /// Synthesized voice gender.
    pub gender: Gender,
    /// Explicit synthesis binary path, `None` for discovery.
    pub synth_binary: Option<PathBuf>,
    /// Record the converted recognizer input to a WAV artifact.
    pub debug_dump: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            models_dir: PathBuf::from(defaults::MODELS_DIR),
            language: Language::default(),
            gender: Gender::default(),
            synth_binary: None,
            debug_dump: false,
        }
    }
}

pub type CaptureFactory =
    Box<dyn Fn(Option<&str>) -> Result<Box<dyn CaptureSource>> + Send + Sync>;
pub type EngineFactory =
    Box<dyn Fn(Option<&Path>) -> Box<dyn SynthesisEngine> + Send + Sync>;
pub type PlaybackFactory =
    Box<dyn Fn(Option<&str>) -> Result<Box<dyn PlaybackSink>> + Send + Sync>;

/// Component factories for one relay.
///
/// Every device-touching component goes through a factory so tests can
/// substitute mocks; a fresh instance is built per session.
pub struct RelayBackend {
    pub capture: CaptureFactory,
    pub recognizer: recognizer::RecognizerFactory,
    pub engine: EngineFactory,
    pub playback: PlaybackFactory,
}

impl RelayBackend {
    pub fn new(
        capture: CaptureFactory,
        recognizer: recognizer::RecognizerFactory,
        engine: EngineFactory,
        playback: PlaybackFactory,
    ) -> Self {
        Self {
            capture,
            recognizer,
            engine,
            playback,
        }
    }

    /// The production backend: CPAL devices, Vosk recognition, espeak-ng.
    #[cfg(feature = "cpal-audio")]
    pub fn system() -> Self {
        Self {
            capture: Box::new(|device| {
                let source = crate::audio::capture::CpalCaptureSource::new(device)?;
                Ok(Box::new(source) as Box<dyn CaptureSource>)
            }),
            recognizer: Box::new(|model_dir| Self::system_recognizer(model_dir)),
            engine: Box::new(|binary| {
                Box::new(crate::synth::engine::EspeakEngine::new(
                    binary.map(Path::to_path_buf),
                )) as Box<dyn SynthesisEngine>
            }),
            playback: Box::new(|device| {
                Ok(Box::new(crate::audio::playback::CpalPlayback::new(device)?)
                    as Box<dyn PlaybackSink>)
            }),
        }
    }

    #[cfg(all(feature = "cpal-audio", feature = "vosk"))]
    fn system_recognizer(model_dir: &Path) -> Result<Box<dyn SpeechRecognizer>> {
        Ok(Box::new(crate::recognizer::vosk::VoskRecognizer::new(
            model_dir,
        )?))
    }

    #[cfg(all(feature = "cpal-audio", not(feature = "vosk")))]
    fn system_recognizer(_model_dir: &Path) -> Result<Box<dyn SpeechRecognizer>> {
        Err(crate::error::RelayError::RecognizerInit {
            message: "Built without a recognition backend (enable the `vosk` feature)"
                .to_string(),
        })
    }
}

/// One running session's threads and stop flag.
struct Session {
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

/// Owns the relay lifecycle.
///
/// `enable` builds a fresh capture/recognition/synthesis stack and starts
/// the two worker threads; `disable` signals them and joins with a bounded
/// deadline. All methods are safe to call repeatedly.
pub struct RelayController {
    options: RelayOptions,
    backend: RelayBackend,
    reporter: Arc<dyn StatusReporter>,
    state: PipelineState,
    voice: Arc<RwLock<VoiceSelector>>,
    transcript: Arc<Mutex<String>>,
    session: Option<Session>,
}

impl RelayController {
    pub fn new(options: RelayOptions, backend: RelayBackend) -> Self {
        Self::with_reporter(options, backend, Arc::new(LogReporter))
    }

    pub fn with_reporter(
        options: RelayOptions,
        backend: RelayBackend,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        let voice = VoiceSelector::new(options.language, options.gender);
        Self {
            options,
            backend,
            reporter,
            state: PipelineState::Idle,
            voice: Arc::new(RwLock::new(voice)),
            transcript: Arc::new(Mutex::new(String::new())),
            session: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Current transcript view.
    pub fn transcript(&self) -> String {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Switches the language. Pending synthesis picks up the new voice
    /// immediately; recognition follows on the next `enable`.
    pub fn set_language(&mut self, language: Language) {
        self.options.language = language;
        self.voice.write().unwrap_or_else(|e| e.into_inner()).language = language;
        if self.state == PipelineState::Running {
            self.reporter.report(RelayEvent::Status(format!(
                "Language set to {}; recognition switches on restart",
                language.code()
            )));
        }
    }

    /// Switches the voice gender for everything not yet synthesized.
    pub fn set_gender(&mut self, gender: Gender) {
        self.options.gender = gender;
        self.voice.write().unwrap_or_else(|e| e.into_inner()).gender = gender;
    }

    /// Starts a session. No-op when already running.
    ///
    /// Any component failure aborts the whole start: the error is reported
    /// and returned, already-started components are torn down and the state
    /// returns to `Idle`.
    pub fn enable(&mut self) -> Result<()> {
        if self.state == PipelineState::Running {
            return Ok(());
        }
        self.state = PipelineState::Initializing;
        self.reporter
            .report(RelayEvent::Status("Initializing...".to_string()));

        match self.start_session() {
            Ok(session) => {
                self.session = Some(session);
                self.state = PipelineState::Running;
                self.reporter
                    .report(RelayEvent::Status("Listening...".to_string()));
                Ok(())
            }
            Err(e) => {
                self.reporter
                    .report(RelayEvent::Status(format!("Start failed: {}", e)));
                self.state = PipelineState::Idle;
                Err(e)
            }
        }
    }

    fn start_session(&mut self) -> Result<Session> {
        let model_dir = recognizer::model_dir(&self.options.models_dir, self.options.language)?;
        let recognizer = (self.backend.recognizer)(&model_dir)?;

        let mut capture = (self.backend.capture)(self.options.input_device.as_deref())?;
        capture.start()?;

        let playback = match (self.backend.playback)(self.options.output_device.as_deref()) {
            Ok(playback) => playback,
            Err(e) => {
                let _ = capture.stop();
                return Err(e);
            }
        };
        let engine = (self.backend.engine)(self.options.synth_binary.as_deref());

        let recorder = if self.options.debug_dump {
            DebugRecorder::open_default()
        } else {
            None
        };

        // Fresh per-session state: transcript, queue and stop flag.
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        let queue = SynthesisQueue::new();
        let running = Arc::new(AtomicBool::new(true));

        let recognition = RecognitionWorker {
            capture,
            recognizer,
            tracker: TranscriptTracker::new(),
            queue: queue.clone(),
            reporter: Arc::clone(&self.reporter),
            voice: Arc::clone(&self.voice),
            transcript: Arc::clone(&self.transcript),
            recorder,
            running: Arc::clone(&running),
        };
        let synthesis = SynthesisWorker {
            queue,
            engine,
            playback,
            reporter: Arc::clone(&self.reporter),
            voice: Arc::clone(&self.voice),
            running: Arc::clone(&running),
        };

        let threads = vec![
            std::thread::Builder::new()
                .name("revoice-recognition".to_string())
                .spawn(move || recognition.run())?,
            std::thread::Builder::new()
                .name("revoice-synthesis".to_string())
                .spawn(move || synthesis.run())?,
        ];

        Ok(Session { running, threads })
    }

    /// Stops the session. No-op when idle.
    ///
    /// Workers get a bounded window to finish; stragglers are detached and
    /// die with the process.
    pub fn disable(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        self.state = PipelineState::Stopping;
        session.running.store(false, Ordering::Relaxed);

        let deadline = Instant::now() + Duration::from_millis(defaults::WORKER_JOIN_MS);
        loop {
            let mut remaining = Vec::new();
            for handle in session.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        self.reporter.report(RelayEvent::Status(format!(
                            "Worker thread panicked: {}",
                            msg
                        )));
                    }
                } else {
                    remaining.push(handle);
                }
            }
            session.threads = remaining;

            if session.threads.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                self.reporter.report(RelayEvent::Status(format!(
                    "Shutdown timeout, detaching {} worker(s)",
                    session.threads.len()
                )));
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.state = PipelineState::Idle;
        self.reporter
            .report(RelayEvent::Status("Stopped".to_string()));
    }
}

impl Drop for RelayController {
    fn drop(&mut self) {
        self.disable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::MockCaptureSource;
    use crate::audio::convert::CaptureFormat;
    use crate::audio::playback::MockPlayback;
    use crate::pipeline::events::RecordingReporter;
    use crate::recognizer::{MockRecognizer, RecognizerOutput};
    use crate::synth::engine::MockSynthesisEngine;

    fn mock_backend(script: Vec<RecognizerOutput>) -> RelayBackend {
        let script = Arc::new(Mutex::new(Some(script)));
        RelayBackend::new(
            Box::new(|_| {
                let format = CaptureFormat {
                    sample_rate: 16_000,
                    channels: 1,
                };
                Ok(Box::new(
                    MockCaptureSource::new()
                        .with_format(format)
                        .with_block(vec![0.5; 1280]),
                ) as Box<dyn crate::audio::capture::CaptureSource>)
            }),
            Box::new(move |_| {
                let script = script.lock().unwrap().take().unwrap_or_default();
                Ok(Box::new(MockRecognizer::new().with_script(script))
                    as Box<dyn crate::recognizer::SpeechRecognizer>)
            }),
            Box::new(|_| Box::new(MockSynthesisEngine::new()) as Box<dyn SynthesisEngine>),
            Box::new(|_| Ok(Box::new(MockPlayback::new()) as Box<dyn PlaybackSink>)),
        )
    }

    fn options_with_models(dir: &Path) -> RelayOptions {
        let model = dir.join(Language::default().model_dir_name());
        std::fs::create_dir_all(model).unwrap();
        RelayOptions {
            models_dir: dir.to_path_buf(),
            ..RelayOptions::default()
        }
    }

    #[test]
    fn test_enable_disable_cycle() {
        let models = tempfile::tempdir().unwrap();
        let mut controller = RelayController::new(
            options_with_models(models.path()),
            mock_backend(vec![RecognizerOutput::Final("hello world".to_string())]),
        );
        assert_eq!(controller.state(), PipelineState::Idle);

        controller.enable().unwrap();
        assert_eq!(controller.state(), PipelineState::Running);

        // Let the workers pick up the scripted final.
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(controller.transcript(), "hello world");

        controller.disable();
        assert_eq!(controller.state(), PipelineState::Idle);
        assert_eq!(controller.transcript(), "");
    }

    #[test]
    fn test_enable_is_idempotent() {
        let models = tempfile::tempdir().unwrap();
        let mut controller =
            RelayController::new(options_with_models(models.path()), mock_backend(vec![]));
        controller.enable().unwrap();
        controller.enable().unwrap();
        assert_eq!(controller.state(), PipelineState::Running);
        controller.disable();
    }

    #[test]
    fn test_disable_when_idle_is_a_no_op() {
        let models = tempfile::tempdir().unwrap();
        let mut controller =
            RelayController::new(options_with_models(models.path()), mock_backend(vec![]));
        controller.disable();
        assert_eq!(controller.state(), PipelineState::Idle);
    }

    #[test]
    fn test_missing_model_fails_back_to_idle() {
        let empty = tempfile::tempdir().unwrap();
        let options = RelayOptions {
            models_dir: empty.path().to_path_buf(),
            ..RelayOptions::default()
        };
        let reporter = Arc::new(RecordingReporter::new());
        let mut controller =
            RelayController::with_reporter(options, mock_backend(vec![]), reporter.clone());

        assert!(controller.enable().is_err());
        assert_eq!(controller.state(), PipelineState::Idle);
        assert!(
            reporter.statuses().iter().any(|s| s.contains("Start failed")),
            "Expected a start failure status, got {:?}",
            reporter.statuses()
        );
    }

    #[test]
    fn test_capture_start_failure_aborts_enable() {
        let models = tempfile::tempdir().unwrap();
        let backend = RelayBackend::new(
            Box::new(|_| {
                Ok(Box::new(MockCaptureSource::new().with_start_failure())
                    as Box<dyn crate::audio::capture::CaptureSource>)
            }),
            Box::new(|_| {
                Ok(Box::new(MockRecognizer::new())
                    as Box<dyn crate::recognizer::SpeechRecognizer>)
            }),
            Box::new(|_| Box::new(MockSynthesisEngine::new()) as Box<dyn SynthesisEngine>),
            Box::new(|_| Ok(Box::new(MockPlayback::new()) as Box<dyn PlaybackSink>)),
        );
        let mut controller = RelayController::new(options_with_models(models.path()), backend);

        assert!(controller.enable().is_err());
        assert_eq!(controller.state(), PipelineState::Idle);
    }

    #[test]
    fn test_reenable_starts_fresh_transcript() {
        let models = tempfile::tempdir().unwrap();
        let scripts = Arc::new(Mutex::new(vec![
            vec![RecognizerOutput::Final("second".to_string())],
            vec![RecognizerOutput::Final("first".to_string())],
        ]));
        let scripts_factory = Arc::clone(&scripts);
        let backend = RelayBackend::new(
            Box::new(|_| {
                Ok(Box::new(MockCaptureSource::new().with_block(vec![0.5; 1280]))
                    as Box<dyn crate::audio::capture::CaptureSource>)
            }),
            Box::new(move |_| {
                let script = scripts_factory.lock().unwrap().pop().unwrap_or_default();
                Ok(Box::new(MockRecognizer::new().with_script(script))
                    as Box<dyn crate::recognizer::SpeechRecognizer>)
            }),
            Box::new(|_| Box::new(MockSynthesisEngine::new()) as Box<dyn SynthesisEngine>),
            Box::new(|_| Ok(Box::new(MockPlayback::new()) as Box<dyn PlaybackSink>)),
        );
        let mut controller = RelayController::new(options_with_models(models.path()), backend);

        controller.enable().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(controller.transcript(), "first");
        controller.disable();

        controller.enable().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(controller.transcript(), "second");
        controller.disable();
    }

    #[test]
    fn test_set_gender_updates_shared_voice() {
        let models = tempfile::tempdir().unwrap();
        let mut controller =
            RelayController::new(options_with_models(models.path()), mock_backend(vec![]));
        controller.set_gender(Gender::Male);
        assert_eq!(controller.voice.read().unwrap().gender, Gender::Male);
    }
}
