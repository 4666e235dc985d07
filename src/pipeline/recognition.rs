//! Recognition worker: capture drain, conversion, recognition, dispatch.

use crate::audio::capture::CaptureSource;
use crate::audio::convert::{self, FormatConverter};
use crate::audio::debug_dump::DebugRecorder;
use crate::defaults;
use crate::pipeline::events::{RelayEvent, StatusReporter};
use crate::pipeline::transcript::{TranscriptAction, TranscriptTracker};
use crate::recognizer::SpeechRecognizer;
use crate::synth::queue::SynthesisQueue;
use crate::synth::voice::VoiceSelector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// State owned by the recognition worker thread.
///
/// The worker drains fixed-duration blocks from the capture source,
/// converts them to the recognizer's mono 16kHz PCM16 format and folds the
/// recognizer's outputs into the shared transcript. A near-silence warning
/// is raised for every quiet block; the audio is still recognized.
pub(crate) struct RecognitionWorker {
    pub capture: Box<dyn CaptureSource>,
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub tracker: TranscriptTracker,
    pub queue: SynthesisQueue,
    pub reporter: Arc<dyn StatusReporter>,
    pub voice: Arc<RwLock<VoiceSelector>>,
    pub transcript: Arc<Mutex<String>>,
    pub recorder: Option<DebugRecorder>,
    pub running: Arc<AtomicBool>,
}

impl RecognitionWorker {
    /// Runs until the shared flag clears, then stops the capture source and
    /// finalizes the diagnostic recording.
    pub fn run(mut self) {
        let format = self.capture.format();
        let converter = FormatConverter::new(format);
        let block_samples = format.samples_for_ms(defaults::BLOCK_DURATION_MS);

        while self.running.load(Ordering::Relaxed) {
            let block = self.capture.drain(block_samples);
            if block.is_empty() {
                std::thread::sleep(Duration::from_millis(defaults::IDLE_BACKOFF_MS));
                continue;
            }

            let mono = match converter.to_mono_target(&block) {
                Ok(mono) => mono,
                Err(e) => {
                    self.reporter
                        .report(RelayEvent::Status(format!("Audio conversion failed: {}", e)));
                    std::thread::sleep(Duration::from_millis(defaults::ERROR_BACKOFF_MS));
                    continue;
                }
            };

            if convert::peak_amplitude(&mono) < defaults::NEAR_SILENCE_THRESHOLD {
                self.reporter.report(RelayEvent::Status(
                    "Near silence on input; check the microphone level".to_string(),
                ));
            }

            let pcm = convert::pack_pcm16(&mono);
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.write_block(&pcm);
            }

            match self.recognizer.accept_block(&pcm) {
                Ok(output) => {
                    let actions = self.tracker.apply(&output);
                    self.dispatch(actions);
                }
                Err(e) => {
                    self.reporter
                        .report(RelayEvent::Status(format!("Recognition failed: {}", e)));
                    std::thread::sleep(Duration::from_millis(defaults::ERROR_BACKOFF_MS));
                }
            }
        }

        if let Err(e) = self.capture.stop() {
            self.reporter
                .report(RelayEvent::Status(format!("Failed to stop capture: {}", e)));
        }
        if let Some(recorder) = self.recorder.take() {
            recorder.finalize();
        }
    }

    fn dispatch(&mut self, actions: Vec<TranscriptAction>) {
        for action in actions {
            match action {
                TranscriptAction::Publish(view) => {
                    *self.transcript.lock().unwrap_or_else(|e| e.into_inner()) = view.clone();
                    self.reporter.report(RelayEvent::Transcript(view));
                }
                TranscriptAction::Synthesize(text) => {
                    let voice = *self.voice.read().unwrap_or_else(|e| e.into_inner());
                    self.queue.enqueue(&text, voice);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::MockCaptureSource;
    use crate::audio::convert::CaptureFormat;
    use crate::pipeline::events::RecordingReporter;
    use crate::recognizer::{MockRecognizer, RecognizerOutput};

    fn spawn_worker(
        capture: MockCaptureSource,
        recognizer: MockRecognizer,
    ) -> (
        Arc<AtomicBool>,
        Arc<Mutex<String>>,
        SynthesisQueue,
        Arc<RecordingReporter>,
        std::thread::JoinHandle<()>,
    ) {
        let running = Arc::new(AtomicBool::new(true));
        let transcript = Arc::new(Mutex::new(String::new()));
        let queue = SynthesisQueue::new();
        let reporter = Arc::new(RecordingReporter::new());

        let worker = RecognitionWorker {
            capture: Box::new(capture),
            recognizer: Box::new(recognizer),
            tracker: TranscriptTracker::new(),
            queue: queue.clone(),
            reporter: reporter.clone() as Arc<dyn StatusReporter>,
            voice: Arc::new(RwLock::new(VoiceSelector::default())),
            transcript: transcript.clone(),
            recorder: None,
            running: running.clone(),
        };
        let handle = std::thread::spawn(move || worker.run());
        (running, transcript, queue, reporter, handle)
    }

    fn loud_block(samples: usize) -> Vec<f32> {
        vec![0.5; samples]
    }

    #[test]
    fn test_final_reaches_transcript_and_queue() {
        let format = CaptureFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let capture = MockCaptureSource::new()
            .with_format(format)
            .with_block(loud_block(1280));
        let recognizer = MockRecognizer::new()
            .with_script(vec![RecognizerOutput::Final("hello world".to_string())]);

        let (running, transcript, queue, _reporter, handle) = spawn_worker(capture, recognizer);
        std::thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        assert_eq!(*transcript.lock().unwrap(), "hello world");
        let utterance = queue.recv_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(utterance.text, "hello world");
    }

    #[test]
    fn test_near_silence_warns_but_still_recognizes() {
        let format = CaptureFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let capture = MockCaptureSource::new()
            .with_format(format)
            .with_block(vec![0.0001; 1280])
            .with_block(vec![0.0001; 1280]);
        let recognizer = MockRecognizer::new()
            .with_script(vec![RecognizerOutput::Final("still heard".to_string())]);

        let (running, transcript, _queue, reporter, handle) = spawn_worker(capture, recognizer);
        std::thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        assert_eq!(*transcript.lock().unwrap(), "still heard");
        // One warning per quiet block, not a one-shot.
        let warnings = reporter
            .statuses()
            .iter()
            .filter(|s| s.contains("Near silence"))
            .count();
        assert_eq!(
            warnings,
            2,
            "Expected a near-silence status per quiet block, got {:?}",
            reporter.statuses()
        );
    }

    #[test]
    fn test_recognition_error_reports_status_and_continues() {
        let format = CaptureFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let capture = MockCaptureSource::new()
            .with_format(format)
            .with_block(loud_block(1280));
        let recognizer = MockRecognizer::new().with_failure();

        let (running, _transcript, _queue, reporter, handle) = spawn_worker(capture, recognizer);
        std::thread::sleep(Duration::from_millis(250));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        let statuses = reporter.statuses();
        assert!(
            statuses.iter().any(|s| s.contains("Recognition failed")),
            "Expected a recognition failure status, got {:?}",
            statuses
        );
    }

    #[test]
    fn test_worker_stops_capture_on_exit() {
        let format = CaptureFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let capture = MockCaptureSource::new().with_format(format);
        let stopped = capture.stopped_handle();

        let (running, _transcript, _queue, _reporter, handle) =
            spawn_worker(capture, MockRecognizer::new());
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        assert!(stopped.load(Ordering::Relaxed));
    }
}
