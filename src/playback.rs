//! Terminal host for [`AudioEngine`]: no speakers, so clips are checked on
//! disk and "played" for a fixed length, and speech becomes a caption.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::audio::{AudioEngine, AudioRequest, PlaybackFailure, PlaybackSink, SpeechFallback, SpeechParams};

pub const CLIP_LENGTH: Duration = Duration::from_millis(700);

/// Starts a clip only if its file exists
#[derive(Debug, Default)]
pub struct FileProbeSink;

impl PlaybackSink for FileProbeSink {
    fn start(&mut self, request: &AudioRequest) -> Result<(), PlaybackFailure> {
        if Path::new(&request.path()).is_file() {
            Ok(())
        } else {
            Err(PlaybackFailure::Missing)
        }
    }

    fn stop(&mut self) {}
}

/// Shows spoken text on screen for a moment
#[derive(Debug, Default, Clone)]
pub struct Caption(Rc<RefCell<Option<(String, Duration)>>>);

impl Caption {
    const SHOWN_FOR: Duration = Duration::from_millis(1500);

    pub fn text(&self) -> Option<String> {
        self.0.borrow().as_ref().map(|(t, _)| t.clone())
    }

    pub fn tick(&self, dt: Duration) {
        let mut slot = self.0.borrow_mut();
        let expired = match slot.as_mut() {
            Some((_, left)) => {
                *left = left.saturating_sub(dt);
                left.is_zero()
            }
            None => false,
        };
        if expired {
            *slot = None;
        }
    }
}

impl SpeechFallback for Caption {
    fn speak(&mut self, text: &str, _params: SpeechParams) {
        *self.0.borrow_mut() = Some((text.to_string(), Self::SHOWN_FOR));
    }
}

/// Reports natural completion of the active clip after [`CLIP_LENGTH`]
#[derive(Debug, Default)]
pub struct ClipClock {
    playing: Option<(AudioRequest, Duration)>,
}

impl ClipClock {
    pub fn tick(&mut self, audio: &mut AudioEngine, dt: Duration) {
        let Some(active) = audio.active().cloned() else {
            self.playing = None;
            return;
        };
        let elapsed = match self.playing.take() {
            Some((request, elapsed)) if request == active => elapsed + dt,
            _ => dt,
        };
        if elapsed >= CLIP_LENGTH {
            audio.on_finished();
        } else {
            self.playing = Some((active, elapsed));
        }
    }
}
