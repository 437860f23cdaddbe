//! Recording collaborators for driving sessions without a terminal.
//!
//! The unit tests and the engine scenarios under `tests/` play whole
//! sessions against these fakes.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::achievements::Achievement;
use crate::audio::{AudioEngine, AudioPaths, AudioRequest, PlaybackFailure, PlaybackSink, SpeechFallback, SpeechParams};
use crate::engine::{Collaborators, RenderSurface};
use crate::error::Result;
use crate::item::{Item, ItemPool};
use crate::progress::MemoryProgressStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Round(usize, usize),
    Options { prompt: String, ids: Vec<String> },
    Correct(String),
    Incorrect(String),
    Results(u8),
    Achievements(Vec<&'static str>),
    Status(String),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    pub fn results(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Results(stars) => Some(*stars),
                _ => None,
            })
            .collect()
    }

    pub fn achievements(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Achievements(ids) => Some(ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Option ids of the most recent round
    pub fn last_options(&self) -> Vec<String> {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                SurfaceEvent::Options { ids, .. } => Some(ids.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            SurfaceEvent::Options { prompt, .. } => Some(prompt.as_str()),
            _ => None,
        })
    }

    pub fn rounds_shown(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Round(k, _) => Some(*k),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn show_round(&mut self, round: usize, total: usize) {
        self.events.push(SurfaceEvent::Round(round, total));
    }

    fn show_options(&mut self, prompt: &str, options: &[Item]) {
        self.events.push(SurfaceEvent::Options {
            prompt: prompt.to_string(),
            ids: options.iter().map(|o| o.id.clone()).collect(),
        });
    }

    fn mark_correct(&mut self, item_id: &str) {
        self.events.push(SurfaceEvent::Correct(item_id.to_string()));
    }

    fn mark_incorrect(&mut self, item_id: &str) {
        self.events.push(SurfaceEvent::Incorrect(item_id.to_string()));
    }

    fn show_results(&mut self, stars: u8) {
        self.events.push(SurfaceEvent::Results(stars));
    }

    fn show_achievements(&mut self, unlocked: &[&'static Achievement]) {
        self.events
            .push(SurfaceEvent::Achievements(unlocked.iter().map(|a| a.id).collect()));
    }

    fn show_status(&mut self, text: &str) {
        self.events.push(SurfaceEvent::Status(text.to_string()));
    }
}

/// Sink that records every started path; refs listed as missing fail
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub started: Rc<RefCell<Vec<String>>>,
    pub missing: HashSet<String>,
}

impl PlaybackSink for RecordingSink {
    fn start(&mut self, request: &AudioRequest) -> std::result::Result<(), PlaybackFailure> {
        if self.missing.contains(&request.sound_ref) {
            return Err(PlaybackFailure::Missing);
        }
        self.started.borrow_mut().push(request.path());
        Ok(())
    }

    fn stop(&mut self) {}
}

#[derive(Debug, Default)]
pub struct RecordingSpeech {
    pub spoken: Rc<RefCell<Vec<String>>>,
}

impl SpeechFallback for RecordingSpeech {
    fn speak(&mut self, text: &str, _params: SpeechParams) {
        self.spoken.borrow_mut().push(text.to_string());
    }
}

/// A full set of recording collaborators around one item pool
pub struct Harness {
    pub collab: Collaborators,
    pub surface: Rc<RefCell<RecordingSurface>>,
    pub store: Rc<RefCell<MemoryProgressStore>>,
    pub played: Rc<RefCell<Vec<String>>>,
    pub spoken: Rc<RefCell<Vec<String>>>,
}

impl Harness {
    pub fn embedded() -> Result<Self> {
        Ok(Self::with_pool(ItemPool::embedded()?))
    }

    pub fn with_pool(pool: ItemPool) -> Self {
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let store = Rc::new(RefCell::new(MemoryProgressStore::new()));
        let sink = RecordingSink::default();
        let speech = RecordingSpeech::default();
        let played = sink.started.clone();
        let spoken = speech.spoken.clone();
        let audio = AudioEngine::new(Box::new(sink), Box::new(speech), AudioPaths::default())
            .with_speech_texts(pool.speech_texts());

        let collab = Collaborators {
            pool: Rc::new(pool),
            audio: Rc::new(RefCell::new(audio)),
            store: store.clone(),
            surface: surface.clone(),
        };
        Self {
            collab,
            surface,
            store,
            played,
            spoken,
        }
    }
}
