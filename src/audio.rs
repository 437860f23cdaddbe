use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::translit::to_latin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Appended to the FIFO, played once everything before it has finished
    Queued,
    /// Stops whatever is playing, discards the queue, plays now
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRequest {
    pub sound_ref: String,
    pub base_path: String,
    pub priority: Priority,
}

impl AudioRequest {
    pub fn path(&self) -> String {
        format!("{}{}", self.base_path, self.sound_ref)
    }
}

/// Why a sound could not be played. Always recovered inside this module.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackFailure {
    #[error("sound resource missing")]
    Missing,
    #[error("sound could not be decoded")]
    Decode,
    #[error("playback rejected by policy")]
    Rejected,
}

/// The primitive "play a sound" output.
///
/// `start` begins playback and returns without waiting. The host reports
/// natural completion through [`AudioEngine::on_finished`] and late failures
/// through [`AudioEngine::on_failed`].
pub trait PlaybackSink {
    fn start(&mut self, request: &AudioRequest) -> Result<(), PlaybackFailure>;
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
}

impl SpeechParams {
    pub const NORMAL: SpeechParams = SpeechParams {
        rate: 0.85,
        pitch: 1.1,
    };
    pub const SYLLABLE: SpeechParams = SpeechParams {
        rate: 0.7,
        pitch: 1.2,
    };
    pub const LETTER: SpeechParams = SpeechParams {
        rate: 0.6,
        pitch: 1.2,
    };
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Best-effort text-to-speech; no completion guarantee
pub trait SpeechFallback {
    fn speak(&mut self, text: &str, params: SpeechParams);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    Pending,
    Done,
    /// Discarded by `stop` or preempted by `play_now` before finishing
    Dropped,
}

/// Deferred completion signal handed back by `play`/`play_now`
#[derive(Debug, Clone)]
pub struct Completion(Rc<Cell<CompletionState>>);

impl Completion {
    fn new() -> Self {
        Self(Rc::new(Cell::new(CompletionState::Pending)))
    }

    fn set(&self, state: CompletionState) {
        if self.0.get() == CompletionState::Pending {
            self.0.set(state);
        }
    }

    pub fn state(&self) -> CompletionState {
        self.0.get()
    }

    pub fn is_done(&self) -> bool {
        self.state() == CompletionState::Done
    }

    pub fn is_pending(&self) -> bool {
        self.state() == CompletionState::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// Where sound references resolve to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioPaths {
    pub base: String,
    pub words: String,
    pub games: String,
    pub phonics: String,
    pub feedback_correct: String,
    pub feedback_incorrect: String,
}

impl Default for AudioPaths {
    fn default() -> Self {
        Self {
            base: "audio/".to_string(),
            words: "audio/words/".to_string(),
            games: "audio/games/".to_string(),
            phonics: "audio/phonics/".to_string(),
            feedback_correct: "bravo.mp3".to_string(),
            feedback_incorrect: "try-again.mp3".to_string(),
        }
    }
}

pub fn word_sound_ref(word: &str) -> String {
    format!("word_{}.mp3", to_latin(word))
}

pub fn syllable_sound_ref(syllable: &str) -> String {
    format!("syl_{}.mp3", to_latin(syllable))
}

pub fn letter_sound_ref(letter: &str) -> String {
    format!("letter_{}.mp3", to_latin(letter))
}

pub fn game_title_sound_ref(game_id: &str) -> String {
    format!("game_game{}.mp3", game_id.replace('-', ""))
}

struct Active {
    request: AudioRequest,
    completion: Completion,
}

/// Serial playback queue over a [`PlaybackSink`].
///
/// At most one request is active. Queued requests play in submission order;
/// an immediate request preempts and discards them. When the sink fails the
/// request is spoken through the [`SpeechFallback`] instead and the queue
/// moves on.
pub struct AudioEngine {
    sink: Box<dyn PlaybackSink>,
    speech: Box<dyn SpeechFallback>,
    speech_texts: HashMap<String, (String, SpeechParams)>,
    paths: AudioPaths,
    queue: VecDeque<(AudioRequest, Completion)>,
    active: Option<Active>,
}

impl AudioEngine {
    pub fn new(
        sink: Box<dyn PlaybackSink>,
        speech: Box<dyn SpeechFallback>,
        paths: AudioPaths,
    ) -> Self {
        Self {
            sink,
            speech,
            speech_texts: HashMap::new(),
            paths,
            queue: VecDeque::new(),
            active: None,
        }
    }

    /// Install the sound-ref → text mapping used when playback fails
    pub fn with_speech_texts(mut self, texts: HashMap<String, String>) -> Self {
        for (sound_ref, text) in texts {
            self.speech_texts
                .insert(sound_ref, (text, SpeechParams::NORMAL));
        }
        self
    }

    pub fn register_speech_text(
        &mut self,
        sound_ref: impl Into<String>,
        text: impl Into<String>,
        params: SpeechParams,
    ) {
        self.speech_texts
            .insert(sound_ref.into(), (text.into(), params));
    }

    pub fn paths(&self) -> &AudioPaths {
        &self.paths
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&AudioRequest> {
        self.active.as_ref().map(|a| &a.request)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Requests waiting behind the active one, in play order
    pub fn queued(&self) -> impl Iterator<Item = &AudioRequest> + '_ {
        self.queue.iter().map(|(request, _)| request)
    }

    pub fn play(&mut self, sound_ref: &str, base_path: &str) -> Completion {
        let completion = Completion::new();
        self.queue.push_back((
            AudioRequest {
                sound_ref: sound_ref.to_string(),
                base_path: base_path.to_string(),
                priority: Priority::Queued,
            },
            completion.clone(),
        ));
        self.process_queue();
        completion
    }

    pub fn play_now(&mut self, sound_ref: &str, base_path: &str) -> Completion {
        self.stop();
        let completion = Completion::new();
        let request = AudioRequest {
            sound_ref: sound_ref.to_string(),
            base_path: base_path.to_string(),
            priority: Priority::Immediate,
        };
        match self.sink.start(&request) {
            Ok(()) => {
                self.active = Some(Active {
                    request,
                    completion: completion.clone(),
                });
            }
            Err(failure) => {
                self.fall_back(&request, failure);
                completion.set(CompletionState::Done);
                self.process_queue();
            }
        }
        completion
    }

    /// Halt playback and empty the queue. Nothing pending completes.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            self.sink.stop();
            active.completion.set(CompletionState::Dropped);
        }
        for (_, completion) in self.queue.drain(..) {
            completion.set(CompletionState::Dropped);
        }
    }

    /// The active sound reached its natural end
    pub fn on_finished(&mut self) {
        match self.active.take() {
            Some(active) => {
                active.completion.set(CompletionState::Done);
                self.process_queue();
            }
            None => debug!("playback finished with nothing active"),
        }
    }

    /// The active sound failed after it started (decode error, missing file)
    pub fn on_failed(&mut self, failure: PlaybackFailure) {
        match self.active.take() {
            Some(active) => {
                self.fall_back(&active.request, failure);
                active.completion.set(CompletionState::Done);
                self.process_queue();
            }
            None => debug!(%failure, "playback failure with nothing active"),
        }
    }

    fn process_queue(&mut self) {
        while self.active.is_none() {
            let Some((request, completion)) = self.queue.pop_front() else {
                return;
            };
            match self.sink.start(&request) {
                Ok(()) => self.active = Some(Active { request, completion }),
                Err(failure) => {
                    self.fall_back(&request, failure);
                    completion.set(CompletionState::Done);
                }
            }
        }
    }

    fn fall_back(&mut self, request: &AudioRequest, failure: PlaybackFailure) {
        warn!(path = %request.path(), %failure, "playback failed, using speech");
        match self.speech_texts.get(&request.sound_ref) {
            Some((text, params)) => self.speech.speak(text, *params),
            None => debug!(sound = %request.sound_ref, "no speech text for sound"),
        }
    }

    pub fn play_feedback(&mut self, feedback: Feedback) -> Completion {
        let file = match feedback {
            Feedback::Correct => self.paths.feedback_correct.clone(),
            Feedback::Incorrect => self.paths.feedback_incorrect.clone(),
        };
        let base = self.paths.base.clone();
        self.play(&file, &base)
    }

    /// Play a word from the pre-generated game clips, named by transliteration
    pub fn play_word(&mut self, word: &str, immediate: bool) -> Completion {
        let sound_ref = word_sound_ref(word);
        self.register_speech_text(sound_ref.clone(), word, SpeechParams::NORMAL);
        self.play_game_clip(&sound_ref, immediate)
    }

    pub fn play_syllable(&mut self, syllable: &str, immediate: bool) -> Completion {
        let sound_ref = syllable_sound_ref(syllable);
        self.register_speech_text(sound_ref.clone(), syllable, SpeechParams::SYLLABLE);
        self.play_game_clip(&sound_ref, immediate)
    }

    pub fn play_letter(&mut self, letter: &str, immediate: bool) -> Completion {
        let sound_ref = letter_sound_ref(letter);
        self.register_speech_text(sound_ref.clone(), letter, SpeechParams::LETTER);
        self.play_game_clip(&sound_ref, immediate)
    }

    /// Play a recorded word clip (`Item::audio_ref`) from the words directory
    pub fn play_word_clip(&mut self, audio_ref: &str, immediate: bool) -> Completion {
        let words = self.paths.words.clone();
        self.play_in(audio_ref, &words, immediate)
    }

    /// Play an instruction or phrase from the base directory
    pub fn play_phrase(&mut self, sound_ref: &str, immediate: bool) -> Completion {
        let base = self.paths.base.clone();
        self.play_in(sound_ref, &base, immediate)
    }

    pub fn play_game_title(&mut self, game_id: &str) -> Completion {
        let sound_ref = game_title_sound_ref(game_id);
        self.play_game_clip(&sound_ref, true)
    }

    /// Play a clip from the game clips directory
    pub fn play_game_clip(&mut self, sound_ref: &str, immediate: bool) -> Completion {
        let games = self.paths.games.clone();
        self.play_in(sound_ref, &games, immediate)
    }

    fn play_in(&mut self, sound_ref: &str, base_path: &str, immediate: bool) -> Completion {
        if immediate {
            self.play_now(sound_ref, base_path)
        } else {
            self.play(sound_ref, base_path)
        }
    }

    pub fn speak(&mut self, text: &str, params: SpeechParams) {
        self.speech.speak(text, params);
    }
}
