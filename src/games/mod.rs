//! The concrete games. Each one only fills in [`Game`] hooks; the round
//! loop, scoring and persistence live in the engine.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::config::Settings;
use crate::engine::{Collaborators, Game, GameRegistry, SessionEngine};
use crate::error::Result;
use crate::session::{SessionConfig, StarThresholds, DEFAULT_ACHIEVEMENT_DELAY, DEFAULT_ADVANCE_DELAY};

mod phonics;
mod sorting;
mod train;
mod vocab;

pub use phonics::PhonicsGame;
pub use sorting::SortingGame;
pub use train::TrainGame;
pub use vocab::VocabGame;

pub const PHONICS: &str = "phonics";
pub const VOCAB: &str = "vocab";
pub const SORTING: &str = "sorting";
pub const TRAIN: &str = "train";

/// Knobs shared by all games, usually taken from [`Settings`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOptions {
    pub choice_count: usize,
    /// Letters whose words may appear as phonics distractors; empty means all
    pub allowed_letters: Vec<String>,
    pub advance_delay: Duration,
    pub achievement_delay: Duration,
    /// Fixed seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            choice_count: 4,
            allowed_letters: Vec::new(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            achievement_delay: DEFAULT_ACHIEVEMENT_DELAY,
            seed: None,
        }
    }
}

impl GameOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            choice_count: settings.num_choices,
            allowed_letters: settings.filtered_letters.clone(),
            advance_delay: Duration::from_millis(settings.advance_delay_ms),
            achievement_delay: Duration::from_millis(settings.achievement_delay_ms),
            seed: None,
        }
    }

    fn session(&self, rounds: usize, thresholds: StarThresholds) -> SessionConfig {
        SessionConfig::new(rounds, self.choice_count, thresholds)
            .with_delays(self.advance_delay, self.achievement_delay)
    }
}

/// All four games, configured and ready to start
pub fn registry(collab: &Collaborators, options: &GameOptions) -> Result<GameRegistry> {
    let mut registry = GameRegistry::new();
    registry.register(Box::new(engine(PhonicsGame::new(options.clone()), collab, options.seed)?));
    registry.register(Box::new(engine(VocabGame::new(options.clone()), collab, options.seed)?));
    registry.register(Box::new(engine(SortingGame::new(options.clone()), collab, options.seed)?));
    registry.register(Box::new(engine(TrainGame::new(options.clone()), collab, options.seed)?));
    Ok(registry)
}

fn engine<G: Game + 'static>(
    game: G,
    collab: &Collaborators,
    seed: Option<u64>,
) -> Result<SessionEngine<G>> {
    let engine = SessionEngine::for_game(game, collab.clone())?;
    Ok(match seed {
        Some(seed) => engine.with_rng(StdRng::seed_from_u64(seed)),
        None => engine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StartParams;
    use crate::testing::Harness;

    #[test]
    fn test_registry_has_every_game() {
        let h = Harness::embedded().unwrap();
        let registry = registry(&h.collab, &GameOptions::default()).unwrap();
        assert_eq!(registry.names(), vec![PHONICS, VOCAB, SORTING, TRAIN]);
    }

    #[test]
    fn test_every_game_starts() {
        let h = Harness::embedded().unwrap();
        let mut registry = registry(&h.collab, &GameOptions::default()).unwrap();
        for name in [PHONICS, VOCAB, SORTING, TRAIN] {
            let game = registry.start(name, &StartParams::default()).unwrap();
            assert!(game.is_accepting_input(), "{name} did not load a round");
        }
    }

    #[test]
    fn test_bad_choice_count_fails_registry() {
        let h = Harness::embedded().unwrap();
        let options = GameOptions {
            choice_count: 1,
            ..GameOptions::default()
        };
        assert!(registry(&h.collab, &options).is_err());
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings {
            num_choices: 6,
            advance_delay_ms: 10,
            ..Settings::default()
        };
        let options = GameOptions::from_settings(&settings);
        assert_eq!(options.choice_count, 6);
        assert_eq!(options.advance_delay, Duration::from_millis(10));
        assert_eq!(options.allowed_letters, settings.filtered_letters);
    }
}
