use chrono::Utc;

use super::{GameOptions, VOCAB};
use crate::engine::{Game, RoundProgress, SessionContext};
use crate::item::Item;
use crate::select::LearnerWeighting;
use crate::session::{SessionConfig, StarThresholds};

const ROUNDS: usize = 5;
const THRESHOLDS: StarThresholds = StarThresholds::new(0, 2);

/// "Find the picture": hear and read a word, pick its picture.
///
/// Words the learner has not met or keeps missing come up more often.
pub struct VocabGame {
    options: GameOptions,
}

impl VocabGame {
    pub fn new(options: GameOptions) -> Self {
        Self { options }
    }
}

impl Game for VocabGame {
    fn game_type(&self) -> &'static str {
        VOCAB
    }

    fn session_config(&self) -> SessionConfig {
        self.options.session(ROUNDS, THRESHOLDS)
    }

    fn title_id(&self) -> Option<&'static str> {
        Some("nameri-kartinkata")
    }

    fn on_load_round(&mut self, ctx: &mut SessionContext<'_>) {
        let words = ctx.pool().tagged(VOCAB);
        let stats = ctx.store().word_stats(VOCAB);
        let weighting = LearnerWeighting::new(stats, Utc::now());
        let Some(word) = ctx.select_item_weighted(&words, &weighting) else {
            return;
        };

        let options = ctx.create_options(&words, |_| true);
        ctx.present(&word.display_text, options);
        ctx.audio().play_word_clip(&word.audio_ref, false);
    }

    fn on_correct(&mut self, choice: &Item, ctx: &mut SessionContext<'_>) -> RoundProgress {
        ctx.audio().play_word_clip(&choice.audio_ref, false);
        RoundProgress::Complete
    }

    fn on_incorrect(&mut self, choice: &Item, ctx: &mut SessionContext<'_>) {
        ctx.audio().play_word_clip(&choice.audio_ref, false);
    }

    fn on_repeat(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(sound) = ctx.target().map(|t| t.audio_ref.clone()) else {
            return;
        };
        ctx.audio().play_word_clip(&sound, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SessionEngine, StartParams};
    use crate::progress::ProgressStore;
    use crate::testing::Harness;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;

    fn engine(h: &Harness) -> SessionEngine<VocabGame> {
        SessionEngine::for_game(VocabGame::new(GameOptions::default()), h.collab.clone())
            .unwrap()
            .with_rng(StdRng::seed_from_u64(5))
    }

    fn play_perfect(engine: &mut SessionEngine<VocabGame>) -> Vec<String> {
        let mut seen = Vec::new();
        for _ in 0..ROUNDS {
            let id = engine.state().unwrap().target.clone().unwrap().id;
            engine.choose(&id);
            engine.tick(Duration::from_millis(2300));
            seen.push(id);
        }
        seen
    }

    #[test]
    fn test_prompt_is_the_word_and_title_plays() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        let target = engine.state().unwrap().target.clone().unwrap();
        assert_eq!(h.surface.borrow().last_prompt(), Some(target.display_text.as_str()));
        assert_eq!(
            h.played.borrow().first().map(String::as_str),
            Some("audio/games/game_gamenamerikartinkata.mp3")
        );
    }

    #[test]
    fn test_session_words_do_not_repeat() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        let seen = play_perfect(&mut engine);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), ROUNDS);
        assert_eq!(engine.outcome().map(|o| o.stars), Some(3));
    }

    #[test]
    fn test_completed_sessions_unlock_vocab_stickers() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        play_perfect(&mut engine);
        engine.tick(Duration::from_millis(1000));

        assert_eq!(h.store.borrow().read().games_played(VOCAB), 1);
        assert_eq!(
            h.surface.borrow().achievements(),
            vec!["vocabFirst", "vocabPerfect"]
        );
    }

    const SMALL_POOL: &str = r#"{
        "letters": [{"letter": "К", "instruction_text": "К", "audio": "instr_k.mp3"}],
        "words": [
            {"id": "kotka", "word": "котка", "starts_with": "К", "audio": "kotka.mp3", "tags": ["vocab"]},
            {"id": "kuche", "word": "куче", "starts_with": "К", "audio": "kuche.mp3", "tags": ["vocab"]},
            {"id": "kon", "word": "кон", "starts_with": "К", "audio": "kon.mp3", "tags": ["vocab"]},
            {"id": "kashta", "word": "къща", "starts_with": "К", "audio": "kashta.mp3", "tags": ["vocab"]}
        ],
        "feedback": {
            "correct": {"file": "bravo.mp3", "text": "Браво!"},
            "incorrect": {"file": "try-again.mp3", "text": "Опитай пак!"}
        }
    }"#;

    #[test]
    fn test_struggled_words_come_back_more_often() {
        let mut hits = 0;
        for seed in 0..100 {
            let h = Harness::with_pool(crate::item::ItemPool::from_json(SMALL_POOL).unwrap());
            {
                let mut store = h.store.borrow_mut();
                for id in ["kuche", "kon", "kashta"] {
                    store.record_shown(VOCAB, id);
                    store.record_correct(VOCAB, id);
                }
                store.record_mistake(VOCAB, "kotka");
            }
            let mut engine = SessionEngine::for_game(
                VocabGame::new(GameOptions::default()),
                h.collab.clone(),
            )
            .unwrap()
            .with_rng(StdRng::seed_from_u64(seed));
            engine.start(&StartParams::default()).unwrap();
            if engine.state().unwrap().target.as_ref().map(|t| t.id.as_str()) == Some("kotka") {
                hits += 1;
            }
        }
        // 50 against 3 x 10 in weight; uniform would be about 25 hits
        assert!(hits > 45, "kotka picked {hits} times");
    }
}
