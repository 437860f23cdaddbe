use tracing::warn;

use super::{GameOptions, PHONICS};
use crate::engine::{Game, RoundProgress, SessionContext, StartParams};
use crate::item::Item;
use crate::session::{SessionConfig, StarThresholds};

const ROUNDS: usize = 3;
const THRESHOLDS: StarThresholds = StarThresholds::new(0, 1);

/// "Sound match": pick the picture whose word starts with the letter
pub struct PhonicsGame {
    options: GameOptions,
    letter: Option<String>,
}

impl PhonicsGame {
    pub fn new(options: GameOptions) -> Self {
        Self {
            options,
            letter: None,
        }
    }

    pub fn letter(&self) -> Option<&str> {
        self.letter.as_deref()
    }

    fn play_instruction(&self, ctx: &SessionContext<'_>, immediate: bool) {
        let Some(letter) = self.letter.as_deref() else {
            return;
        };
        let Some(entry) = ctx.pool().letter(letter) else {
            return;
        };
        let sound = entry.audio.clone();
        ctx.audio().play_phrase(&sound, immediate);
    }
}

impl Game for PhonicsGame {
    fn game_type(&self) -> &'static str {
        PHONICS
    }

    fn session_config(&self) -> SessionConfig {
        self.options.session(ROUNDS, THRESHOLDS)
    }

    fn on_start(&mut self, params: &StartParams, ctx: &mut SessionContext<'_>) {
        let letter = params
            .target
            .clone()
            .or_else(|| ctx.pool().letters().first().map(|l| l.letter.clone()));
        if let Some(letter) = &letter {
            if ctx.pool().letter(letter).is_none() {
                warn!(letter = %letter, "letter has no instruction entry");
            }
        }
        self.letter = letter;
    }

    fn on_load_round(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(letter) = self.letter.clone() else {
            return;
        };
        let words = ctx.pool().tagged(PHONICS);
        if ctx
            .select_item_where(&words, |w| w.in_category(&letter))
            .is_none()
        {
            return;
        }

        let allowed = &self.options.allowed_letters;
        let options = ctx.create_options(&words, |w| {
            !w.in_category(&letter)
                && (allowed.is_empty()
                    || w.category.as_ref().is_some_and(|c| allowed.contains(c)))
        });
        ctx.present(&letter, options);
        self.play_instruction(ctx, false);
    }

    fn on_correct(&mut self, choice: &Item, ctx: &mut SessionContext<'_>) -> RoundProgress {
        ctx.audio().play_word_clip(&choice.audio_ref, false);
        RoundProgress::Complete
    }

    fn on_incorrect(&mut self, choice: &Item, ctx: &mut SessionContext<'_>) {
        // Say the picked word so the child hears which sound it starts with
        ctx.audio().play_word_clip(&choice.audio_ref, false);
    }

    fn on_show_results(&mut self, stars: u8, ctx: &mut SessionContext<'_>) {
        if let Some(letter) = &self.letter {
            ctx.store().set_best_score(letter, stars);
        }
    }

    fn on_repeat(&mut self, ctx: &mut SessionContext<'_>) {
        self.play_instruction(ctx, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SessionEngine;
    use crate::progress::ProgressStore;
    use crate::testing::Harness;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn engine(h: &Harness, options: GameOptions) -> SessionEngine<PhonicsGame> {
        SessionEngine::for_game(PhonicsGame::new(options), h.collab.clone())
            .unwrap()
            .with_rng(StdRng::seed_from_u64(11))
    }

    fn target(engine: &SessionEngine<PhonicsGame>) -> Item {
        engine.state().unwrap().target.clone().unwrap()
    }

    #[test]
    fn test_target_starts_with_letter_and_distractors_do_not() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h, GameOptions::default());
        engine.start(&StartParams::target("Л")).unwrap();

        let state = engine.state().unwrap();
        assert!(target(&engine).in_category("Л"));
        assert_eq!(state.options.len(), 4);
        let others: Vec<_> = state
            .options
            .iter()
            .filter(|o| o.id != target(&engine).id)
            .collect();
        assert_eq!(others.len(), 3);
        assert!(others.iter().all(|o| !o.in_category("Л")));
        assert_eq!(h.surface.borrow().last_prompt(), Some("Л"));
        assert!(h.played.borrow().iter().any(|p| p.ends_with("instr_l.mp3")));
    }

    #[test]
    fn test_word_is_heard_before_praise() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h, GameOptions::default());
        engine.start(&StartParams::target("М")).unwrap();
        let word = target(&engine);
        engine.choose(&word.id);

        let audio = h.collab.audio.borrow();
        let queued: Vec<String> = audio.queued().map(|r| r.sound_ref.clone()).collect();
        let word_at = queued.iter().position(|r| *r == word.audio_ref).unwrap();
        let praise_at = queued.iter().position(|r| r == "bravo.mp3").unwrap();
        assert!(word_at < praise_at);
    }

    #[test]
    fn test_distractors_limited_to_allowed_letters() {
        let h = Harness::embedded().unwrap();
        let options = GameOptions {
            allowed_letters: vec!["А".to_string(), "Б".to_string()],
            ..GameOptions::default()
        };
        let mut engine = engine(&h, options);
        engine.start(&StartParams::target("М")).unwrap();
        let state = engine.state().unwrap();
        for option in state.options.iter().filter(|o| !o.in_category("М")) {
            assert!(option.in_category("А") || option.in_category("Б"));
        }
    }

    #[test]
    fn test_results_save_best_score_per_letter() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h, GameOptions::default());
        engine.start(&StartParams::target("Б")).unwrap();
        for round in 0..3 {
            if round == 0 {
                let wrong = engine
                    .state()
                    .unwrap()
                    .options
                    .iter()
                    .find(|o| !o.in_category("Б"))
                    .unwrap()
                    .id
                    .clone();
                engine.choose(&wrong);
            }
            let id = target(&engine).id;
            engine.choose(&id);
            engine.tick(Duration::from_millis(2300));
        }
        assert_eq!(engine.outcome().map(|o| o.stars), Some(2));
        assert_eq!(h.store.borrow().best_score("Б"), Some(2));

        // A worse session later leaves the best score alone
        engine.start(&StartParams::target("Б")).unwrap();
        for _ in 0..3 {
            let wrong: Vec<String> = engine
                .state()
                .unwrap()
                .options
                .iter()
                .filter(|o| !o.in_category("Б"))
                .map(|o| o.id.clone())
                .collect();
            for id in wrong {
                engine.choose(&id);
            }
            let id = target(&engine).id;
            engine.choose(&id);
            engine.tick(Duration::from_millis(2300));
        }
        assert_eq!(engine.outcome().map(|o| o.stars), Some(1));
        assert_eq!(h.store.borrow().best_score("Б"), Some(2));
    }

    #[test]
    fn test_defaults_to_first_letter() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h, GameOptions::default());
        engine.start(&StartParams::default()).unwrap();
        assert_eq!(engine.game().letter(), Some("А"));
    }

    #[test]
    fn test_letter_without_words_halts() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h, GameOptions::default());
        engine.start(&StartParams::target("Щ")).unwrap();
        assert!(engine.is_halted());
    }
}
