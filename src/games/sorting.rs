use rand::seq::SliceRandom;

use super::{GameOptions, SORTING};
use crate::audio::{letter_sound_ref, SpeechParams};
use crate::engine::{Game, SessionContext, StartParams};
use crate::item::Item;
use crate::session::{RetryPolicy, SessionConfig, StarThresholds};

const ROUNDS: usize = 10;
const PER_KIND: usize = ROUNDS / 2;
const THRESHOLDS: StarThresholds = StarThresholds::new(0, 3);

const VOWEL: &str = "vowel";
const CONSONANT: &str = "consonant";

fn answer(kind: &str, label: &str, phrase: &str) -> Item {
    Item::new(kind, label, phrase).with_category(kind)
}

/// "Vowels and consonants": classify each letter, one try per letter
pub struct SortingGame {
    options: GameOptions,
    deck: Vec<Item>,
    answers: [Item; 2],
}

impl SortingGame {
    pub fn new(options: GameOptions) -> Self {
        Self {
            options,
            deck: Vec::new(),
            answers: [
                answer(VOWEL, "Гласна", "phrase_glasna.mp3"),
                answer(CONSONANT, "Съгласна", "phrase_saglasna.mp3"),
            ],
        }
    }

    pub fn deck(&self) -> &[Item] {
        &self.deck
    }
}

fn letter_item(letter: &str, kind: &str) -> Item {
    Item::new(format!("letter-{letter}"), letter, letter_sound_ref(letter)).with_category(kind)
}

impl Game for SortingGame {
    fn game_type(&self) -> &'static str {
        SORTING
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new(ROUNDS, self.answers.len(), THRESHOLDS)
            .with_retry(RetryPolicy::OneShot)
            .with_delays(self.options.advance_delay, self.options.achievement_delay)
    }

    fn title_id(&self) -> Option<&'static str> {
        Some("glasni-saglasni")
    }

    /// Deal an even mix of vowels and consonants
    fn on_start(&mut self, _params: &StartParams, ctx: &mut SessionContext<'_>) {
        let vowels = ctx.pool().vowels.clone();
        let consonants = ctx.pool().consonants.clone();
        let rng = ctx.rng();
        let mut deck: Vec<Item> = vowels
            .choose_multiple(rng, PER_KIND)
            .map(|l| letter_item(l, VOWEL))
            .collect();
        deck.extend(
            consonants
                .choose_multiple(rng, PER_KIND)
                .map(|l| letter_item(l, CONSONANT)),
        );
        deck.shuffle(rng);
        self.deck = deck;

        let mut audio = ctx.audio();
        for a in &self.answers {
            audio.register_speech_text(a.audio_ref.clone(), a.display_text.clone(), SpeechParams::NORMAL);
        }
    }

    fn on_load_round(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(letter) = ctx.select_item(&self.deck) else {
            return;
        };
        ctx.present(&letter.display_text, self.answers.to_vec());
        ctx.audio().play_letter(&letter.display_text, true);
    }

    fn judge(&self, choice: &Item, ctx: &SessionContext<'_>) -> bool {
        ctx.target()
            .is_some_and(|t| t.category.is_some() && t.category == choice.category)
    }

    fn on_incorrect(&mut self, _choice: &Item, ctx: &mut SessionContext<'_>) {
        let Some(kind) = ctx.target().and_then(|t| t.category.clone()) else {
            return;
        };
        if let Some(right) = self.answers.iter().find(|a| a.in_category(&kind)) {
            ctx.audio().play_game_clip(&right.audio_ref, false);
        }
    }

    fn on_repeat(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(letter) = ctx.target().map(|t| t.display_text.clone()) else {
            return;
        };
        ctx.audio().play_letter(&letter, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SessionEngine;
    use crate::testing::Harness;
    use crate::translit::is_vowel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;

    fn engine(h: &Harness) -> SessionEngine<SortingGame> {
        SessionEngine::for_game(SortingGame::new(GameOptions::default()), h.collab.clone())
            .unwrap()
            .with_rng(StdRng::seed_from_u64(2))
    }

    fn right_answer(engine: &SessionEngine<SortingGame>) -> &'static str {
        let target = engine.state().unwrap().target.as_ref().unwrap();
        if is_vowel(&target.display_text) {
            VOWEL
        } else {
            CONSONANT
        }
    }

    fn wrong_answer(engine: &SessionEngine<SortingGame>) -> &'static str {
        if right_answer(engine) == VOWEL {
            CONSONANT
        } else {
            VOWEL
        }
    }

    #[test]
    fn test_deck_is_balanced() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        let deck = engine.game().deck();
        assert_eq!(deck.len(), ROUNDS);
        assert_eq!(deck.iter().filter(|i| i.in_category(VOWEL)).count(), PER_KIND);
        let ids: HashSet<_> = deck.iter().map(|i| &i.id).collect();
        assert_eq!(ids.len(), ROUNDS);
    }

    #[test]
    fn test_every_letter_once_and_perfect_score() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        let mut seen = HashSet::new();
        for _ in 0..ROUNDS {
            seen.insert(engine.state().unwrap().target.clone().unwrap().id);
            let answer = right_answer(&engine);
            engine.choose(answer);
            engine.tick(Duration::from_millis(2300));
        }
        assert_eq!(seen.len(), ROUNDS);
        assert_eq!(engine.outcome().map(|o| o.stars), Some(3));
    }

    #[test]
    fn test_mistake_moves_on_and_names_the_answer() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        let expected = if right_answer(&engine) == VOWEL {
            "phrase_glasna.mp3"
        } else {
            "phrase_saglasna.mp3"
        };
        let wrong = wrong_answer(&engine);
        engine.choose(wrong);
        assert!(!engine.is_accepting_input());
        assert!(h
            .collab
            .audio
            .borrow()
            .queued()
            .any(|r| r.sound_ref == expected && r.base_path == "audio/games/"));

        engine.tick(Duration::from_millis(2300));
        assert_eq!(engine.state().unwrap().current_round, 1);
        assert_eq!(engine.state().unwrap().mistakes, 1);
    }

    #[test]
    fn test_four_mistakes_is_one_star() {
        let h = Harness::embedded().unwrap();
        let mut engine = engine(&h);
        engine.start(&StartParams::default()).unwrap();
        for round in 0..ROUNDS {
            let answer = if round < 4 {
                wrong_answer(&engine)
            } else {
                right_answer(&engine)
            };
            engine.choose(answer);
            engine.tick(Duration::from_millis(2300));
        }
        assert_eq!(engine.outcome().map(|o| (o.stars, o.mistakes)), Some((1, 4)));
    }
}
