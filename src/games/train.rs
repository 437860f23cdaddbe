use itertools::Itertools;
use rand::seq::SliceRandom;

use super::{GameOptions, TRAIN};
use crate::engine::{Game, RoundProgress, SessionContext, StartParams};
use crate::item::Item;
use crate::select;
use crate::session::{SessionConfig, StarThresholds};

const ROUNDS: usize = 5;
const THRESHOLDS: StarThresholds = StarThresholds::new(0, 3);
const CARDS: usize = 6;
const MAX_EXTRA_CARDS: usize = 3;

/// "Sound train": put a word's syllables into the wagons in order.
///
/// A round is one word. Each correct card fills the next wagon; a wrong
/// card costs a mistake but the same wagon stays open.
pub struct TrainGame {
    options: GameOptions,
    words: Vec<Item>,
    filled: usize,
    cards: Vec<Item>,
}

impl TrainGame {
    pub fn new(options: GameOptions) -> Self {
        Self {
            options,
            words: Vec::new(),
            filled: 0,
            cards: Vec::new(),
        }
    }

    /// Wagons filled so far in the current word
    pub fn filled(&self) -> usize {
        self.filled
    }

    fn expected<'a>(&self, word: &'a Item) -> Option<&'a str> {
        word.syllables.get(self.filled).map(String::as_str)
    }

    fn progress(&self, word: &Item) -> String {
        word.syllables
            .iter()
            .enumerate()
            .map(|(i, s)| if i < self.filled { s.as_str() } else { "_" })
            .join("-")
    }

    fn prompt(word: &Item) -> String {
        let syllables = word.syllables.join("-");
        match &word.emoji {
            Some(emoji) => format!("{emoji} {syllables}"),
            None => syllables,
        }
    }
}

fn card(syllable: &str) -> Item {
    Item::new(syllable, syllable, "")
}

impl Game for TrainGame {
    fn game_type(&self) -> &'static str {
        TRAIN
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new(ROUNDS, CARDS, THRESHOLDS)
            .with_delays(self.options.advance_delay, self.options.achievement_delay)
    }

    fn title_id(&self) -> Option<&'static str> {
        Some("zvukov-vlak")
    }

    fn on_start(&mut self, _params: &StartParams, ctx: &mut SessionContext<'_>) {
        self.words = ctx
            .pool()
            .tagged(TRAIN)
            .into_iter()
            .filter(|w| !w.syllables.is_empty())
            .collect();
    }

    fn on_load_round(&mut self, ctx: &mut SessionContext<'_>) {
        self.filled = 0;
        let Some(word) = ctx.select_item(&self.words) else {
            return;
        };

        let extra = MAX_EXTRA_CARDS.min(CARDS.saturating_sub(word.syllables.len()));
        let spare: Vec<String> = ctx
            .pool()
            .distractor_syllables
            .iter()
            .filter(|s| !word.syllables.contains(s))
            .cloned()
            .collect();
        let mut cards: Vec<Item> = word.syllables.iter().map(|s| card(s)).collect();
        cards.extend(spare.choose_multiple(ctx.rng(), extra).map(|s| card(s)));
        self.cards = select::shuffle(&cards, ctx.rng());

        ctx.present(&Self::prompt(&word), self.cards.clone());
        ctx.audio().play_word(&word.display_text, false);
        let status = self.progress(&word);
        ctx.surface().show_status(&status);
    }

    fn judge(&self, choice: &Item, ctx: &SessionContext<'_>) -> bool {
        ctx.target()
            .and_then(|word| self.expected(word))
            .is_some_and(|s| s == choice.display_text)
    }

    fn on_correct(&mut self, choice: &Item, ctx: &mut SessionContext<'_>) -> RoundProgress {
        let Some(word) = ctx.target().cloned() else {
            return RoundProgress::Complete;
        };
        self.filled += 1;
        ctx.audio().play_syllable(&choice.display_text, false);
        let status = self.progress(&word);
        ctx.surface().show_status(&status);

        if self.filled >= word.syllables.len() {
            ctx.audio().play_word(&word.display_text, false);
            return RoundProgress::Complete;
        }

        // Only one card leaves the table when a word repeats a syllable
        if let Some(pos) = self.cards.iter().position(|c| c.id == choice.id) {
            self.cards.remove(pos);
        }
        ctx.present(&Self::prompt(&word), self.cards.clone());
        RoundProgress::Continue
    }

    fn on_repeat(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(word) = ctx.target().map(|t| t.display_text.clone()) else {
            return;
        };
        ctx.audio().play_word(&word, true);
    }
}
