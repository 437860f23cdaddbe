use std::time::Duration;

use bukvar::engine::{Game, SessionContext, SessionEngine, StartParams};
use bukvar::item::Item;
use bukvar::session::{SessionConfig, StarThresholds};
use bukvar::testing::Harness;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Plain uniform picks over a fixed list
struct Picker {
    items: Vec<Item>,
    rounds: usize,
}

impl Game for Picker {
    fn game_type(&self) -> &'static str {
        "picker"
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.rounds, 2, StarThresholds::new(0, 1))
    }

    fn on_load_round(&mut self, ctx: &mut SessionContext<'_>) {
        let Some(target) = ctx.select_item(&self.items) else {
            return;
        };
        let options = ctx.create_options(&self.items, |_| true);
        ctx.present(&target.display_text, options);
    }
}

fn items(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| Item::new(format!("w{i}"), format!("дума {i}"), format!("w{i}.mp3")))
        .collect()
}

/// Target ids in round order for a perfect session
fn play(n: usize, rounds: usize, seed: u64) -> (Vec<String>, bool) {
    let h = Harness::embedded().unwrap();
    let game = Picker {
        items: items(n),
        rounds,
    };
    let mut engine = SessionEngine::for_game(game, h.collab.clone())
        .unwrap()
        .with_rng(StdRng::seed_from_u64(seed));
    engine.start(&StartParams::default()).unwrap();

    let mut picks = Vec::new();
    for _ in 0..rounds {
        if engine.is_halted() {
            return (picks, true);
        }
        let id = engine.state().unwrap().target.clone().unwrap().id;
        engine.choose(&id);
        engine.tick(Duration::from_millis(2300));
        picks.push(id);
    }
    (picks, engine.is_halted())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn no_item_comes_twice_in_a_row(n in 2usize..8, seed in any::<u64>()) {
        let (picks, _) = play(n, 3 * n, seed);
        for pair in picks.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
    }

    #[test]
    fn first_pass_covers_every_item(n in 2usize..8, seed in any::<u64>()) {
        let (picks, _) = play(n, n, seed);
        let mut unique = picks.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), n);
    }

    #[test]
    fn more_rounds_than_items_never_halts(n in 1usize..6, extra in 1usize..6, seed in any::<u64>()) {
        let (picks, halted) = play(n, n + extra, seed);
        prop_assert!(!halted);
        prop_assert_eq!(picks.len(), n + extra);
    }
}
