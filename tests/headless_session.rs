use std::sync::mpsc;
use std::time::Duration;

use bukvar::engine::StartParams;
use bukvar::games::{self, GameOptions};
use bukvar::runtime::{AppEvent, ChannelEventSource, Runner};
use bukvar::testing::Harness;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// Drives a whole vocab session through the runtime event loop without a TTY.
// Digit keys pick options; ticks advance the session clock.
#[test]
fn headless_vocab_session_completes() {
    let h = Harness::embedded().unwrap();
    let options = GameOptions {
        seed: Some(7),
        ..GameOptions::default()
    };
    let mut registry = games::registry(&h.collab, &options).unwrap();
    registry.start(games::VOCAB, &StartParams::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(5));
    // Each real tick stands for half a second of session time
    let step = Duration::from_millis(500);

    for _ in 0..2000u32 {
        let session = registry.get_mut(games::VOCAB).unwrap();
        if !session.is_active() {
            break;
        }
        // Answer as soon as a round accepts input
        if session.is_accepting_input() {
            let state = session.state().unwrap();
            let target = state.target.as_ref().unwrap();
            let index = state.options.iter().position(|o| o.id == target.id).unwrap();
            let key = char::from_digit(index as u32 + 1, 10).unwrap();
            tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Char(key), KeyModifiers::NONE)))
                .unwrap();
        }

        match runner.step() {
            AppEvent::Tick => session.tick(step),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    let index = c.to_digit(10).unwrap() as usize - 1;
                    let id = session.state().unwrap().options[index].id.clone();
                    session.choose(&id);
                }
            }
        }
    }

    let session = registry.get_mut(games::VOCAB).unwrap();
    assert!(!session.is_active());
    assert_eq!(session.outcome().map(|o| o.stars), Some(3));
    assert_eq!(h.surface.borrow().results(), vec![3]);
}

#[test]
fn headless_wrong_key_counts_a_mistake() {
    let h = Harness::embedded().unwrap();
    let mut registry = games::registry(&h.collab, &GameOptions::default()).unwrap();
    let session = registry.start(games::VOCAB, &StartParams::default()).unwrap();

    let state = session.state().unwrap();
    let target = state.target.clone().unwrap();
    let wrong = state.options.iter().find(|o| o.id != target.id).unwrap().id.clone();
    session.choose(&wrong);

    assert_eq!(session.state().unwrap().mistakes, 1);
    assert!(session.is_accepting_input());
    assert!(h.surface.borrow().events.iter().any(|e| matches!(
        e,
        bukvar::testing::SurfaceEvent::Incorrect(id) if *id == wrong
    )));
}
