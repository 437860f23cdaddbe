use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What the main loop reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived within one tick interval
    Tick,
}

pub trait EventSource: Send + 'static {
    /// Wait up to `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Event source fed from a channel, for tests and scripted runs
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Turns an event source into a steady stream of events and ticks.
///
/// The session engines have no clock of their own; the host advances them
/// by [`Runner::tick_interval`] on every [`AppEvent::Tick`].
pub struct Runner<E: EventSource> {
    events: E,
    tick: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(events: E, tick: Duration) -> Self {
        Self { events, tick }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    /// Blocks up to one tick and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.events.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));
        assert_matches!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE)))
            .unwrap();
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(10));

        assert_matches!(runner.step(), AppEvent::Resize);
        assert_matches!(runner.step(), AppEvent::Key(k) if k.code == KeyCode::Char('1'));
    }

    #[test]
    fn closed_channel_keeps_ticking() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));
        assert_matches!(runner.step(), AppEvent::Tick);
        assert_eq!(runner.tick_interval(), Duration::from_millis(1));
    }
}
