use std::time::Duration;

use crate::error::ConfigurationError;
use crate::item::Item;

pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(2300);
pub const DEFAULT_ACHIEVEMENT_DELAY: Duration = Duration::from_millis(1000);

/// Mistake counts for the 3 and 2 star tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarThresholds {
    pub perfect: u32,
    pub good: u32,
}

impl StarThresholds {
    pub const fn new(perfect: u32, good: u32) -> Self {
        Self { perfect, good }
    }

    /// Always 1..=3; there is no zero-star outcome
    pub fn stars(&self, mistakes: u32) -> u8 {
        if mistakes == self.perfect {
            3
        } else if mistakes <= self.good {
            2
        } else {
            1
        }
    }
}

/// What an incorrect answer does to the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Stay on the round until the correct answer is given
    #[default]
    RetryRound,
    /// Record the mistake and move on
    OneShot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub total_rounds: usize,
    pub choice_count: usize,
    pub thresholds: StarThresholds,
    pub retry: RetryPolicy,
    /// Pause between a finished round and the next one
    pub advance_delay: Duration,
    /// Pause between the results screen and achievement evaluation
    pub achievement_delay: Duration,
}

impl SessionConfig {
    pub fn new(total_rounds: usize, choice_count: usize, thresholds: StarThresholds) -> Self {
        Self {
            total_rounds,
            choice_count,
            thresholds,
            retry: RetryPolicy::default(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
            achievement_delay: DEFAULT_ACHIEVEMENT_DELAY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_delays(mut self, advance: Duration, achievements: Duration) -> Self {
        self.advance_delay = advance;
        self.achievement_delay = achievements;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.total_rounds == 0 {
            return Err(ConfigurationError::NoRounds);
        }
        if self.choice_count < 2 {
            return Err(ConfigurationError::TooFewChoices(self.choice_count));
        }
        let StarThresholds { perfect, good } = self.thresholds;
        if perfect >= good {
            return Err(ConfigurationError::ThresholdOrder { perfect, good });
        }
        Ok(())
    }
}

/// Mutable state of one running session. Discarded at results or restart.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// 0-indexed
    pub current_round: usize,
    pub mistakes: u32,
    pub recently_used: Vec<String>,
    pub target: Option<Item>,
    /// Options currently presented for the round
    pub options: Vec<Item>,
    pub accepting_input: bool,
    /// Set when a round failed to load; nothing more happens until restart
    pub halted: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            accepting_input: true,
            ..Self::default()
        }
    }

    pub fn option(&self, item_id: &str) -> Option<&Item> {
        self.options.iter().find(|o| o.id == item_id)
    }
}

/// Result of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub stars: u8,
    pub mistakes: u32,
    pub rounds: usize,
}
