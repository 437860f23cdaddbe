use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::achievements::{self, Achievement, CompletedSession};
use crate::audio::{AudioEngine, Feedback};
use crate::error::{ConfigurationError, Error, Result};
use crate::item::{Item, ItemPool};
use crate::progress::ProgressStore;
use crate::scheduler::Scheduler;
use crate::select::{self, ItemWeighting};
use crate::session::{RetryPolicy, SessionConfig, SessionOutcome, SessionState};

/// Where a session shows itself. A pure sink; answers come back through
/// [`GameSession::choose`].
pub trait RenderSurface {
    /// `round` is 1-based
    fn show_round(&mut self, round: usize, total: usize);
    fn show_options(&mut self, prompt: &str, options: &[Item]);
    fn mark_correct(&mut self, item_id: &str);
    fn mark_incorrect(&mut self, item_id: &str);
    fn show_results(&mut self, stars: u8);
    fn show_achievements(&mut self, unlocked: &[&'static Achievement]);
    /// Secondary line of text, e.g. a partly assembled word
    fn show_status(&mut self, _text: &str) {}
}

/// Everything a session talks to besides its game.
///
/// Shared between all registered games; a borrow is never held across a
/// call into a game hook.
#[derive(Clone)]
pub struct Collaborators {
    pub pool: Rc<ItemPool>,
    pub audio: Rc<RefCell<AudioEngine>>,
    pub store: Rc<RefCell<dyn ProgressStore>>,
    pub surface: Rc<RefCell<dyn RenderSurface>>,
}

/// Arguments forwarded to [`Game::on_start`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartParams {
    /// Game specific focus, e.g. the letter to practise
    pub target: Option<String>,
}

impl StartParams {
    pub fn target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }
}

/// Returned by [`Game::on_correct`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundProgress {
    /// The round is done; advance after the presentation delay
    Complete,
    /// More answers are needed in this round (slot-level games)
    Continue,
}

/// The view of a running session handed to game hooks
pub struct SessionContext<'a> {
    game_type: &'static str,
    config: &'a SessionConfig,
    state: &'a mut SessionState,
    rng: &'a mut StdRng,
    collab: &'a Collaborators,
}

impl<'a> SessionContext<'a> {
    pub fn game_type(&self) -> &'static str {
        self.game_type
    }

    /// 0-indexed
    pub fn round(&self) -> usize {
        self.state.current_round
    }

    pub fn total_rounds(&self) -> usize {
        self.config.total_rounds
    }

    pub fn choice_count(&self) -> usize {
        self.config.choice_count
    }

    pub fn mistakes(&self) -> u32 {
        self.state.mistakes
    }

    pub fn target(&self) -> Option<&Item> {
        self.state.target.as_ref()
    }

    /// Set the round's target directly, for items not drawn from a pool
    pub fn set_target(&mut self, item: Item) {
        self.state.target = Some(item);
    }

    pub fn pool(&self) -> &ItemPool {
        &self.collab.pool
    }

    pub fn audio(&self) -> RefMut<'_, AudioEngine> {
        self.collab.audio.borrow_mut()
    }

    pub fn store(&self) -> RefMut<'_, dyn ProgressStore> {
        self.collab.store.borrow_mut()
    }

    pub fn surface(&self) -> RefMut<'_, dyn RenderSurface> {
        self.collab.surface.borrow_mut()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    /// Pick the round's target uniformly, avoiding recently used items
    pub fn select_item(&mut self, pool: &[Item]) -> Option<Item> {
        self.select(pool, |_| true, None)
    }

    pub fn select_item_where(
        &mut self,
        pool: &[Item],
        filter: impl Fn(&Item) -> bool,
    ) -> Option<Item> {
        self.select(pool, filter, None)
    }

    pub fn select_item_weighted(
        &mut self,
        pool: &[Item],
        weighting: &dyn ItemWeighting,
    ) -> Option<Item> {
        self.select(pool, |_| true, Some(weighting))
    }

    /// Filter, drop recently used ids, pick, then remember the pick.
    ///
    /// When every filtered item was used recently the history restarts,
    /// still skipping the previous pick unless it is the only candidate.
    fn select(
        &mut self,
        pool: &[Item],
        filter: impl Fn(&Item) -> bool,
        weighting: Option<&dyn ItemWeighting>,
    ) -> Option<Item> {
        let filtered: Vec<&Item> = pool.iter().filter(|&i| filter(i)).collect();
        if filtered.is_empty() {
            return None;
        }

        let recent = &self.state.recently_used;
        let mut available: Vec<&Item> = filtered
            .iter()
            .copied()
            .filter(|i| !recent.contains(&i.id))
            .collect();
        if available.is_empty() {
            let previous = self.state.recently_used.last().cloned();
            self.state.recently_used.clear();
            available = filtered
                .iter()
                .copied()
                .filter(|i| filtered.len() == 1 || previous.as_ref() != Some(&i.id))
                .collect();
            debug!(game = self.game_type, "item history exhausted, restarting");
        }

        let picked = match weighting {
            Some(weighting) => {
                let candidates: Vec<(&Item, u32)> = available
                    .iter()
                    .map(|&i| (i, weighting.weight(i)))
                    .collect();
                select::weighted_pick(&candidates, &mut *self.rng).copied()
            }
            None => select::pick_one(&available, &mut *self.rng).copied(),
        }?
        .clone();

        self.state.recently_used.push(picked.id.clone());
        self.collab
            .store
            .borrow_mut()
            .record_shown(self.game_type, &picked.id);
        self.state.target = Some(picked.clone());
        Some(picked)
    }

    /// Up to `count` items other than the target. Returns fewer when the
    /// pool is too small.
    pub fn get_distractors(
        &mut self,
        pool: &[Item],
        count: usize,
        filter: impl Fn(&Item) -> bool,
    ) -> Vec<Item> {
        let current = self.state.target.as_ref().map(|t| t.id.as_str());
        let candidates: Vec<&Item> = pool
            .iter()
            .filter(|&i| Some(i.id.as_str()) != current && filter(i))
            .collect();
        select::pick_n(&candidates, count, &mut *self.rng)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The target plus `choice_count - 1` distractors, shuffled
    pub fn create_options(
        &mut self,
        pool: &[Item],
        filter: impl Fn(&Item) -> bool,
    ) -> Vec<Item> {
        let Some(target) = self.state.target.clone() else {
            return Vec::new();
        };
        let wanted = self.config.choice_count.saturating_sub(1);
        let mut options = self.get_distractors(pool, wanted, filter);
        options.push(target);
        select::shuffle(&options, &mut *self.rng)
    }

    /// Show the options and accept them as answers for this round
    pub fn present(&mut self, prompt: &str, options: Vec<Item>) {
        self.collab
            .surface
            .borrow_mut()
            .show_options(prompt, &options);
        self.state.options = options;
    }
}

/// Hooks a concrete game fills in. The engine owns the round loop.
pub trait Game {
    fn game_type(&self) -> &'static str;

    /// The configuration the game wants before its first start
    fn session_config(&self) -> SessionConfig;

    /// Id used for the title clip played when a session starts
    fn title_id(&self) -> Option<&'static str> {
        None
    }

    fn on_start(&mut self, _params: &StartParams, _ctx: &mut SessionContext<'_>) {}

    /// Must set a target, normally through one of the `select_item*` calls
    fn on_load_round(&mut self, ctx: &mut SessionContext<'_>);

    fn judge(&self, choice: &Item, ctx: &SessionContext<'_>) -> bool {
        ctx.target().is_some_and(|t| t.id == choice.id)
    }

    fn on_correct(&mut self, _choice: &Item, _ctx: &mut SessionContext<'_>) -> RoundProgress {
        RoundProgress::Complete
    }

    fn on_incorrect(&mut self, _choice: &Item, _ctx: &mut SessionContext<'_>) {}

    fn on_show_results(&mut self, _stars: u8, _ctx: &mut SessionContext<'_>) {}

    /// Replay the round's prompt sound
    fn on_repeat(&mut self, _ctx: &mut SessionContext<'_>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    NextRound,
    EvaluateAchievements { stars: u8 },
}

/// Generic round-based session driven by a [`Game`]
pub struct SessionEngine<G: Game> {
    game: G,
    config: Option<SessionConfig>,
    state: Option<SessionState>,
    collab: Collaborators,
    scheduler: Scheduler<Continuation>,
    rng: StdRng,
    outcome: Option<SessionOutcome>,
}

impl<G: Game> SessionEngine<G> {
    /// An engine with no configuration yet
    pub fn new(game: G, collab: Collaborators) -> Self {
        Self {
            game,
            config: None,
            state: None,
            collab,
            scheduler: Scheduler::new(),
            rng: StdRng::from_entropy(),
            outcome: None,
        }
    }

    /// An engine configured with the game's own [`Game::session_config`]
    pub fn for_game(game: G, collab: Collaborators) -> Result<Self> {
        let config = game.session_config();
        let mut engine = Self::new(game, collab);
        engine.configure(config)?;
        Ok(engine)
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn configure(&mut self, config: SessionConfig) -> Result<()> {
        config.validate()?;
        debug!(game = self.game.game_type(), ?config, "configured");
        self.config = Some(config);
        Ok(())
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_accepting_input(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.accepting_input)
    }

    pub fn is_halted(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.halted)
    }

    pub fn pending_continuations(&self) -> usize {
        self.scheduler.pending_len()
    }

    /// Begin a new session, abandoning any session in progress without
    /// recording it.
    pub fn start(&mut self, params: &StartParams) -> Result<()> {
        if self.config.is_none() {
            return Err(ConfigurationError::NotConfigured.into());
        }
        let game_type = self.game.game_type();

        // An earlier session's achievements still count; its rounds do not
        self.flush_achievements();
        let dropped = self.scheduler.cancel_all();
        if self.state.take().is_some() {
            info!(game = game_type, dropped, "abandoning session in progress");
        }
        self.outcome = None;

        {
            let mut audio = self.collab.audio.borrow_mut();
            audio.stop();
            if let Some(title) = self.game.title_id() {
                audio.play_game_title(title);
            }
        }

        self.state = Some(SessionState::new());
        info!(game = game_type, target = ?params.target, "session started");
        self.with_context(|game, ctx| game.on_start(params, ctx));
        self.load_round();
        Ok(())
    }

    fn with_context<R>(
        &mut self,
        f: impl FnOnce(&mut G, &mut SessionContext<'_>) -> R,
    ) -> Option<R> {
        let game_type = self.game.game_type();
        let config = self.config.as_ref()?;
        let state = self.state.as_mut()?;
        let mut ctx = SessionContext {
            game_type,
            config,
            state,
            rng: &mut self.rng,
            collab: &self.collab,
        };
        Some(f(&mut self.game, &mut ctx))
    }

    fn load_round(&mut self) {
        let Some(total) = self.config.as_ref().map(|c| c.total_rounds) else {
            return;
        };
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.target = None;
        state.options.clear();
        state.accepting_input = false;
        let round = state.current_round + 1;

        self.collab.surface.borrow_mut().show_round(round, total);
        self.with_context(|game, ctx| game.on_load_round(ctx));

        let game_type = self.game.game_type();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.target.is_some() {
            state.accepting_input = true;
            debug!(game = game_type, round, "round loaded");
        } else {
            let err = Error::MissingContent(format!("{game_type} round {round} has no target"));
            error!(game = game_type, round, error = %err, "halting session");
            state.halted = true;
        }
    }

    /// The learner picked one of the presented options
    pub fn choose(&mut self, item_id: &str) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if !state.accepting_input {
            debug!(item = item_id, "input ignored");
            return;
        }
        let Some(choice) = state.option(item_id).cloned() else {
            debug!(item = item_id, "not an offered option");
            return;
        };
        let correct = self
            .with_context(|game, ctx| game.judge(&choice, ctx))
            .unwrap_or(false);
        if correct {
            self.handle_correct(&choice);
        } else {
            self.handle_incorrect(&choice);
        }
    }

    /// No-op while input is not accepted.
    ///
    /// The game's clip goes out before the praise. The target is credited
    /// once per finished round, not once per filled slot.
    pub fn handle_correct(&mut self, item: &Item) {
        if !self.is_accepting_input() {
            return;
        }
        let game_type = self.game.game_type();
        let target_id = self
            .state
            .as_ref()
            .and_then(|s| s.target.as_ref())
            .map_or_else(|| item.id.clone(), |t| t.id.clone());
        self.collab.surface.borrow_mut().mark_correct(&item.id);

        let progress = self
            .with_context(|game, ctx| game.on_correct(item, ctx))
            .unwrap_or(RoundProgress::Complete);
        self.collab
            .audio
            .borrow_mut()
            .play_feedback(Feedback::Correct);
        if progress == RoundProgress::Complete {
            self.collab
                .store
                .borrow_mut()
                .record_correct(game_type, &target_id);
            self.finish_round();
        }
    }

    /// Counts a mistake; the round only advances under [`RetryPolicy::OneShot`]
    pub fn handle_incorrect(&mut self, item: &Item) {
        if !self.is_accepting_input() {
            return;
        }
        let game_type = self.game.game_type();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.mistakes += 1;
        let target_id = state
            .target
            .as_ref()
            .map_or_else(|| item.id.clone(), |t| t.id.clone());

        self.collab.surface.borrow_mut().mark_incorrect(&item.id);
        self.collab
            .audio
            .borrow_mut()
            .play_feedback(Feedback::Incorrect);
        self.collab
            .store
            .borrow_mut()
            .record_mistake(game_type, &target_id);

        self.with_context(|game, ctx| game.on_incorrect(item, ctx));
        if self.config.as_ref().map(|c| c.retry) == Some(RetryPolicy::OneShot) {
            self.finish_round();
        }
    }

    fn finish_round(&mut self) {
        let Some(delay) = self.config.as_ref().map(|c| c.advance_delay) else {
            return;
        };
        if let Some(state) = self.state.as_mut() {
            state.accepting_input = false;
            self.scheduler.schedule(delay, Continuation::NextRound);
        }
    }

    /// Replay the current prompt, if a round is live
    pub fn repeat(&mut self) {
        if self.is_halted() {
            return;
        }
        self.with_context(|game, ctx| game.on_repeat(ctx));
    }

    /// Advance the session clock, running whatever became due
    pub fn tick(&mut self, dt: Duration) {
        for task in self.scheduler.advance(dt) {
            self.run(task);
        }
    }

    fn run(&mut self, task: Continuation) {
        match task {
            Continuation::NextRound => self.next_round(),
            Continuation::EvaluateAchievements { stars } => self.evaluate_achievements(stars),
        }
    }

    fn next_round(&mut self) {
        let Some(total) = self.config.as_ref().map(|c| c.total_rounds) else {
            return;
        };
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.current_round += 1;
        if state.current_round >= total {
            self.show_results();
        } else {
            self.load_round();
        }
    }

    fn show_results(&mut self) {
        let game_type = self.game.game_type();
        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.as_mut()) else {
            return;
        };
        state.accepting_input = false;
        let stars = config.thresholds.stars(state.mistakes);
        let outcome = SessionOutcome {
            stars,
            mistakes: state.mistakes,
            rounds: config.total_rounds,
        };
        let delay = config.achievement_delay;

        self.collab.surface.borrow_mut().show_results(stars);
        self.with_context(|game, ctx| game.on_show_results(stars, ctx));
        self.collab.store.borrow_mut().record_game_played(game_type);
        self.scheduler
            .schedule(delay, Continuation::EvaluateAchievements { stars });

        info!(
            game = game_type,
            stars = outcome.stars,
            mistakes = outcome.mistakes,
            "session complete"
        );
        self.outcome = Some(outcome);
        self.state = None;
    }

    fn evaluate_achievements(&mut self, stars: u8) {
        let session = CompletedSession {
            game_type: self.game.game_type(),
            stars,
            total_letters: self.collab.pool.letters().len(),
        };
        let unlocked = achievements::award(&mut *self.collab.store.borrow_mut(), &session);
        if !unlocked.is_empty() {
            self.collab
                .surface
                .borrow_mut()
                .show_achievements(&unlocked);
        }
    }

    /// Run a finished session's pending achievement evaluation now
    pub fn flush_achievements(&mut self) {
        let pending = self
            .scheduler
            .take_matching(|t| matches!(t, Continuation::EvaluateAchievements { .. }));
        for task in pending {
            self.run(task);
        }
    }

    /// Drop the session and its pending rounds. A finished session is
    /// still evaluated for achievements.
    pub fn reset(&mut self) {
        self.flush_achievements();
        self.scheduler.cancel_all();
        self.state = None;
        self.outcome = None;
        self.collab.audio.borrow_mut().stop();
    }
}

/// Object-safe view of a [`SessionEngine`], for holding different games
/// side by side
pub trait GameSession {
    fn game_type(&self) -> &'static str;
    fn start(&mut self, params: &StartParams) -> Result<()>;
    fn choose(&mut self, item_id: &str);
    fn repeat(&mut self);
    fn tick(&mut self, dt: Duration);
    fn reset(&mut self);
    fn flush_achievements(&mut self);
    fn is_active(&self) -> bool;
    fn is_accepting_input(&self) -> bool;
    fn is_halted(&self) -> bool;
    fn state(&self) -> Option<&SessionState>;
    fn outcome(&self) -> Option<SessionOutcome>;
}

impl<G: Game> GameSession for SessionEngine<G> {
    fn game_type(&self) -> &'static str {
        self.game.game_type()
    }

    fn start(&mut self, params: &StartParams) -> Result<()> {
        SessionEngine::start(self, params)
    }

    fn choose(&mut self, item_id: &str) {
        SessionEngine::choose(self, item_id)
    }

    fn repeat(&mut self) {
        SessionEngine::repeat(self)
    }

    fn tick(&mut self, dt: Duration) {
        SessionEngine::tick(self, dt)
    }

    fn reset(&mut self) {
        SessionEngine::reset(self)
    }

    fn flush_achievements(&mut self) {
        SessionEngine::flush_achievements(self)
    }

    fn is_active(&self) -> bool {
        SessionEngine::is_active(self)
    }

    fn is_accepting_input(&self) -> bool {
        SessionEngine::is_accepting_input(self)
    }

    fn is_halted(&self) -> bool {
        SessionEngine::is_halted(self)
    }

    fn state(&self) -> Option<&SessionState> {
        SessionEngine::state(self)
    }

    fn outcome(&self) -> Option<SessionOutcome> {
        SessionEngine::outcome(self)
    }
}

/// Games available to the front end, by name
#[derive(Default)]
pub struct GameRegistry {
    games: Vec<Box<dyn GameSession>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game, replacing any registered under the same name
    pub fn register(&mut self, game: Box<dyn GameSession>) {
        let name = game.game_type();
        self.games.retain(|g| g.game_type() != name);
        self.games.push(game);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.games.iter().map(|g| g.game_type()).collect()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn GameSession + 'static)> {
        self.games
            .iter_mut()
            .find(|g| g.game_type() == name)
            .map(|g| g.as_mut())
    }

    /// Evaluate every finished session still waiting on its delay
    pub fn flush_achievements(&mut self) {
        for game in self.games.iter_mut() {
            game.flush_achievements();
        }
    }

    /// Start the named game; any other game's session is reset first
    pub fn start(
        &mut self,
        name: &str,
        params: &StartParams,
    ) -> Result<&mut (dyn GameSession + 'static)> {
        if !self.games.iter().any(|g| g.game_type() == name) {
            return Err(ConfigurationError::UnknownGame(name.to_string()).into());
        }
        for game in self.games.iter_mut().filter(|g| g.game_type() != name) {
            game.flush_achievements();
            if game.is_active() {
                game.reset();
            }
        }
        let game = self
            .get_mut(name)
            .ok_or_else(|| ConfigurationError::UnknownGame(name.to_string()))?;
        game.start(params)?;
        Ok(game)
    }
}
