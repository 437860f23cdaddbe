// Library surface for the binary, headless tests and other front ends.
// Nothing here touches the terminal except `runtime`.
pub mod achievements;
pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod games;
pub mod item;
pub mod logging;
pub mod playback;
pub mod progress;
pub mod runtime;
pub mod scheduler;
pub mod select;
pub mod session;
pub mod testing;
pub mod translit;

pub use engine::{Collaborators, Game, GameRegistry, GameSession, RenderSurface, SessionEngine, StartParams};
pub use error::{Error, Result};
