pub mod activity;
pub mod burndown;
pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod paths;
pub mod retro;
pub mod scrum;
pub mod sprint;
pub mod standup;
pub mod store;
pub mod story;
pub mod types;
pub mod validate;

pub use error::{Result, SprintError};
pub use store::{Backend, InMemory, JsonFiles, Record, Saved, Store};
