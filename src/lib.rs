pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{BandcampSource, BeatportSource, GeminiClient, HttpFetcher, LocalStorage};
pub use app::{App, Settings};
pub use config::TomlConfig;
pub use domain::model::{LocalTrack, MatchedTrack, NameFormat, ParsedTrack, RenamePlan, RenameSummary};
pub use utils::error::{RenamerError, Result};
