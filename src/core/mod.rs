pub mod matcher;
pub mod normalize;
pub mod renamer;
pub mod scanner;
pub mod template;

pub use crate::domain::model::{AlbumData, AlbumTrack, LocalTrack, MatchedTrack, ParsedTrack};
pub use crate::domain::ports::{AlbumSource, ConfigProvider, Storage};
pub use crate::utils::error::Result;
