// Adapters layer: concrete implementations for external systems (stores, AI, file system).

pub mod bandcamp;
pub mod beatport;
pub mod gemini;
pub mod http;
pub mod json_fields;
pub mod storage;

use crate::domain::model::StoreKind;
use crate::domain::ports::AlbumSource;
use crate::utils::error::{RenamerError, Result};
use scraper::Selector;

pub use bandcamp::BandcampSource;
pub use beatport::BeatportSource;
pub use gemini::GeminiClient;
pub use http::HttpFetcher;
pub use storage::LocalStorage;

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| RenamerError::scrape(format!("invalid selector '{}': {:?}", css, e)))
}

/// Beatport URLs go to the Beatport parser, everything else is treated as Bandcamp.
pub fn store_for_url(url: &str) -> StoreKind {
    if url.to_lowercase().contains("beatport.com") {
        StoreKind::Beatport
    } else {
        StoreKind::Bandcamp
    }
}

pub fn source_for_url(url: &str, fetcher: HttpFetcher) -> Box<dyn AlbumSource> {
    match store_for_url(url) {
        StoreKind::Beatport => Box::new(BeatportSource::new(fetcher)),
        StoreKind::Bandcamp => Box::new(BandcampSource::new(fetcher)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_for_url() {
        assert_eq!(
            store_for_url("https://www.Beatport.com/release/x/1"),
            StoreKind::Beatport
        );
        assert_eq!(
            store_for_url("https://artist.bandcamp.com/album/x"),
            StoreKind::Bandcamp
        );
        assert_eq!(store_for_url("https://example.com/x"), StoreKind::Bandcamp);
    }
}
