use crate::adapters::http::HttpFetcher;
use crate::adapters::selector;
use crate::domain::model::{AlbumData, AlbumTrack, StoreKind};
use crate::domain::ports::AlbumSource;
use crate::utils::error::{RenamerError, Result};
use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;

/// `data-tralbum` payload embedded in every Bandcamp album and track page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BandcampAlbum {
    artist: Option<String>,
    trackinfo: Vec<BandcampTrack>,
    current: BandcampCurrent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BandcampCurrent {
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BandcampTrack {
    title: Option<String>,
    artist: Option<String>,
    track_num: Option<i64>,
}

pub fn parse_bandcamp_page(html: &str) -> Result<AlbumData> {
    let document = Html::parse_document(html);
    let data = document
        .select(&selector("script[data-tralbum]")?)
        .next()
        .and_then(|el| el.value().attr("data-tralbum"))
        .unwrap_or_default();
    if data.is_empty() {
        return Err(RenamerError::scrape("could not find album data on page"));
    }

    let album: BandcampAlbum = serde_json::from_str(data).map_err(|e| {
        RenamerError::scrape(format!("failed to unmarshal album data: {}", e))
    })?;

    let tracks = album
        .trackinfo
        .into_iter()
        .map(|track| AlbumTrack {
            title: track.title.unwrap_or_default(),
            artist: track.artist.unwrap_or_default(),
            track_num: track.track_num.unwrap_or(0),
            track_num_explicit: true,
            track_id: 0,
        })
        .collect();

    Ok(AlbumData {
        artist: album.artist.unwrap_or_default(),
        title: album.current.title.unwrap_or_default(),
        tracks,
        source: StoreKind::Bandcamp,
    })
}

pub struct BandcampSource {
    fetcher: HttpFetcher,
}

impl BandcampSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl AlbumSource for BandcampSource {
    async fn fetch_album(&self, url: &str) -> Result<AlbumData> {
        let html = self.fetcher.get_html(url).await?;
        let album = parse_bandcamp_page(&html)?;
        tracing::info!(
            "💿 Bandcamp: '{}' by '{}' with {} track(s)",
            album.title,
            album.artist,
            album.tracks.len()
        );
        Ok(album)
    }
}
