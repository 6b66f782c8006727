pub mod plan;

use crate::adapters::{self, GeminiClient, HttpFetcher, LocalStorage};
use crate::core::{matcher, renamer, scanner, template};
use crate::domain::model::{
    LocalTrack, MatchedTrack, NameFormat, ParsedTrack, RenamePlan, RenameSummary,
};
use crate::domain::ports::{AlbumSource, ConfigProvider};
use crate::utils::error::{RenamerError, Result};
use std::path::Path;

/// 合併設定檔與命令列後的最終設定
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub extensions: Vec<String>,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub ai_api_key: Option<String>,
    pub ai_endpoint: String,
    pub ai_model: String,
    pub name_format: NameFormat,
}

impl Settings {
    pub fn from_provider<C: ConfigProvider>(config: &C) -> Self {
        Self {
            extensions: config.extensions(),
            user_agent: config.user_agent().to_string(),
            timeout_seconds: config.timeout_seconds(),
            ai_api_key: config.ai_api_key().map(str::to_string),
            ai_endpoint: config.ai_endpoint().to_string(),
            ai_model: config.ai_model().to_string(),
            name_format: config.name_format(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_provider(&crate::config::TomlConfig::default())
    }
}

/// Entry point for the four workflows: scan, template, store match and AI parse.
pub struct App {
    settings: Settings,
    fetcher: HttpFetcher,
    storage: LocalStorage,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let fetcher = HttpFetcher::new(&settings.user_agent, settings.timeout_seconds)?;
        Ok(Self {
            settings,
            fetcher,
            storage: LocalStorage::new(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(Settings::from_provider(config))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scan_folder(&self, dir: &Path) -> Result<Vec<LocalTrack>> {
        tracing::debug!("Scanning {} for {:?}", dir.display(), self.settings.extensions);
        scanner::scan_folder(dir, &self.settings.extensions)
    }

    /// `format` 為 None 時使用設定檔的命名格式
    pub fn generate_template_renames(
        &self,
        locals: &[LocalTrack],
        format: Option<NameFormat>,
    ) -> Vec<MatchedTrack> {
        let format = format.unwrap_or(self.settings.name_format);
        tracing::debug!("Generating template renames with {:?}", format);
        template::generate_template_renames(locals, format)
    }

    pub async fn fetch_and_match_tracks(
        &self,
        url: &str,
        locals: &[LocalTrack],
    ) -> Result<Vec<MatchedTrack>> {
        let source = adapters::source_for_url(url, self.fetcher.clone());
        self.match_with_source(source.as_ref(), url, locals).await
    }

    /// 以指定的資料來源比對，fetch 或解析失敗時包成 AlbumFetchError
    pub async fn match_with_source(
        &self,
        source: &dyn AlbumSource,
        url: &str,
        locals: &[LocalTrack],
    ) -> Result<Vec<MatchedTrack>> {
        tracing::info!("🌐 Fetching album data from {}", url);
        let album = source
            .fetch_album(url)
            .await
            .map_err(|e| RenamerError::AlbumFetchError(Box::new(e)))?;

        let matches = matcher::match_album(&album, url, locals);
        let matched = matches.iter().filter(|m| m.confidence > 0.0).count();
        tracing::info!("🎯 Matched {}/{} local file(s)", matched, locals.len());
        Ok(matches)
    }

    pub async fn rename_matched_tracks(&self, tracks: &[MatchedTrack]) -> RenameSummary {
        renamer::rename_matched_tracks(&self.storage, tracks).await
    }

    /// 先寫出計畫檔再改名，計畫中的 localPath 仍指向改名前的檔案
    pub async fn save_plan_and_apply(
        &self,
        plan: RenamePlan,
        plan_path: Option<&Path>,
        apply: bool,
    ) -> Result<Option<RenameSummary>> {
        if let Some(path) = plan_path {
            plan::write_plan(path, &plan)?;
        }
        if !apply {
            return Ok(None);
        }
        Ok(Some(self.rename_matched_tracks(&plan.tracks).await))
    }

    /// `api_key` 優先於設定中的金鑰
    pub async fn parse_filenames_with_ai(
        &self,
        filenames: &[String],
        api_key: Option<&str>,
    ) -> Result<Vec<ParsedTrack>> {
        let key = api_key
            .or(self.settings.ai_api_key.as_deref())
            .unwrap_or_default();

        GeminiClient::new(self.fetcher.client().clone(), key)
            .with_endpoint(self.settings.ai_endpoint.as_str())
            .with_model(self.settings.ai_model.as_str())
            .parse_filenames(filenames)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AlbumData, AlbumTrack, StoreKind};
    use async_trait::async_trait;

    struct FixedSource {
        album: Option<AlbumData>,
    }

    #[async_trait]
    impl AlbumSource for FixedSource {
        async fn fetch_album(&self, _url: &str) -> Result<AlbumData> {
            self.album
                .clone()
                .ok_or_else(|| RenamerError::scrape("could not find album data on page"))
        }
    }

    fn local(name: &str) -> LocalTrack {
        LocalTrack {
            path: format!("/music/{}", name),
            original_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.extensions, vec!["flac", "mp3", "wav", "aiff"]);
        assert_eq!(settings.timeout_seconds, 30);
        assert_eq!(settings.ai_api_key, None);
        assert_eq!(settings.name_format, NameFormat::TrackArtistTitle);
    }

    #[test]
    fn test_template_uses_configured_format() {
        let app = App::new(Settings {
            name_format: NameFormat::TrackTitle,
            ..Settings::default()
        })
        .unwrap();

        let result = app.generate_template_renames(&[local("Artist - 05 Title.wav")], None);
        assert_eq!(result[0].proposed_new_name, "05. Title.wav");

        let result = app.generate_template_renames(
            &[local("Artist - 05 Title.wav")],
            Some(NameFormat::TrackArtistTitle),
        );
        assert_eq!(result[0].proposed_new_name, "05. Artist - Title.wav");
    }

    #[tokio::test]
    async fn test_match_with_source() {
        let app = App::new(Settings::default()).unwrap();
        let mut album = AlbumData::new(StoreKind::Bandcamp);
        album.artist = "The Band".to_string();
        album.tracks.push(AlbumTrack {
            title: "Intro".to_string(),
            track_num: 1,
            track_num_explicit: true,
            ..Default::default()
        });
        let source = FixedSource { album: Some(album) };

        let result = app
            .match_with_source(&source, "https://band.bandcamp.com/album/x", &[local("intro.flac")])
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].proposed_new_name, "01. The Band - Intro.flac");
        assert_eq!(result[0].status, "Bandcamp Match");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_wrapped() {
        let app = App::new(Settings::default()).unwrap();
        let source = FixedSource { album: None };

        let err = app
            .match_with_source(&source, "https://band.bandcamp.com/album/x", &[])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to fetch or parse album data: could not find album data on page"
        );
    }

    #[tokio::test]
    async fn test_ai_parse_without_key() {
        let app = App::new(Settings::default()).unwrap();
        let err = app
            .parse_filenames_with_ai(&["a.mp3".to_string()], None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: API key is required");
    }
}
