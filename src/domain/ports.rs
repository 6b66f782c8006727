use crate::domain::model::{AlbumData, NameFormat};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub trait Storage: Send + Sync {
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = Result<bool>> + Send;
    fn rename(
        &self,
        from: &Path,
        to: &Path,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 線上商店的專輯資料來源
#[async_trait]
pub trait AlbumSource: Send + Sync {
    async fn fetch_album(&self, url: &str) -> Result<AlbumData>;
}

/// 執行時設定來源 (TOML 檔或命令列)
pub trait ConfigProvider {
    fn extensions(&self) -> Vec<String>;
    fn user_agent(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn ai_api_key(&self) -> Option<&str>;
    fn ai_endpoint(&self) -> &str;
    fn ai_model(&self) -> &str;
    fn name_format(&self) -> NameFormat;
}
