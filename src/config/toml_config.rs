use crate::adapters::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::adapters::http::{DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use crate::core::scanner::DEFAULT_EXTENSIONS;
use crate::core::ConfigProvider;
use crate::domain::model::NameFormat;
use crate::utils::error::{RenamerError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_CONFIG_FILE: &str = "track-renamer.toml";

static RE_ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub scan: Option<ScanConfig>,
    pub http: Option<HttpConfig>,
    pub ai: Option<AiConfig>,
    pub naming: Option<NamingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    pub format: Option<NameFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 載入 `--config` 指定的檔案；未指定時讀取預設檔，預設檔不存在則使用預設值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    tracing::debug!("Loading default config file {}", DEFAULT_CONFIG_FILE);
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        RE_ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(extensions) = self.scan.as_ref().and_then(|s| s.extensions.as_ref()) {
            validation::validate_extensions("scan.extensions", extensions)?;
        }

        if let Some(http) = &self.http {
            if let Some(timeout) = http.timeout_seconds {
                validation::validate_positive_number("http.timeout_seconds", timeout, 1)?;
            }
            if let Some(user_agent) = &http.user_agent {
                validation::validate_non_empty_string("http.user_agent", user_agent)?;
            }
        }

        if let Some(endpoint) = self.ai.as_ref().and_then(|a| a.endpoint.as_ref()) {
            validation::validate_url("ai.endpoint", endpoint)?;
        }
        if let Some(model) = self.ai.as_ref().and_then(|a| a.model.as_ref()) {
            if model.contains('/') {
                return Err(RenamerError::InvalidConfigValueError {
                    field: "ai.model".to_string(),
                    value: model.clone(),
                    reason: "Model name must not contain '/'".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn extensions(&self) -> Vec<String> {
        self.scan
            .as_ref()
            .and_then(|s| s.extensions.clone())
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }

    fn user_agent(&self) -> &str {
        self.http
            .as_ref()
            .and_then(|h| h.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    fn timeout_seconds(&self) -> u64 {
        self.http
            .as_ref()
            .and_then(|h| h.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    /// 空字串或未替換的 `${VAR}` 視為未設定
    fn ai_api_key(&self) -> Option<&str> {
        self.ai
            .as_ref()
            .and_then(|a| a.api_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }

    fn ai_endpoint(&self) -> &str {
        self.ai
            .as_ref()
            .and_then(|a| a.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    fn ai_model(&self) -> &str {
        self.ai
            .as_ref()
            .and_then(|a| a.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    fn name_format(&self) -> NameFormat {
        self.naming
            .as_ref()
            .and_then(|n| n.format)
            .unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
