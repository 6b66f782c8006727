use crate::domain::model::NameFormat;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "track-renamer")]
#[command(about = "Tidy audio filenames from templates, store track lists or AI guesses")]
#[command(version)]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML configuration file (default: track-renamer.toml)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 列出資料夾內的音訊檔與內嵌標籤
    Scan {
        dir: PathBuf,

        #[arg(long, help = "Print the scan result as JSON")]
        json: bool,
    },

    /// 依檔名樣式推測曲目資訊並產生新檔名
    Template {
        dir: PathBuf,

        #[arg(long, value_enum, help = "Naming format (default from config)")]
        format: Option<NameFormat>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// 抓取 Bandcamp / Beatport 曲目表並比對本地檔案
    Match {
        dir: PathBuf,

        #[arg(long, help = "Bandcamp album/track or Beatport release URL")]
        url: String,

        #[arg(long, default_value_t = 0.0, help = "Only keep proposals at or above this confidence")]
        min_confidence: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// 套用先前儲存的重新命名計畫
    Rename {
        #[arg(long, help = "Plan file written by `template` or `match`")]
        plan: PathBuf,

        #[arg(long, default_value_t = 0.0, help = "Only rename proposals at or above this confidence")]
        min_confidence: f64,
    },

    /// 透過 Gemini 解析雜亂的檔名
    AiParse {
        dir: PathBuf,

        #[arg(long, help = "Gemini API key (falls back to GEMINI_API_KEY, then the config file)")]
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    #[arg(long, help = "Write the proposals to a JSON plan file")]
    pub plan: Option<PathBuf>,

    #[arg(long, help = "Write the proposals to a CSV report")]
    pub report: Option<PathBuf>,

    #[arg(long, help = "Rename the files right away")]
    pub apply: bool,
}

fn validate_path_arg(field_name: &str, path: &Path) -> Result<()> {
    validation::validate_path(field_name, &path.to_string_lossy())
}

impl Validate for OutputArgs {
    fn validate(&self) -> Result<()> {
        if let Some(plan) = &self.plan {
            validate_path_arg("plan", plan)?;
        }
        if let Some(report) = &self.report {
            validate_path_arg("report", report)?;
        }
        Ok(())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(config) = &self.config {
            validate_path_arg("config", config)?;
        }

        match &self.command {
            Command::Scan { dir, .. } | Command::AiParse { dir, .. } => {
                validate_path_arg("dir", dir)?;
            }
            Command::Template { dir, output, .. } => {
                validate_path_arg("dir", dir)?;
                output.validate()?;
            }
            Command::Match {
                dir,
                url,
                min_confidence,
                output,
            } => {
                validate_path_arg("dir", dir)?;
                validation::validate_url("url", url)?;
                validation::validate_range("min_confidence", *min_confidence, 0.0, 1.0)?;
                output.validate()?;
            }
            Command::Rename {
                plan,
                min_confidence,
            } => {
                validate_path_arg("plan", plan)?;
                validation::validate_range("min_confidence", *min_confidence, 0.0, 1.0)?;
            }
        }

        Ok(())
    }
}
