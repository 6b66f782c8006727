use clap::Parser;
use track_renamer::app::plan;
use track_renamer::config::{Command, OutputArgs};
use track_renamer::utils::error::ErrorSeverity;
use track_renamer::utils::{logger, validation::Validate};
use track_renamer::{
    App, CliConfig, LocalTrack, MatchedTrack, RenamePlan, RenameSummary, Result, TomlConfig,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting track-renamer CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ track-renamer failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 網路錯誤，可重試
            ErrorSeverity::High => 1,     // 資料或設定錯誤
            ErrorSeverity::Critical => 3, // 檔案系統錯誤
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig) -> Result<()> {
    // 驗證命令列與設定檔
    cli.validate()?;
    let config = TomlConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let app = App::from_config(&config)?;

    match cli.command {
        Command::Scan { dir, json } => {
            let tracks = app.scan_folder(&dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tracks)?);
            } else {
                print_scan(&tracks);
            }
        }
        Command::Template {
            dir,
            format,
            output,
        } => {
            let tracks = app.scan_folder(&dir)?;
            let proposals = app.generate_template_renames(&tracks, format);
            print_proposals(&proposals);
            handle_output(&app, "template", proposals, &output).await?;
        }
        Command::Match {
            dir,
            url,
            min_confidence,
            output,
        } => {
            let tracks = app.scan_folder(&dir)?;
            let proposals = app.fetch_and_match_tracks(&url, &tracks).await?;
            let proposals = plan::filter_min_confidence(proposals, min_confidence);
            print_proposals(&proposals);
            handle_output(&app, &url, proposals, &output).await?;
        }
        Command::Rename {
            plan: plan_path,
            min_confidence,
        } => {
            let rename_plan = plan::read_plan(&plan_path)?;
            tracing::info!(
                "📂 Plan from '{}' created at {}",
                rename_plan.source,
                rename_plan.created_at
            );
            let proposals = plan::filter_min_confidence(rename_plan.tracks, min_confidence);
            apply(&app, &proposals).await;
        }
        Command::AiParse { dir, api_key } => {
            let tracks = app.scan_folder(&dir)?;
            let filenames: Vec<String> = tracks.iter().map(|t| t.original_name.clone()).collect();
            let api_key = api_key.or_else(|| std::env::var("GEMINI_API_KEY").ok());

            let parsed = app
                .parse_filenames_with_ai(&filenames, api_key.as_deref())
                .await?;
            for track in &parsed {
                println!(
                    "🤖 {} → [{}] {} - {}",
                    track.original_filename, track.track_number, track.artist, track.title
                );
            }
        }
    }

    Ok(())
}

fn print_scan(tracks: &[LocalTrack]) {
    for track in tracks {
        if track.tag_artist.is_empty() && track.tag_title.is_empty() {
            println!("🎵 {}", track.original_name);
        } else {
            println!(
                "🎵 {}  [{} - {}]",
                track.original_name, track.tag_artist, track.tag_title
            );
        }
    }
    println!("Found {} audio file(s).", tracks.len());
}

fn print_proposals(proposals: &[MatchedTrack]) {
    for proposal in proposals {
        let marker = if proposal.is_unchanged() { "=" } else { "→" };
        println!(
            "{:>4.2}  {} {} {}  ({})",
            proposal.confidence,
            proposal.original_name,
            marker,
            proposal.proposed_new_name,
            proposal.status
        );
    }
}

async fn handle_output(
    app: &App,
    source: &str,
    proposals: Vec<MatchedTrack>,
    output: &OutputArgs,
) -> Result<()> {
    if let Some(report) = &output.report {
        plan::write_report(report, &proposals)?;
        println!("📊 Report saved to: {}", report.display());
    }

    let plan_path = output.plan.as_deref();
    let summary = app
        .save_plan_and_apply(RenamePlan::new(source, proposals), plan_path, output.apply)
        .await?;

    if let Some(path) = plan_path {
        println!("📝 Plan saved to: {}", path.display());
    } else if !output.apply {
        println!("💡 Use --plan FILE to save these proposals or --apply to rename now.");
    }
    if let Some(summary) = summary {
        print_summary(&summary);
    }

    Ok(())
}

async fn apply(app: &App, proposals: &[MatchedTrack]) {
    let summary = app.rename_matched_tracks(proposals).await;
    print_summary(&summary);
}

fn print_summary(summary: &RenameSummary) {
    println!("✅ {}", summary);
    if summary.skipped > 0 || summary.failed > 0 {
        println!(
            "⚠️  {} skipped, {} failed (see log for details)",
            summary.skipped, summary.failed
        );
    }
}
