use anyhow::Result;
use tempfile::TempDir;
use track_renamer::app::plan;
use track_renamer::config::toml_config::TomlConfig;
use track_renamer::{App, NameFormat, RenamePlan};

fn touch_all(dir: &TempDir, names: &[&str]) -> Result<()> {
    for name in names {
        std::fs::write(dir.path().join(name), b"")?;
    }
    Ok(())
}

/// 測試範本改名：存在的目標檔案會被跳過，沒有推測的檔案保持原樣
#[tokio::test]
async fn test_template_rename_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    touch_all(
        &temp_dir,
        &[
            "Artist - 05 Title.wav",
            "Artist - Album - 03 Title 128 bpm.flac",
            "Artist - Title - 120.mp3",
            "Artist_Name - Track_Title.mp3",
            "Artist Name - Track Title.mp3",
            "readme.txt",
        ],
    )?;

    let app = App::from_config(&TomlConfig::default())?;
    let locals = app.scan_folder(temp_dir.path())?;
    assert_eq!(locals.len(), 5);

    let proposals = app.generate_template_renames(&locals, None);
    let unchanged = proposals.iter().filter(|p| p.is_unchanged()).count();
    assert_eq!(unchanged, 2);

    let summary = app.rename_matched_tracks(&proposals).await;
    assert_eq!(summary.renamed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let dir = temp_dir.path();
    assert!(dir.join("05. Artist - Title.wav").exists());
    assert!(dir.join("03. Artist - Title (128 bpm).flac").exists());
    assert!(dir.join("Artist - Title - 120.mp3").exists());
    // 目標已存在，原檔保留
    assert!(dir.join("Artist_Name - Track_Title.mp3").exists());
    assert!(dir.join("Artist Name - Track Title.mp3").exists());

    Ok(())
}

/// 測試設定檔的命名格式與計畫檔的信心門檻
#[tokio::test]
async fn test_plan_with_min_confidence() -> Result<()> {
    let temp_dir = TempDir::new()?;
    touch_all(
        &temp_dir,
        &["Artist - 05 Title.wav", "Artist - Album - 03 Title 128 bpm.flac"],
    )?;

    let config = TomlConfig::from_toml_str(
        r#"
[scan]
extensions = ["wav", "flac"]

[naming]
format = "track-title"
"#,
    )?;
    let app = App::from_config(&config)?;
    assert_eq!(app.settings().name_format, NameFormat::TrackTitle);

    let locals = app.scan_folder(temp_dir.path())?;
    let proposals = app.generate_template_renames(&locals, None);
    assert_eq!(proposals[0].proposed_new_name, "05. Title.wav");
    assert_eq!(proposals[1].proposed_new_name, "03. Title (128 bpm).flac");

    let plan_path = temp_dir.path().join("plan.json");
    plan::write_plan(&plan_path, &RenamePlan::new("template", proposals))?;

    let loaded = plan::read_plan(&plan_path)?;
    assert_eq!(loaded.source, "template");
    let to_apply = plan::filter_min_confidence(loaded.tracks, 0.85);
    assert_eq!(to_apply.len(), 1);

    let summary = app.rename_matched_tracks(&to_apply).await;
    assert_eq!(summary.renamed, 1);
    assert!(temp_dir.path().join("03. Title (128 bpm).flac").exists());
    assert!(temp_dir.path().join("Artist - 05 Title.wav").exists());

    Ok(())
}

/// 測試同時存計畫與改名時，計畫記錄的是改名前的路徑
#[tokio::test]
async fn test_plan_is_saved_before_apply() -> Result<()> {
    let temp_dir = TempDir::new()?;
    touch_all(&temp_dir, &["Artist - 05 Title.wav"])?;
    let original = temp_dir.path().join("Artist - 05 Title.wav");

    let app = App::from_config(&TomlConfig::default())?;
    let locals = app.scan_folder(temp_dir.path())?;
    let proposals = app.generate_template_renames(&locals, None);

    let plan_path = temp_dir.path().join("plan.json");
    let summary = app
        .save_plan_and_apply(RenamePlan::new("template", proposals), Some(plan_path.as_path()), true)
        .await?
        .expect("apply was requested");
    assert_eq!(summary.renamed, 1);
    assert!(!original.exists());
    assert!(temp_dir.path().join("05. Artist - Title.wav").exists());

    let loaded = plan::read_plan(&plan_path)?;
    assert_eq!(loaded.tracks.len(), 1);
    assert_eq!(loaded.tracks[0].local_path, original.to_string_lossy());
    assert_eq!(loaded.tracks[0].original_name, "Artist - 05 Title.wav");

    let none = app
        .save_plan_and_apply(RenamePlan::new("template", loaded.tracks), None, false)
        .await?;
    assert!(none.is_none());

    Ok(())
}

/// 測試不存在的資料夾
#[test]
fn test_scan_missing_folder() -> Result<()> {
    let app = App::from_config(&TomlConfig::default())?;
    let err = app
        .scan_folder(std::path::Path::new("/definitely/not/a/folder"))
        .unwrap_err();
    assert_eq!(
        err.severity(),
        track_renamer::utils::error::ErrorSeverity::Critical
    );
    Ok(())
}
