use crate::domain::model::{FromSource, MatchedTrack, RenamePlan};
use crate::utils::error::Result;
use serde_json::Value;
use std::path::Path;

/// 寫出 JSON 改名計畫，供使用者檢視或修改後再套用
pub fn write_plan(path: &Path, plan: &RenamePlan) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    std::fs::write(path, json)?;
    tracing::info!("📝 Wrote plan with {} proposal(s) to {}", plan.tracks.len(), path.display());
    Ok(())
}

/// Reads a plan file. A bare JSON array of proposals is accepted too.
pub fn read_plan(path: &Path) -> Result<RenamePlan> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let plan = match value {
        Value::Array(items) => {
            let tracks = items
                .into_iter()
                .map(MatchedTrack::create_from)
                .collect::<Result<Vec<_>>>()?;
            RenamePlan::new(path.display().to_string(), tracks)
        }
        other => serde_json::from_value(other)?,
    };

    tracing::debug!("Read {} proposal(s) from {}", plan.tracks.len(), path.display());
    Ok(plan)
}

/// 過濾掉信心分數低於門檻的提案
pub fn filter_min_confidence(tracks: Vec<MatchedTrack>, min_confidence: f64) -> Vec<MatchedTrack> {
    let before = tracks.len();
    let kept: Vec<MatchedTrack> = tracks
        .into_iter()
        .filter(|t| t.confidence >= min_confidence)
        .collect();
    if kept.len() < before {
        tracing::info!(
            "Dropped {} proposal(s) below confidence {:.2}",
            before - kept.len(),
            min_confidence
        );
    }
    kept
}

/// CSV 報表，每個提案一列
pub fn write_report(path: &Path, tracks: &[MatchedTrack]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for track in tracks {
        writer.serialize(track)?;
    }
    writer.flush()?;
    tracing::info!("📊 Wrote report with {} row(s) to {}", tracks.len(), path.display());
    Ok(())
}
