use crate::domain::model::{MatchedTrack, RenameSummary};
use crate::domain::ports::Storage;
use std::path::Path;

fn is_safe_file_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Renames each file to its proposed name inside its own folder. Existing
/// targets are never overwritten; individual failures do not stop the batch.
pub async fn rename_matched_tracks<S: Storage>(storage: &S, tracks: &[MatchedTrack]) -> RenameSummary {
    let mut summary = RenameSummary::default();

    for track in tracks {
        if track.is_unchanged() {
            continue;
        }

        if !is_safe_file_name(&track.proposed_new_name) {
            tracing::warn!(
                "Refusing to rename {}: '{}' is not a plain file name",
                track.original_name,
                track.proposed_new_name
            );
            summary.failed += 1;
            continue;
        }

        let source = Path::new(&track.local_path);
        let target = match source.parent() {
            Some(dir) => dir.join(&track.proposed_new_name),
            None => Path::new(&track.proposed_new_name).to_path_buf(),
        };

        match storage.exists(&target).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::warn!(
                    "Skipping rename for {}: target file {} already exists",
                    track.original_name,
                    track.proposed_new_name
                );
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping rename for {}: cannot check target: {}", track.original_name, e);
                summary.skipped += 1;
                continue;
            }
        }

        if let Err(e) = storage.rename(source, &target).await {
            tracing::error!("Error renaming {} to {}: {}", source.display(), target.display(), e);
            summary.failed += 1;
            continue;
        }

        tracing::debug!("Renamed {} -> {}", track.original_name, track.proposed_new_name);
        summary.renamed += 1;
    }

    tracing::info!(
        "✅ Renamed {} track(s), skipped {}, failed {}",
        summary.renamed,
        summary.skipped,
        summary.failed
    );
    summary
}
