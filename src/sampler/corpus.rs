//! Corpus builder: walks the labeled session tree and writes one merged,
//! shuffled training CSV.

use crate::config::SamplerSettings;
use crate::sampler::session::{merge_session, BehaviorLabel, SessionTable};
use crate::sampler::table::{Table, TableError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Completion info for a corpus build.
#[derive(Debug, Clone)]
pub struct CorpusReport {
    pub total_rows: usize,
    pub columns: usize,
    pub risky_rows: usize,
    pub safe_rows: usize,
    pub sessions_merged: usize,
    pub sessions_skipped: usize,
    pub output_path: PathBuf,
    pub file_size_bytes: u64,
}

/// Fatal corpus build errors.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// No session produced any data; nothing is written.
    #[error("no usable session data found")]
    NoData,

    #[error(transparent)]
    Output(#[from] TableError),

    #[error("failed to inspect output file: {0}")]
    OutputMeta(#[from] std::io::Error),
}

/// Collect the merged sessions under one labeled top-level folder.
///
/// A missing folder contributes zero sessions; individual session failures
/// are logged and skipped.
fn collect_label(
    base_dir: &Path,
    folder: &str,
    label: BehaviorLabel,
    stride: usize,
    sessions: &mut Vec<SessionTable>,
    skipped: &mut usize,
) {
    let label_dir = base_dir.join(folder);
    if !label_dir.is_dir() {
        tracing::warn!(path = %label_dir.display(), "label folder not found, contributing zero sessions");
        return;
    }

    let mut day_dirs: Vec<PathBuf> = match std::fs::read_dir(&label_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(e) => {
            tracing::warn!(path = %label_dir.display(), error = %e, "could not list label folder");
            return;
        }
    };
    day_dirs.sort();

    tracing::info!(
        label = label.as_str(),
        sessions = day_dirs.len(),
        "processing label folder"
    );

    for day_dir in day_dirs {
        match merge_session(&day_dir, label, stride) {
            Ok(session) => sessions.push(session),
            Err(reason) => {
                tracing::warn!(
                    day = %day_dir.display(),
                    reason = %reason,
                    "skipping session"
                );
                *skipped += 1;
            }
        }
    }
}

/// Build the training corpus and write it to the configured output file.
///
/// The output is overwritten wholesale; with fixed inputs and seed the
/// resulting file is byte-identical across runs.
pub fn build_corpus(settings: &SamplerSettings) -> Result<CorpusReport, CorpusError> {
    let mut sessions: Vec<SessionTable> = Vec::new();
    let mut skipped = 0usize;

    collect_label(
        &settings.base_dir,
        "risky",
        BehaviorLabel::Risky,
        settings.stride,
        &mut sessions,
        &mut skipped,
    );
    collect_label(
        &settings.base_dir,
        "safe",
        BehaviorLabel::Safe,
        settings.stride,
        &mut sessions,
        &mut skipped,
    );

    if sessions.is_empty() {
        return Err(CorpusError::NoData);
    }

    // Column union in first-seen order. Sessions normally share a schema;
    // a divergent one gets zero-filled gaps.
    let mut headers: Vec<String> = Vec::new();
    for session in &sessions {
        for header in session.table.headers() {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }
    }
    for session in &sessions {
        if session.table.headers() != headers.as_slice() {
            tracing::warn!(
                day = %session.day,
                "session columns differ from corpus schema, zero-filling gaps"
            );
        }
    }

    let mut risky_rows = 0usize;
    let mut safe_rows = 0usize;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for session in &sessions {
        match session.label {
            BehaviorLabel::Risky => risky_rows += session.table.len(),
            BehaviorLabel::Safe => safe_rows += session.table.len(),
        }
        let positions: Vec<Option<usize>> = headers
            .iter()
            .map(|h| session.table.headers().iter().position(|s| s == h))
            .collect();
        for row in session.table.rows() {
            rows.push(
                positions
                    .iter()
                    .map(|p| match p {
                        Some(i) => row[*i].clone(),
                        None => "0".to_string(),
                    })
                    .collect(),
            );
        }
    }

    // One global permutation with a fixed seed keeps runs reproducible.
    let mut rng = StdRng::seed_from_u64(settings.shuffle_seed);
    rows.shuffle(&mut rng);

    let mut corpus = Table::new(headers);
    let columns = corpus.width();
    let total_rows = rows.len();
    for row in rows {
        corpus.push_row(row);
    }
    corpus.write_csv(&settings.output_file)?;

    let file_size_bytes = std::fs::metadata(&settings.output_file)?.len();

    Ok(CorpusReport {
        total_rows,
        columns,
        risky_rows,
        safe_rows,
        sessions_merged: sessions.len(),
        sessions_skipped: skipped,
        output_path: settings.output_file.clone(),
        file_size_bytes,
    })
}
