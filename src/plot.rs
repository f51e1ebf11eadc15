//! Per-episode score series and where they go after every game.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;

/// Scores of finished games and the running mean after each one.
#[derive(Debug, Default, Clone)]
pub struct ScoreSeries {
    scores: Vec<u32>,
    mean_scores: Vec<f32>,
    total: u64,
}

impl ScoreSeries {
    /// Appends a game's score and returns the new running mean.
    pub fn push(&mut self, score: u32) -> f32 {
        self.scores.push(score);
        self.total += u64::from(score);
        let mean = self.total as f32 / self.scores.len() as f32;
        self.mean_scores.push(mean);
        mean
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn mean_scores(&self) -> &[f32] {
        &self.mean_scores
    }

    pub fn games(&self) -> usize {
        self.scores.len()
    }

    pub fn last(&self) -> Option<(u32, f32)> {
        Some((*self.scores.last()?, *self.mean_scores.last()?))
    }
}

/// Receives both series after every finished game.
pub trait ScoreSink {
    fn record(&mut self, series: &ScoreSeries) -> Result<()>;
}

/// Drops everything.
pub struct NullSink;

impl ScoreSink for NullSink {
    fn record(&mut self, _series: &ScoreSeries) -> Result<()> {
        Ok(())
    }
}

/// Appends `timestamp,game,score,mean_score` lines to a CSV file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub const HEADER: &'static str = "timestamp,game,score,mean_score";

    /// Opens `path` for appending, writing the header if the file is new.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(&path, format!("{}\n", Self::HEADER))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreSink for CsvSink {
    fn record(&mut self, series: &ScoreSeries) -> Result<()> {
        let Some((score, mean)) = series.last() else {
            return Ok(());
        };
        let line = format!("{},{},{},{:.4}\n", Local::now().to_rfc3339(), series.games(), score, mean);
        let mut f = OpenOptions::new().create(true).append(true).open(&self.path)?;
        f.write_all(line.as_bytes())?;
        Ok(())
    }
}
