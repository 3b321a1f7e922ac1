//! Document persistence with file locking.
//!
//! The whole document lives in a single JSON file. Reads take a shared
//! lock, writes go through a locked temp file in the same directory that is
//! synced and renamed over the existing file. Load-modify-save cycles
//! hold an exclusive lock on a `.lock` file next to the document so
//! concurrent writers apply one after another.

use crate::activity::Dated;
use crate::commands::{apply, Command, Transition};
use crate::dates::DateKey;
use crate::migration::{fresh_document, migrate_str, LoadOutcome};
use crate::types::Document;
use crate::{Error, Result};
use chrono::{DateTime, Duration, TimeZone};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Limits for slimming down a large document on load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Optimization {
    pub threshold_bytes: usize,
    pub age_days: i64,
}

/// Exclusive hold on the document, released on drop
#[derive(Debug)]
pub struct WriteLock {
    file: File,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Handle on the document file
#[derive(Clone, Debug)]
pub struct DocumentStore {
    path: PathBuf,
    optimization: Option<Optimization>,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            optimization: None,
        }
    }

    /// Run [`optimize`] on every successfully loaded document
    pub fn with_optimization(mut self, optimization: Optimization) -> Self {
        self.optimization = Some(optimization);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and upgrade the document
    ///
    /// A missing file yields a fresh document. A file that cannot be parsed
    /// or migrated yields [`LoadOutcome::Recovered`] and is copied aside
    /// with a `.bak` suffix before anything overwrites it. I/O failures
    /// while reading are returned as errors so a readable-later file is
    /// never replaced.
    pub fn load<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<LoadOutcome> {
        if !self.path.exists() {
            tracing::info!("No document at {:?}, starting fresh", self.path);
            return Ok(LoadOutcome::Fresh(fresh_document(now)));
        }

        let contents = self.read_locked()?;
        let mut outcome = migrate_str(&contents, now);

        if let (LoadOutcome::Loaded { document, .. }, Some(limits)) =
            (&mut outcome, self.optimization)
        {
            optimize(document, now, limits.threshold_bytes, limits.age_days)?;
        }

        match &outcome {
            LoadOutcome::Recovered { error, .. } => {
                let backup = self.backup_path();
                std::fs::copy(&self.path, &backup)?;
                tracing::warn!(
                    "Document {:?} unusable ({}); previous contents kept at {:?}",
                    self.path,
                    error,
                    backup
                );
            }
            LoadOutcome::Loaded { from_version, .. } => {
                tracing::debug!("Loaded document v{} from {:?}", from_version, self.path);
            }
            LoadOutcome::Fresh(_) => {}
        }

        Ok(outcome)
    }

    fn read_locked(&self) -> Result<String> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read?;

        Ok(contents)
    }

    /// Block until no other writer holds the document
    ///
    /// Hold the returned guard across load, modify and save.
    pub fn lock(&self) -> Result<WriteLock> {
        std::fs::create_dir_all(self.parent())?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.sibling_path(".lock"))?;
        file.lock_exclusive()?;

        Ok(WriteLock { file })
    }

    fn parent(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Save atomically under an exclusive lock
    pub fn save(&self, document: &Document) -> Result<()> {
        let parent = self.parent();
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, document)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved document to {:?}", self.path);
        Ok(())
    }

    /// Load, modify and save back
    pub fn update<Tz, F>(&self, now: &DateTime<Tz>, f: F) -> Result<Document>
    where
        Tz: TimeZone,
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let _lock = self.lock()?;
        let mut document = self.load(now)?.into_document();
        f(&mut document)?;
        self.save(&document)?;
        Ok(document)
    }

    /// Load, apply one command and save the resulting document
    pub fn execute<Tz: TimeZone>(&self, command: Command, now: &DateTime<Tz>) -> Result<Transition> {
        let _lock = self.lock()?;
        let document = self.load(now)?.into_document();
        let transition = apply(document, command, now)?;
        self.save(&transition.document)?;
        Ok(transition)
    }

    fn backup_path(&self) -> PathBuf {
        self.sibling_path(".bak")
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

/// Shrink a large document by dropping optional metadata from old workouts
///
/// Only runs when the serialized document exceeds `threshold_bytes`.
/// Entries whose local date is more than `age_days` before today lose their
/// week number and rating. Returns the number of entries changed.
pub fn optimize<Tz: TimeZone>(
    document: &mut Document,
    now: &DateTime<Tz>,
    threshold_bytes: usize,
    age_days: i64,
) -> Result<usize> {
    let size = serde_json::to_vec(document)?.len();
    if size <= threshold_bytes {
        return Ok(0);
    }

    let cutoff = now.date_naive() - Duration::days(age_days);
    let tz = now.timezone();
    let mut stripped = 0;

    for entry in &mut document.history {
        let old = matches!(entry.date_key(&tz), DateKey::Valid(d) if d < cutoff);
        if old && (entry.week_number.is_some() || entry.rating.is_some()) {
            entry.week_number = None;
            entry.rating = None;
            stripped += 1;
        }
    }

    tracing::info!(
        "Optimized {} byte document: stripped metadata from {} entries older than {}",
        size,
        stripped,
        cutoff
    );
    Ok(stripped)
}
