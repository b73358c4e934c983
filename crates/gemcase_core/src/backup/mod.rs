//! Backup naming and the autosave timer.
//!
//! # Responsibility
//! - Pick backup file names that never overwrite an existing backup.
//! - Periodically serialize the shared store to a fresh backup file.
//!
//! # Invariants
//! - Backup names follow `<dir>/<basename>-bakN.mdat`, probing N upward
//!   from 0 and taking the first unused name.
//! - Each autosave tick holds the store lock for the whole serialize+write,
//!   so a tick never interleaves with a user-initiated edit or save.
//! - Autosave failures are logged and never panic the timer thread.

use crate::codec::{self, PROJECT_EXTENSION};
use crate::store::ItemStore;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Autosave cadence used when the host does not override it.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(600);

static BACKUP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)-bak(\d+)$").expect("valid backup name regex"));

fn project_stem(project_path: &Path) -> (PathBuf, String) {
    let dir = project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let stem = project_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    (dir, stem)
}

/// First unused backup path for a project file.
///
/// Probes `<basename>-bak0`, `-bak1`, ... and returns the first name not
/// present on disk, so existing backups are never overwritten.
pub fn backup_path(project_path: &Path) -> PathBuf {
    let (dir, stem) = project_stem(project_path);
    let mut index: u32 = 0;
    loop {
        let candidate = dir.join(format!("{stem}-bak{index}.{PROJECT_EXTENSION}"));
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

/// Backup index encoded in a file path, if the name follows the backup
/// convention for the given project file.
pub fn backup_index(project_path: &Path, candidate: &Path) -> Option<u32> {
    let (_, stem) = project_stem(project_path);
    if candidate.extension().and_then(|ext| ext.to_str()) != Some(PROJECT_EXTENSION) {
        return None;
    }
    let candidate_stem = candidate.file_stem()?.to_str()?;
    let captures = BACKUP_NAME_RE.captures(candidate_stem)?;
    if &captures[1] != stem {
        return None;
    }
    captures[2].parse().ok()
}

/// Existing backups of a project file, sorted by backup index.
pub fn list_backups(project_path: &Path) -> std::io::Result<Vec<(u32, PathBuf)>> {
    let (dir, _) = project_stem(project_path);
    let mut backups = Vec::new();
    for dir_entry in std::fs::read_dir(&dir)? {
        let path = dir_entry?.path();
        if let Some(index) = backup_index(project_path, &path) {
            backups.push((index, path));
        }
    }
    backups.sort_by_key(|&(index, _)| index);
    Ok(backups)
}

/// Handle for the background autosave timer. Stops the timer on drop.
pub struct Autosave {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Autosave {
    /// Starts a timer that writes a fresh backup of `store` every
    /// `interval`, next to `project_path`.
    pub fn start(
        store: Arc<Mutex<ItemStore>>,
        project_path: PathBuf,
        interval: Duration,
    ) -> Autosave {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    autosave_tick(&store, &project_path);
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        info!(
            "event=autosave_start module=backup status=ok interval_s={}",
            interval.as_secs()
        );
        Autosave {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stops the timer and waits for an in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            info!("event=autosave_stop module=backup status=ok");
        }
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn autosave_tick(store: &Mutex<ItemStore>, project_path: &Path) {
    // The lock is held across path probing and the write so a concurrent
    // edit or manual save cannot interleave with the backup.
    let guard = match store.lock() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("event=autosave_tick module=backup status=skipped reason=poisoned_lock");
            return;
        }
    };
    let target = backup_path(project_path);
    match codec::save(&guard, &target) {
        Ok(()) => info!(
            "event=autosave_tick module=backup status=ok path={}",
            target.display()
        ),
        Err(err) => error!(
            "event=autosave_tick module=backup status=error path={} error={err}",
            target.display()
        ),
    }
}
