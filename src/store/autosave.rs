// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::model::Document;
use crate::store::package::{DocumentPackage, PackageError};

/// Debounce window between an edit and the save it triggers. Rescheduling
/// within the window replaces the pending snapshot and restarts the clock.
pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(1);

/// One failed background save, reported through the channel the task carried.
#[derive(Debug)]
pub struct AutosaveFailure {
    pub path: PathBuf,
    pub error: PackageError,
}

#[derive(Debug)]
pub(crate) struct AutosaveTask {
    pub(crate) package: DocumentPackage,
    pub(crate) document: Document,
    pub(crate) errors: mpsc::Sender<AutosaveFailure>,
}

#[derive(Debug)]
struct AutosaveEntry {
    task: AutosaveTask,
    due_at: Instant,
}

#[derive(Debug, Default)]
struct AutosaveState {
    pending: HashMap<PathBuf, AutosaveEntry>,
    in_flight: Option<PathBuf>,
}

#[derive(Debug)]
struct AutosaveInner {
    state: Mutex<AutosaveState>,
    cv: Condvar,
}

#[derive(Debug)]
pub(crate) struct AutosaveManager {
    inner: Arc<AutosaveInner>,
}

impl AutosaveManager {
    fn new() -> Self {
        let inner = Arc::new(AutosaveInner {
            state: Mutex::new(AutosaveState::default()),
            cv: Condvar::new(),
        });

        std::thread::Builder::new()
            .name("proteus-autosave".to_owned())
            .spawn({
                let inner = inner.clone();
                move || Self::run_worker(inner)
            })
            .expect("spawn autosave worker thread");

        Self { inner }
    }

    /// Queues a snapshot save of `task` after `delay`. A task already pending
    /// for the same package path is replaced, which restarts its debounce
    /// window.
    pub(crate) fn schedule(&self, task: AutosaveTask, delay: Duration) {
        let path = task.package.path().to_path_buf();
        let entry = AutosaveEntry {
            task,
            due_at: Instant::now() + delay,
        };

        let mut state = self.inner.state.lock().expect("autosave lock poisoned");
        state.pending.insert(path, entry);
        self.inner.cv.notify_one();
    }

    pub(crate) fn cancel(&self, path: &Path) {
        let mut state = self.inner.state.lock().expect("autosave lock poisoned");
        state.pending.remove(path);
    }

    /// Makes any pending save for `path` due immediately and blocks until
    /// neither a pending nor an in-flight save for it remains.
    pub(crate) fn flush(&self, path: &Path) {
        let mut state = self.inner.state.lock().expect("autosave lock poisoned");
        if let Some(entry) = state.pending.get_mut(path) {
            entry.due_at = Instant::now();
        }
        self.inner.cv.notify_all();

        while state
            .in_flight
            .as_deref()
            .is_some_and(|active| active == path)
            || state.pending.contains_key(path)
        {
            state = self.inner.cv.wait(state).expect("autosave cv poisoned");
        }
    }

    fn run_worker(inner: Arc<AutosaveInner>) {
        loop {
            let task = {
                let mut state = inner.state.lock().expect("autosave lock poisoned");

                loop {
                    let now = Instant::now();
                    let due_path = state
                        .pending
                        .iter()
                        .filter(|(_, entry)| entry.due_at <= now)
                        .min_by_key(|(_, entry)| entry.due_at)
                        .map(|(path, _)| path.clone());
                    if let Some(path) = due_path {
                        if let Some(entry) = state.pending.remove(&path) {
                            state.in_flight = Some(path);
                            break entry.task;
                        }
                    }

                    state = match state.pending.values().map(|entry| entry.due_at).min() {
                        Some(deadline) => {
                            let wait = deadline.saturating_duration_since(Instant::now());
                            inner
                                .cv
                                .wait_timeout(state, wait)
                                .expect("autosave cv poisoned")
                                .0
                        }
                        None => inner.cv.wait(state).expect("autosave cv poisoned"),
                    };
                }
            };

            if let Err(error) = task.package.save(&task.document) {
                warn!(
                    path = %task.package.path().display(),
                    error = %error,
                    "autosave: save failed"
                );
                let failure = AutosaveFailure {
                    path: task.package.path().to_path_buf(),
                    error,
                };
                let _ = task.errors.send(failure);
            }

            let mut state = inner.state.lock().expect("autosave lock poisoned");
            state.in_flight = None;
            inner.cv.notify_all();
        }
    }
}

static AUTOSAVES: OnceLock<AutosaveManager> = OnceLock::new();

pub(crate) fn autosaves() -> &'static AutosaveManager {
    AUTOSAVES.get_or_init(AutosaveManager::new)
}
