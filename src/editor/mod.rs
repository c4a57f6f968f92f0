// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The editing surface over one open document.
//!
//! An [`EditorSession`] owns the in-memory [`Document`], routes edit batches
//! through the ops layer, and keeps the on-disk package in sync: explicit
//! saves are synchronous, while edits schedule a debounced background save
//! whose failures surface through [`EditorSession::drain_save_errors`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use tracing::{debug, info};

use crate::model::{Document, FileMetadata, ImageId, ListMarkerFormat, VisualMetadata};
use crate::ops::{
    apply_ops, ApplyError, ApplyResult, DocOp, ImageSource, ResetScope, VisualMetadataPatch,
};
use crate::store::autosave::{autosaves, AutosaveFailure, AutosaveTask, AUTOSAVE_DELAY};
use crate::store::{DocumentPackage, InMemoryPackage, PackageError, WriteDurability};

#[derive(Debug)]
pub enum EditorError {
    /// The session has never been given a package path.
    NoSaveLocation,
    ReadOnly { path: PathBuf },
    Package { source: PackageError },
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSaveLocation => write!(f, "document has no save location yet"),
            Self::ReadOnly { path } => {
                write!(f, "package at {path:?} was opened read-only")
            }
            Self::Package { source } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoSaveLocation => None,
            Self::ReadOnly { .. } => None,
            Self::Package { source } => Some(source),
        }
    }
}

impl From<PackageError> for EditorError {
    fn from(source: PackageError) -> Self {
        Self::Package { source }
    }
}

/// One open document and its persistence plumbing.
#[derive(Debug)]
pub struct EditorSession {
    document: Document,
    package: Option<DocumentPackage>,
    read_only: bool,
    durability: WriteDurability,
    autosave_enabled: bool,
    autosave_delay: Duration,
    save_errors: mpsc::Receiver<AutosaveFailure>,
    save_errors_tx: mpsc::Sender<AutosaveFailure>,
}

impl EditorSession {
    /// A blank unsaved document, file-level bookkeeping already stamped.
    pub fn new() -> Self {
        let mut document = Document::new();
        document.set_file_metadata(Some(FileMetadata::new_now()));
        Self::with_document(document, None, false)
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        Self::open_inner(path.into(), false)
    }

    /// Opens for viewing; edits stay in memory and every save path errors.
    pub fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        Self::open_inner(path.into(), true)
    }

    fn open_inner(path: PathBuf, read_only: bool) -> Result<Self, EditorError> {
        let package = DocumentPackage::at(path);
        let loaded = package.load()?;
        let mut document = loaded.document;

        if loaded.legacy {
            // One-time upgrade; the next save writes the current generation.
            document.set_file_metadata(Some(FileMetadata::new_now()));
            info!(
                path = %package.path().display(),
                "editor: upgraded legacy package in memory"
            );
        }
        debug!(
            path = %package.path().display(),
            bound = loaded.bound.len(),
            "editor: opened package"
        );

        Ok(Self::with_document(document, Some(package), read_only))
    }

    fn with_document(
        document: Document,
        package: Option<DocumentPackage>,
        read_only: bool,
    ) -> Self {
        let (save_errors_tx, save_errors) = mpsc::channel();
        Self {
            document,
            package,
            read_only,
            durability: WriteDurability::default(),
            autosave_enabled: true,
            autosave_delay: AUTOSAVE_DELAY,
            save_errors,
            save_errors_tx,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn rev(&self) -> u64 {
        self.document.rev()
    }

    /// Where saves go, once a location is bound.
    pub fn save_location(&self) -> Option<&Path> {
        self.package.as_ref().map(DocumentPackage::path)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn autosave_enabled(&self) -> bool {
        self.autosave_enabled
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.autosave_enabled = enabled;
        if !enabled {
            if let Some(package) = &self.package {
                autosaves().cancel(package.path());
            }
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        self.autosave_delay
    }

    pub fn set_autosave_delay(&mut self, delay: Duration) {
        self.autosave_delay = delay;
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn set_durability(&mut self, durability: WriteDurability) {
        self.durability = durability;
        self.package = self
            .package
            .take()
            .map(|package| package.with_durability(durability));
    }

    /// Applies one edit batch against `base_rev` and schedules an autosave
    /// when the batch changed anything worth persisting.
    pub fn apply(&mut self, base_rev: u64, ops: &[DocOp]) -> Result<ApplyResult, ApplyError> {
        let result = apply_ops(&mut self.document, base_rev, ops)?;
        if result.delta.affects_persistence() {
            self.schedule_autosave();
        }
        Ok(result)
    }

    /// Inserts an image at `at`, returning the assigned id and the sizing the
    /// insertion rule chose for it.
    pub fn insert_image(
        &mut self,
        at: usize,
        source: ImageSource,
        container_width: f64,
    ) -> Result<(ImageId, VisualMetadata), ApplyError> {
        let image_id = ImageId::new_v4();
        let base_rev = self.document.rev();
        self.apply(
            base_rev,
            &[DocOp::InsertImage {
                image_id,
                at,
                source,
                container_width,
            }],
        )?;
        match self.document.visual_metadata(image_id) {
            Some(metadata) => Ok((image_id, metadata.clone())),
            None => unreachable!("applied insert creates the metadata record"),
        }
    }

    /// Replaces the characters of `start..end` with `text` at the current
    /// revision.
    pub fn replace_text(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<ApplyResult, ApplyError> {
        let base_rev = self.document.rev();
        self.apply(
            base_rev,
            &[DocOp::ReplaceText {
                start,
                end,
                text: text.into(),
            }],
        )
    }

    /// Sets or clears the list marker on every paragraph touching
    /// `start..end`.
    pub fn set_list_marker(
        &mut self,
        start: usize,
        end: usize,
        marker: Option<ListMarkerFormat>,
    ) -> Result<ApplyResult, ApplyError> {
        let base_rev = self.document.rev();
        self.apply(base_rev, &[DocOp::SetListMarker { start, end, marker }])
    }

    /// Applies an inspector patch to one image's metadata.
    pub fn update_image_metadata(
        &mut self,
        image_id: ImageId,
        patch: VisualMetadataPatch,
    ) -> Result<ApplyResult, ApplyError> {
        let base_rev = self.document.rev();
        self.apply(base_rev, &[DocOp::UpdateImageMetadata { image_id, patch }])
    }

    /// Restores one image's metadata defaults per `scope`.
    pub fn reset_image_metadata(
        &mut self,
        image_id: ImageId,
        scope: ResetScope,
    ) -> Result<ApplyResult, ApplyError> {
        let base_rev = self.document.rev();
        self.apply(base_rev, &[DocOp::ResetImageMetadata { image_id, scope }])
    }

    /// Removes the attachment bound to `image_id` together with its metadata
    /// entry.
    pub fn delete_attachment(&mut self, image_id: ImageId) -> Result<ApplyResult, ApplyError> {
        let base_rev = self.document.rev();
        self.apply(base_rev, &[DocOp::DeleteAttachment { image_id }])
    }

    /// Synchronous save to the session's package path. Supersedes any pending
    /// autosave for the same path, and mirrors the freshly stamped file-level
    /// metadata back into the document.
    pub fn save(&mut self) -> Result<(), EditorError> {
        let Some(package) = self.package.clone() else {
            return Err(EditorError::NoSaveLocation);
        };
        if self.read_only {
            return Err(EditorError::ReadOnly {
                path: package.path().to_path_buf(),
            });
        }

        autosaves().cancel(package.path());
        let stamped = package.save(&self.document)?;
        self.document.set_file_metadata(Some(stamped));
        Ok(())
    }

    /// Rebinds the session to `path` and saves there. Clears the read-only
    /// flag: writing somewhere else was the point of asking.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), EditorError> {
        self.package = Some(DocumentPackage::at(path.into()).with_durability(self.durability));
        self.read_only = false;
        self.save()
    }

    /// Renders the current document into an in-memory package without
    /// touching the session's save location.
    pub fn export_snapshot(&self) -> Result<InMemoryPackage, EditorError> {
        Ok(InMemoryPackage::from_document(&self.document)?)
    }

    /// Blocks until no autosave for this session's path is pending or
    /// running.
    pub fn flush_autosave(&self) {
        if let Some(package) = &self.package {
            autosaves().flush(package.path());
        }
    }

    /// Failures from background saves since the last call, oldest first.
    pub fn drain_save_errors(&self) -> Vec<AutosaveFailure> {
        let mut failures = Vec::new();
        while let Ok(failure) = self.save_errors.try_recv() {
            failures.push(failure);
        }
        failures
    }

    fn schedule_autosave(&self) {
        if !self.autosave_enabled || self.read_only {
            return;
        }
        let Some(package) = &self.package else {
            return;
        };
        autosaves().schedule(
            AutosaveTask {
                package: package.clone(),
                document: self.document.clone(),
                errors: self.save_errors_tx.clone(),
            },
            self.autosave_delay,
        );
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
