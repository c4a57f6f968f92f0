// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::warn;
use uuid::Uuid;

use crate::format::{
    asset_file_name, bind_attachments, export_rtf, is_image_member, parse_rtf,
    strip_stray_zero_width_spaces, RtfParseError,
};
use crate::model::{
    Document, FileMetadata, ImageId, Rgba, Size, StyledText, VisualMetadata,
    CURRENT_FORMAT_VERSION,
};

/// Rich-text body member, the only member every package generation has.
pub const BODY_FILENAME: &str = "TXT.rtf";

/// Per-image metadata member written by the current generation.
pub const IMAGE_METADATA_FILENAME: &str = "image_metadata.json";

/// Per-image metadata member written by the first generation.
pub const LEGACY_METADATA_FILENAME: &str = "metadata.json";

/// Package-level bookkeeping member; its presence marks a current-generation
/// package.
pub const FILE_METADATA_FILENAME: &str = "file_metadata.json";

pub const PACKAGE_EXTENSION: &str = "rtfdsl";
pub const LEGACY_PACKAGE_EXTENSION: &str = "rtfd";

#[derive(Debug)]
pub enum PackageError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    BodyParse {
        path: PathBuf,
        source: Box<RtfParseError>,
    },
    NotFound {
        path: PathBuf,
    },
    NotAPackage {
        path: PathBuf,
    },
    InvalidPackagePath {
        path: PathBuf,
    },
    MissingBody {
        path: PathBuf,
    },
    MissingFileMetadata {
        path: PathBuf,
    },
    InvalidMemberName {
        name: String,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::BodyParse { path, source } => {
                write!(f, "cannot parse rich-text body at {path:?}: {source}")
            }
            Self::NotFound { path } => write!(f, "package not found at {path:?}"),
            Self::NotAPackage { path } => write!(f, "not a package directory: {path:?}"),
            Self::InvalidPackagePath { path } => write!(f, "invalid package path: {path:?}"),
            Self::MissingBody { path } => {
                write!(f, "package at {path:?} has no {BODY_FILENAME} member")
            }
            Self::MissingFileMetadata { path } => {
                write!(f, "package at {path:?} has no {FILE_METADATA_FILENAME} member")
            }
            Self::InvalidMemberName { name } => {
                write!(f, "invalid package member name: {name:?}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for PackageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::BodyParse { source, .. } => Some(source),
            Self::NotFound { .. } => None,
            Self::NotAPackage { .. } => None,
            Self::InvalidPackagePath { .. } => None,
            Self::MissingBody { .. } => None,
            Self::MissingFileMetadata { .. } => None,
            Self::InvalidMemberName { .. } => None,
            Self::SymlinkRefused { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Members are written to a staging directory that replaces the package
    ///   in one rename.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush member contents and rename operations to stable
    /// storage where possible. Exact guarantees are platform/filesystem-
    /// dependent.
    Durable,
}

/// Result of [`DocumentPackage::load`].
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: Document,
    /// Ids bound during reconciliation, in document order.
    pub bound: Vec<ImageId>,
    /// True when the package predates the current generation and has no
    /// file-level metadata yet.
    pub legacy: bool,
}

/// One document package on disk: a directory holding the rich-text body, the
/// image assets it references, and the metadata sidecars.
#[derive(Debug, Clone)]
pub struct DocumentPackage {
    path: PathBuf,
    durability: WriteDurability,
}

impl DocumentPackage {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_legacy_extension(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(LEGACY_PACKAGE_EXTENSION))
    }

    /// Writes the whole package.
    ///
    /// Members are rebuilt from the document into a staging directory next to
    /// the package, then swapped into place, so readers never observe a
    /// half-written package and members no attachment references any more do
    /// not survive the save.
    ///
    /// File-level metadata is stamped here: `updated_at` becomes the write
    /// time, `created_at` carries over (or is set now for a first save). The
    /// stamped value is returned so callers can mirror it in memory.
    pub fn save(&self, document: &Document) -> Result<FileMetadata, PackageError> {
        let (clean_text, body) = render_body(document);
        let stamped = document
            .file_metadata()
            .map(FileMetadata::with_new_updated_at)
            .unwrap_or_else(FileMetadata::new_now);

        let Some(file_name) = self.path.file_name().and_then(|name| name.to_str()) else {
            return Err(PackageError::InvalidPackagePath {
                path: self.path.clone(),
            });
        };
        let Some(parent) = self.path.parent() else {
            return Err(PackageError::InvalidPackagePath {
                path: self.path.clone(),
            });
        };
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PackageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let staging_dir = parent.join(format!(".proteus.tmp.{file_name}.{nanos}"));
        fs::create_dir_all(&staging_dir).map_err(|source| PackageError::Io {
            path: staging_dir.clone(),
            source,
        })?;

        let written = self
            .write_members(document, &clean_text, &body, &stamped, &staging_dir)
            .and_then(|()| swap_into_place(&staging_dir, &self.path, self.durability));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_dir_all(&staging_dir) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(
                        path = %staging_dir.display(),
                        error = %cleanup,
                        "package: staging cleanup failed"
                    );
                }
            }
            return Err(err);
        }

        Ok(stamped)
    }

    fn write_members(
        &self,
        document: &Document,
        clean_text: &StyledText,
        body: &str,
        file_metadata: &FileMetadata,
        staging_dir: &Path,
    ) -> Result<(), PackageError> {
        write_member(staging_dir, BODY_FILENAME, body.as_bytes(), self.durability)?;

        let surviving = surviving_asset_names(clean_text, document.metadata());
        let mut written = BTreeSet::new();
        for attachment in clean_text.attachments() {
            let name = attachment.file_name();
            if validate_member_name(name).is_err() {
                warn!(name, "package: skipping attachment with unusable member name");
                continue;
            }
            // Image-typed members are written only under the exact name the
            // naming scheme gives a live metadata entry; anything else would
            // be an asset without metadata.
            if is_image_member(name) && !surviving.contains(name) {
                continue;
            }
            if !written.insert(name) {
                continue;
            }
            match attachment.contents() {
                Some(bytes) => write_member(staging_dir, name, bytes, self.durability)?,
                // Bytes were never materialized in memory; carry the member
                // over from the existing package so the asset survives.
                None => copy_member_if_present(&self.path, staging_dir, name, self.durability)?,
            }
        }

        let image_meta = encode_image_metadata(clean_text, document.metadata()).map_err(
            |source| PackageError::Json {
                path: staging_dir.join(IMAGE_METADATA_FILENAME),
                source,
            },
        )?;
        write_member(
            staging_dir,
            IMAGE_METADATA_FILENAME,
            format!("{image_meta}\n").as_bytes(),
            self.durability,
        )?;

        let file_meta = encode_file_metadata(file_metadata).map_err(|source| {
            PackageError::Json {
                path: staging_dir.join(FILE_METADATA_FILENAME),
                source,
            }
        })?;
        write_member(
            staging_dir,
            FILE_METADATA_FILENAME,
            format!("{file_meta}\n").as_bytes(),
            self.durability,
        )?;

        Ok(())
    }

    /// Reads the whole package.
    ///
    /// Missing asset bytes and unmatched attachments degrade silently; a
    /// missing body or file-level metadata member is an error (unless the
    /// package is recognizably first-generation, which never had the latter).
    pub fn load(&self) -> Result<LoadedDocument, PackageError> {
        match fs::metadata(&self.path) {
            Ok(md) if md.is_dir() => {}
            Ok(_) => {
                return Err(PackageError::NotAPackage {
                    path: self.path.clone(),
                })
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(PackageError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(PackageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }

        let body_path = self.path.join(BODY_FILENAME);
        let body = match fs::read_to_string(&body_path) {
            Ok(body) => body,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(PackageError::MissingBody {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(PackageError::Io {
                    path: body_path,
                    source,
                })
            }
        };
        let mut text = parse_rtf(&body).map_err(|source| PackageError::BodyParse {
            path: body_path,
            source: Box::new(source),
        })?;

        let (metadata, had_legacy_metadata) = self.load_image_metadata()?;
        let outcome = bind_attachments(&mut text, &metadata);
        self.load_attachment_bytes(&mut text)?;

        let mut document = Document::with_text(text);
        for record in metadata.into_values() {
            document.insert_visual_metadata(record);
        }

        let file_metadata_path = self.path.join(FILE_METADATA_FILENAME);
        let legacy = match fs::read_to_string(&file_metadata_path) {
            Ok(raw) => {
                let json: FileMetadataJson =
                    serde_json::from_str(&raw).map_err(|source| PackageError::Json {
                        path: file_metadata_path.clone(),
                        source,
                    })?;
                document.set_file_metadata(Some(file_metadata_from_json(json)));
                false
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                if had_legacy_metadata || self.is_legacy_extension() {
                    true
                } else {
                    return Err(PackageError::MissingFileMetadata {
                        path: self.path.clone(),
                    });
                }
            }
            Err(source) => {
                return Err(PackageError::Io {
                    path: file_metadata_path,
                    source,
                })
            }
        };

        Ok(LoadedDocument {
            document,
            bound: outcome.bound,
            legacy,
        })
    }

    fn load_image_metadata(
        &self,
    ) -> Result<(BTreeMap<ImageId, VisualMetadata>, bool), PackageError> {
        let meta_path = self.path.join(IMAGE_METADATA_FILENAME);
        let (meta_path, raw, legacy) = match fs::read_to_string(&meta_path) {
            Ok(raw) => (meta_path, raw, false),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                let legacy_path = self.path.join(LEGACY_METADATA_FILENAME);
                match fs::read_to_string(&legacy_path) {
                    Ok(raw) => (legacy_path, raw, true),
                    Err(source) if source.kind() == io::ErrorKind::NotFound => {
                        return Ok((BTreeMap::new(), false))
                    }
                    Err(source) => {
                        return Err(PackageError::Io {
                            path: legacy_path,
                            source,
                        })
                    }
                }
            }
            Err(source) => {
                return Err(PackageError::Io {
                    path: meta_path,
                    source,
                })
            }
        };

        let entries: Vec<VisualMetadataJson> =
            serde_json::from_str(&raw).map_err(|source| PackageError::Json {
                path: meta_path,
                source,
            })?;
        let mut metadata = BTreeMap::new();
        for entry in entries {
            let record = visual_metadata_from_json(entry);
            metadata.insert(record.id(), record);
        }
        Ok((metadata, legacy))
    }

    fn load_attachment_bytes(&self, text: &mut StyledText) -> Result<(), PackageError> {
        for attachment in text.attachments_mut() {
            if attachment.contents().is_some() {
                continue;
            }
            if validate_member_name(attachment.file_name()).is_err() {
                continue;
            }
            let member_path = self.path.join(attachment.file_name());
            match fs::read(&member_path) {
                Ok(bytes) => attachment.set_contents(Some(Arc::from(bytes))),
                // Missing asset bytes are degradation, not an error; the
                // attachment keeps its place in the text.
                Err(source) if source.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(PackageError::Io {
                        path: member_path,
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

/// A package held entirely in memory, member name to bytes.
///
/// Used for snapshot export and for opening documents that arrive as byte
/// blobs rather than directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryPackage {
    members: BTreeMap<SmolStr, Vec<u8>>,
}

impl InMemoryPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `document` into package members without touching disk.
    ///
    /// Unlike [`DocumentPackage::save`] this does not restamp file-level
    /// metadata; the snapshot reflects the document as it stands.
    pub fn from_document(document: &Document) -> Result<Self, PackageError> {
        let (clean_text, body) = render_body(document);

        let mut package = Self::new();
        package.insert_member(BODY_FILENAME, body.into_bytes());
        let surviving = surviving_asset_names(&clean_text, document.metadata());
        for attachment in clean_text.attachments() {
            let name = attachment.file_name();
            if validate_member_name(name).is_err() {
                continue;
            }
            if is_image_member(name) && !surviving.contains(name) {
                continue;
            }
            if let Some(bytes) = attachment.contents() {
                package.insert_member(name, bytes.to_vec());
            }
        }

        let image_meta = encode_image_metadata(&clean_text, document.metadata()).map_err(
            |source| PackageError::Json {
                path: PathBuf::from(IMAGE_METADATA_FILENAME),
                source,
            },
        )?;
        package.insert_member(IMAGE_METADATA_FILENAME, format!("{image_meta}\n").into_bytes());

        let file_metadata = document
            .file_metadata()
            .cloned()
            .unwrap_or_else(FileMetadata::new_now);
        let file_meta = encode_file_metadata(&file_metadata).map_err(|source| {
            PackageError::Json {
                path: PathBuf::from(FILE_METADATA_FILENAME),
                source,
            }
        })?;
        package.insert_member(FILE_METADATA_FILENAME, format!("{file_meta}\n").into_bytes());

        Ok(package)
    }

    pub fn insert_member(&mut self, name: impl Into<SmolStr>, bytes: Vec<u8>) {
        self.members.insert(name.into(), bytes);
    }

    pub fn member(&self, name: &str) -> Option<&[u8]> {
        self.members.get(name).map(Vec::as_slice)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Writes the members under a fresh scratch directory named `file_name`,
    /// so the directory-based loader can read them. The scratch directory is
    /// removed when the returned handle drops.
    pub fn materialize(&self, file_name: &str) -> Result<ScratchDir, PackageError> {
        validate_member_name(file_name)?;

        let root = env::temp_dir().join(format!("proteus-scratch-{}", Uuid::new_v4()));
        let package_path = root.join(file_name);
        fs::create_dir_all(&package_path).map_err(|source| PackageError::Io {
            path: package_path.clone(),
            source,
        })?;
        let scratch = ScratchDir { root, package_path };

        for (name, bytes) in &self.members {
            validate_member_name(name)?;
            let member_path = scratch.package_path.join(name.as_str());
            fs::write(&member_path, bytes).map_err(|source| PackageError::Io {
                path: member_path.clone(),
                source,
            })?;
        }

        Ok(scratch)
    }
}

/// Scratch-directory materialization of an [`InMemoryPackage`]; cleans up
/// after itself on drop.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    package_path: PathBuf,
}

impl ScratchDir {
    pub fn package_path(&self) -> &Path {
        &self.package_path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.root) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %self.root.display(),
                    error = %err,
                    "package: scratch cleanup failed"
                );
            }
        }
    }
}

/// Loads a document from an in-memory package by materializing it to a
/// scratch directory first.
pub fn load_from_memory(
    package: &InMemoryPackage,
    file_name: &str,
) -> Result<LoadedDocument, PackageError> {
    let scratch = package.materialize(file_name)?;
    DocumentPackage::at(scratch.package_path()).load()
}

include!("package/helpers.rs");
