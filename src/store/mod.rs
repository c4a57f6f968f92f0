// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for document packages on disk.
//!
//! The store module reads/writes the package directory format (rich-text body
//! plus asset and metadata members) and runs the debounced autosave worker
//! behind the editor session.

pub mod autosave;
pub mod package;

pub use autosave::{AutosaveFailure, AUTOSAVE_DELAY};
pub use package::{
    load_from_memory, DocumentPackage, InMemoryPackage, LoadedDocument, PackageError, ScratchDir,
    WriteDurability, BODY_FILENAME, FILE_METADATA_FILENAME, IMAGE_METADATA_FILENAME,
    LEGACY_METADATA_FILENAME, LEGACY_PACKAGE_EXTENSION, PACKAGE_EXTENSION,
};
