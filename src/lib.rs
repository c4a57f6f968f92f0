// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus: rich text documents with inline image attachments.
//!
//! A document is styled text plus a per-image visual-metadata table,
//! persisted as a directory package with an RTF body. [`editor`] is the
//! top-level editing surface, [`ops`] the revisioned edit API, [`format`]
//! the body and sanitation codecs, and [`store`] package persistence.

pub mod editor;
pub mod format;
pub mod model;
pub mod ops;
pub mod store;
