// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Utc};

/// Format generation written by this crate.
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// Package-level bookkeeping: format generation plus creation and
/// modification timestamps. `created_at` is fixed when the document first
/// comes into existence; `updated_at` moves on every save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub(crate) format_version: u32,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl FileMetadata {
    /// Bookkeeping for a brand-new document, both timestamps set to now.
    pub fn new_now() -> Self {
        let now = Utc::now();
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            created_at,
            updated_at,
        }
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// A copy stamped as modified now, keeping `created_at`. The codec calls
    /// this on every write so `updated_at` tracks the saved package, not the
    /// in-memory document.
    pub fn with_new_updated_at(&self) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}
