// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::file_metadata::FileMetadata;
use super::ids::ImageId;
use super::styled_text::StyledText;
use super::visual_metadata::VisualMetadata;

/// A document: the text flow, the per-image metadata table and the package
/// bookkeeping. `rev` counts applied edit batches and backs optimistic
/// concurrency in the ops layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    styled_text: StyledText,
    metadata: BTreeMap<ImageId, VisualMetadata>,
    file_metadata: Option<FileMetadata>,
    rev: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(styled_text: StyledText) -> Self {
        Self {
            styled_text,
            ..Self::default()
        }
    }

    pub fn styled_text(&self) -> &StyledText {
        &self.styled_text
    }

    pub fn styled_text_mut(&mut self) -> &mut StyledText {
        &mut self.styled_text
    }

    pub fn metadata(&self) -> &BTreeMap<ImageId, VisualMetadata> {
        &self.metadata
    }

    pub fn visual_metadata(&self, id: ImageId) -> Option<&VisualMetadata> {
        self.metadata.get(&id)
    }

    pub fn visual_metadata_mut(&mut self, id: ImageId) -> Option<&mut VisualMetadata> {
        self.metadata.get_mut(&id)
    }

    pub fn insert_visual_metadata(&mut self, metadata: VisualMetadata) {
        self.metadata.insert(metadata.id(), metadata);
    }

    pub fn remove_visual_metadata(&mut self, id: ImageId) -> Option<VisualMetadata> {
        self.metadata.remove(&id)
    }

    pub fn file_metadata(&self) -> Option<&FileMetadata> {
        self.file_metadata.as_ref()
    }

    pub fn set_file_metadata(&mut self, file_metadata: Option<FileMetadata>) {
        self.file_metadata = file_metadata;
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub(crate) fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub(crate) fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }
}
