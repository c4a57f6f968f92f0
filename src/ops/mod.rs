// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations for documents.
//!
//! Operations are applied with optimistic concurrency (revision checks) and
//! produce a minimal delta that callers use to refresh derived state and to
//! decide whether an autosave is warranted. A batch applies atomically: if
//! any op fails, the document is left untouched.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::format::naming::asset_file_name;
use crate::model::{
    Alignment, Document, FontWeight, ImageId, InlineAttachment, ListMarkerFormat, Rgba, RunContent,
    Size, VisualMetadata, ZERO_WIDTH_SPACE,
};

/// Image bytes plus their pixel dimensions, as handed to [`DocOp::InsertImage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub bytes: Arc<[u8]>,
    pub pixel_size: Size,
}

impl ImageSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>, pixel_size: Size) -> Self {
        Self {
            bytes: bytes.into(),
            pixel_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocOp {
    ReplaceText {
        start: usize,
        end: usize,
        text: String,
    },
    ApplyTextStyle {
        start: usize,
        end: usize,
        patch: TextStylePatch,
    },
    SetAlignment {
        start: usize,
        end: usize,
        alignment: Alignment,
    },
    /// Applies to every paragraph touched by the range. Empty paragraphs get
    /// a zero-width carrier character so the marker has something to live on.
    SetListMarker {
        start: usize,
        end: usize,
        marker: Option<ListMarkerFormat>,
    },
    InsertImage {
        image_id: ImageId,
        at: usize,
        source: ImageSource,
        container_width: f64,
    },
    UpdateImageMetadata {
        image_id: ImageId,
        patch: VisualMetadataPatch,
    },
    ResetImageMetadata {
        image_id: ImageId,
        scope: ResetScope,
    },
    DeleteAttachment {
        image_id: ImageId,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStylePatch {
    pub font_family: Option<SmolStr>,
    pub font_weight: Option<FontWeight>,
    pub font_size: Option<f32>,
    pub color: Option<Rgba>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
}

impl TextStylePatch {
    pub fn is_empty(&self) -> bool {
        self.font_family.is_none()
            && self.font_weight.is_none()
            && self.font_size.is_none()
            && self.color.is_none()
            && self.underline.is_none()
            && self.strikethrough.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualMetadataPatch {
    pub lock_aspect_ratio: Option<bool>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub is_flipped_horizontal: Option<bool>,
    pub is_flipped_vertical: Option<bool>,
    pub opacity: Option<f64>,
    pub show_border: Option<bool>,
    pub border_width: Option<f64>,
    pub border_color: Option<Rgba>,
    pub show_shadow: Option<bool>,
    pub shadow_radius: Option<f64>,
    pub shadow_offset_x: Option<f64>,
    pub shadow_offset_y: Option<f64>,
    pub shadow_color: Option<Rgba>,
}

impl VisualMetadataPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    Size,
    Style,
    Transform,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    pub new_rev: u64,
    pub applied: usize,
    pub delta: Delta,
}

/// Minimal delta describing what applying a batch changed.
///
/// Attachment ids are folded the obvious way: an image inserted and deleted
/// in one batch shows up once, and updates to an image added in the same
/// batch are subsumed by the add.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub text_changed: bool,
    pub style_changed: bool,
    pub attachments_added: Vec<ImageId>,
    pub attachments_removed: Vec<ImageId>,
    pub metadata_updated: Vec<ImageId>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        !self.text_changed
            && !self.style_changed
            && self.attachments_added.is_empty()
            && self.attachments_removed.is_empty()
            && self.metadata_updated.is_empty()
    }

    /// Whether the change needs to reach disk. Everything the delta can
    /// express does; the method exists so callers say what they mean.
    pub fn affects_persistence(&self) -> bool {
        !self.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    text_changed: bool,
    style_changed: bool,
    added: HashSet<ImageId>,
    removed: HashSet<ImageId>,
    updated: HashSet<ImageId>,
}

impl DeltaBuilder {
    fn mark_text_changed(&mut self) {
        self.text_changed = true;
    }

    fn mark_style_changed(&mut self) {
        self.style_changed = true;
    }

    fn record_added(&mut self, image_id: ImageId) {
        self.removed.remove(&image_id);
        self.updated.remove(&image_id);
        self.added.insert(image_id);
    }

    fn record_removed(&mut self, image_id: ImageId) {
        self.added.remove(&image_id);
        self.updated.remove(&image_id);
        self.removed.insert(image_id);
    }

    fn record_updated(&mut self, image_id: ImageId) {
        if self.added.contains(&image_id) || self.removed.contains(&image_id) {
            return;
        }
        self.updated.insert(image_id);
    }

    fn finish(self) -> Delta {
        let mut added = self.added.into_iter().collect::<Vec<_>>();
        let mut removed = self.removed.into_iter().collect::<Vec<_>>();
        let mut updated = self.updated.into_iter().collect::<Vec<_>>();

        added.sort();
        removed.sort();
        updated.sort();

        Delta {
            text_changed: self.text_changed,
            style_changed: self.style_changed,
            attachments_added: added,
            attachments_removed: removed,
            metadata_updated: updated,
        }
    }
}

pub fn apply_ops(
    document: &mut Document,
    base_rev: u64,
    ops: &[DocOp],
) -> Result<ApplyResult, ApplyError> {
    let current_rev = document.rev();
    if base_rev != current_rev {
        return Err(ApplyError::Conflict {
            base_rev,
            current_rev,
        });
    }

    if ops.is_empty() {
        return Ok(ApplyResult {
            new_rev: current_rev,
            applied: 0,
            delta: Delta::default(),
        });
    }

    let mut draft = document.clone();
    let mut delta = DeltaBuilder::default();

    for op in ops {
        match op {
            DocOp::ReplaceText { start, end, text } => {
                apply_replace_text(&mut draft, *start, *end, text, &mut delta)?;
            }
            DocOp::ApplyTextStyle { start, end, patch } => {
                apply_text_style(&mut draft, *start, *end, patch, &mut delta)?;
            }
            DocOp::SetAlignment {
                start,
                end,
                alignment,
            } => {
                apply_set_alignment(&mut draft, *start, *end, *alignment, &mut delta)?;
            }
            DocOp::SetListMarker { start, end, marker } => {
                apply_set_list_marker(&mut draft, *start, *end, *marker, &mut delta)?;
            }
            DocOp::InsertImage {
                image_id,
                at,
                source,
                container_width,
            } => {
                apply_insert_image(&mut draft, *image_id, *at, source, *container_width, &mut delta)?;
            }
            DocOp::UpdateImageMetadata { image_id, patch } => {
                apply_update_image_metadata(&mut draft, *image_id, patch, &mut delta)?;
            }
            DocOp::ResetImageMetadata { image_id, scope } => {
                apply_reset_image_metadata(&mut draft, *image_id, *scope, &mut delta)?;
            }
            DocOp::DeleteAttachment { image_id } => {
                apply_delete_attachment(&mut draft, *image_id, &mut delta)?;
            }
        }
    }

    *document = draft;
    document.bump_rev();
    let new_rev = document.rev();

    Ok(ApplyResult {
        new_rev,
        applied: ops.len(),
        delta: delta.finish(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyError {
    Conflict { base_rev: u64, current_rev: u64 },
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    UnknownImage { image_id: ImageId },
    DuplicateImage { image_id: ImageId },
    InvalidImageSize { width: f64, height: f64 },
    InvalidContainerWidth { width: f64 },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict {
                base_rev,
                current_rev,
            } => {
                write!(
                    f,
                    "stale base_rev (base_rev={base_rev}, current_rev={current_rev})"
                )
            }
            Self::RangeOutOfBounds { start, end, len } => {
                write!(f, "range {start}..{end} is out of bounds (len={len})")
            }
            Self::UnknownImage { image_id } => write!(f, "unknown image (id={image_id})"),
            Self::DuplicateImage { image_id } => {
                write!(f, "image already inserted (id={image_id})")
            }
            Self::InvalidImageSize { width, height } => {
                write!(f, "invalid image pixel size ({width}x{height})")
            }
            Self::InvalidContainerWidth { width } => {
                write!(f, "invalid container width ({width})")
            }
        }
    }
}

impl std::error::Error for ApplyError {}

// Extracted op-application implementation for text/image mutations.
include!("ops_impl.rs");

#[cfg(test)]
mod tests;
