// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![cfg(test)]

use std::sync::Arc;

use super::document::Document;
use super::geometry::Size;
use super::ids::ImageId;
use super::styled_text::{InlineAttachment, StyledText};
use super::visual_metadata::VisualMetadata;
use crate::format::naming::asset_file_name;

pub(crate) fn png_stub() -> Arc<[u8]> {
    Arc::from(&b"\x89PNG\r\n\x1a\n-stub-payload"[..])
}

pub(crate) fn plain_document() -> Document {
    Document::with_text(StyledText::from_plain("First paragraph\nSecond paragraph\n"))
}

/// A document with one bound wide image inserted mid-text, sized for a
/// 400-point container.
pub(crate) fn document_with_image() -> (Document, ImageId) {
    let id = ImageId::new_v4();
    let mut document = Document::with_text(StyledText::from_plain("Before and after"));
    document.styled_text_mut().insert_attachment(
        7,
        InlineAttachment::new_bound(id, asset_file_name(id), Some(png_stub())),
    );
    document.insert_visual_metadata(VisualMetadata::for_inserted_image(
        id,
        Size::new(1000.0, 500.0),
        400.0,
    ));
    (document, id)
}
