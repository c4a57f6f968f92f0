// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A document is styled text with inline image attachments, a per-image
//! visual-metadata table and package-level bookkeeping.

pub mod color;
pub mod document;
pub mod file_metadata;
pub(crate) mod fixtures;
pub mod geometry;
pub mod ids;
pub mod styled_text;
pub mod text_style;
pub mod visual_metadata;

pub use color::Rgba;
pub use document::Document;
pub use file_metadata::{FileMetadata, CURRENT_FORMAT_VERSION};
pub use geometry::Size;
pub use ids::{ImageId, ParseImageIdError};
pub use styled_text::{
    AttachmentBinding, InlineAttachment, RunContent, StyledText, TextRun, ATTACHMENT_CHAR,
    ZERO_WIDTH_SPACE,
};
pub use text_style::{
    Alignment, FontWeight, ListMarkerFormat, ParagraphStyle, TextStyle, DEFAULT_FONT_FAMILY,
    DEFAULT_FONT_SIZE,
};
pub use visual_metadata::VisualMetadata;
