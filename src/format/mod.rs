// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Serialization concerns that are not tied to the package on disk: the RTF
//! body codec, asset naming, attachment binding and text cleanup.

pub mod naming;
pub mod reconcile;
pub mod rtf;
pub mod sanitize;

pub use naming::{asset_file_name, image_id_from_file_name, is_image_member};
pub use reconcile::{bind_attachments, ReconcileOutcome};
pub use rtf::{export_rtf, parse_rtf, RtfParseError};
pub use sanitize::strip_stray_zero_width_spaces;
