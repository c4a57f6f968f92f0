// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use crate::model::ImageId;

/// Package member name an image's bytes are stored under.
pub fn asset_file_name(id: ImageId) -> SmolStr {
    SmolStr::new(format!("image_{id}.png"))
}

/// Recovers the image id from a member name: the substring after the last
/// `_` and before the first `.` of what remains. A bare `<uuid>.png` without
/// the prefix still resolves.
pub fn image_id_from_file_name(name: &str) -> Option<ImageId> {
    let after_underscore = name.rsplit('_').next()?;
    let stem = after_underscore.split('.').next()?;
    ImageId::parse_str(stem).ok()
}

/// Whether a member name looks like stored image data, by extension.
pub fn is_image_member(name: &str) -> bool {
    let Some((_, extension)) = name.rsplit_once('.') else {
        return false;
    };
    extension.eq_ignore_ascii_case("png")
        || extension.eq_ignore_ascii_case("jpg")
        || extension.eq_ignore_ascii_case("jpeg")
        || extension.eq_ignore_ascii_case("gif")
}
