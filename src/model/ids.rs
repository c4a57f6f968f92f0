// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Stable identity of one image attachment and its metadata record.
///
/// The id is assigned when the image is inserted and never reused. Its
/// lowercase hyphenated form is embedded in the asset filename
/// (`image_<uuid>.png`), which is the durable join key between the rich-text
/// body and the metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(Uuid);

impl ImageId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn parse_str(value: &str) -> Result<Self, ParseImageIdError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|source| ParseImageIdError { source })
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hyphenated lowercase, the exact form used in asset filenames.
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<Uuid> for ImageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ImageId> for Uuid {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl FromStr for ImageId {
    type Err = ParseImageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseImageIdError {
    source: uuid::Error,
}

impl fmt::Display for ParseImageIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid image id: {}", self.source)
    }
}

impl std::error::Error for ParseImageIdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_hyphenated() {
        let id = ImageId::parse_str("67E55044-10B1-426F-9247-BB680E5FE0C8").expect("parse");
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn parse_roundtrips_display() {
        let id = ImageId::new_v4();
        let reparsed = ImageId::parse_str(&id.to_string()).expect("roundtrip parse");
        assert_eq!(id, reparsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        match ImageId::parse_str("not-a-uuid") {
            Err(ParseImageIdError { .. }) => {}
            Ok(id) => panic!("expected parse failure, got: {id}"),
        }
    }
}
