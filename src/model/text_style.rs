// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use super::color::Rgba;

pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Weight bucket carried next to the family name. Faces outside the base
/// weight are addressed by suffixing the family, `HelveticaNeue-Light` style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Light,
    Medium,
    Semibold,
    Bold,
}

impl FontWeight {
    /// Face-name suffix for this weight, `None` for the base weight.
    pub fn face_suffix(&self) -> Option<&'static str> {
        match self {
            FontWeight::Regular => None,
            FontWeight::Light => Some("Light"),
            FontWeight::Medium => Some("Medium"),
            FontWeight::Semibold => Some("Semibold"),
            FontWeight::Bold => Some("Bold"),
        }
    }

    pub fn from_face_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Light" => Some(FontWeight::Light),
            "Medium" => Some(FontWeight::Medium),
            "Semibold" => Some(FontWeight::Semibold),
            "Bold" => Some(FontWeight::Bold),
            _ => None,
        }
    }
}

/// Character-level style of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: SmolStr,
    pub font_weight: FontWeight,
    pub font_size: f32,
    pub color: Rgba,
    pub underline: bool,
    pub strikethrough: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: SmolStr::new_static(DEFAULT_FONT_FAMILY),
            font_weight: FontWeight::Regular,
            font_size: DEFAULT_FONT_SIZE,
            color: Rgba::BLACK,
            underline: false,
            strikethrough: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

/// List decoration of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarkerFormat {
    Bullet,
    Dash,
    Decimal,
}

/// Paragraph-level style. Plain body text is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParagraphStyle {
    pub alignment: Alignment,
    pub list_marker: Option<ListMarkerFormat>,
}
