// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// A width/height pair in points (display sizes) or pixels (source images).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height; 1.0 when the height is zero so downstream
    /// aspect math never divides by zero.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_guards_zero_height() {
        assert_eq!(Size::new(1000.0, 500.0).aspect_ratio(), 2.0);
        assert_eq!(Size::new(42.0, 0.0).aspect_ratio(), 1.0);
    }
}
