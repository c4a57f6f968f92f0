// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::color::Rgba;
use super::geometry::Size;
use super::ids::ImageId;

pub const MIN_BORDER_WIDTH: f64 = 0.25;
pub const MAX_BORDER_WIDTH: f64 = 10.0;
pub const MAX_SHADOW_RADIUS: f64 = 15.0;
pub const MAX_SHADOW_OFFSET: f64 = 20.0;

const DEFAULT_BORDER_WIDTH: f64 = 1.0;
const DEFAULT_SHADOW_RADIUS: f64 = 1.0;
const MIN_DISPLAY_DIMENSION: f64 = 1.0;

/// Share of the container width an inserted image may occupy before it is
/// scaled down to fit.
const CONTAINER_FILL_RATIO: f64 = 0.8;

/// Per-image styling record.
///
/// Identity (`id`), the insertion-time sizes (`default_size`, `max_size`) and
/// the derived `original_aspect_ratio` are fixed at creation. Everything else
/// is mutated through the editing API; the package codec only transports the
/// record and never changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualMetadata {
    pub(crate) id: ImageId,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) lock_aspect_ratio: bool,
    pub(crate) default_size: Size,
    pub(crate) max_size: Size,
    pub(crate) original_aspect_ratio: f64,
    pub(crate) rotation: f64,
    pub(crate) is_flipped_horizontal: bool,
    pub(crate) is_flipped_vertical: bool,
    pub(crate) opacity: f64,
    pub(crate) show_border: bool,
    pub(crate) border_width: f64,
    pub(crate) border_color: Rgba,
    pub(crate) show_shadow: bool,
    pub(crate) shadow_radius: f64,
    pub(crate) shadow_offset_x: f64,
    pub(crate) shadow_offset_y: f64,
    pub(crate) shadow_color: Rgba,
}

impl VisualMetadata {
    /// Builds a record with the given insertion-time sizes. The current
    /// display size starts at `default_size` and the aspect ratio is derived
    /// from `max_size` (the source image's pixel dimensions).
    pub fn new(id: ImageId, default_size: Size, max_size: Size) -> Self {
        Self {
            id,
            width: default_size.width,
            height: default_size.height,
            lock_aspect_ratio: true,
            default_size,
            max_size,
            original_aspect_ratio: max_size.aspect_ratio(),
            rotation: 0.0,
            is_flipped_horizontal: false,
            is_flipped_vertical: false,
            opacity: 1.0,
            show_border: false,
            border_width: DEFAULT_BORDER_WIDTH,
            border_color: Rgba::BLACK,
            show_shadow: false,
            shadow_radius: DEFAULT_SHADOW_RADIUS,
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_color: Rgba::SHADOW,
        }
    }

    /// Builds the record for a freshly inserted image.
    ///
    /// A source wider than 80% of the container is scaled down to that share
    /// of the container width, height following the aspect ratio; smaller
    /// sources keep their pixel dimensions as the default display size.
    pub fn for_inserted_image(id: ImageId, pixel_size: Size, container_width: f64) -> Self {
        let fitted_width = CONTAINER_FILL_RATIO * container_width;
        let default_size = if pixel_size.width > fitted_width {
            Size::new(fitted_width, fitted_width / pixel_size.aspect_ratio())
        } else {
            pixel_size
        };
        Self::new(id, default_size, pixel_size)
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn lock_aspect_ratio(&self) -> bool {
        self.lock_aspect_ratio
    }

    pub fn default_size(&self) -> Size {
        self.default_size
    }

    pub fn max_size(&self) -> Size {
        self.max_size
    }

    pub fn original_aspect_ratio(&self) -> f64 {
        self.original_aspect_ratio
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_flipped_horizontal(&self) -> bool {
        self.is_flipped_horizontal
    }

    pub fn is_flipped_vertical(&self) -> bool {
        self.is_flipped_vertical
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn show_border(&self) -> bool {
        self.show_border
    }

    pub fn border_width(&self) -> f64 {
        self.border_width
    }

    pub fn border_color(&self) -> Rgba {
        self.border_color
    }

    pub fn show_shadow(&self) -> bool {
        self.show_shadow
    }

    pub fn shadow_radius(&self) -> f64 {
        self.shadow_radius
    }

    pub fn shadow_offset_x(&self) -> f64 {
        self.shadow_offset_x
    }

    pub fn shadow_offset_y(&self) -> f64 {
        self.shadow_offset_y
    }

    pub fn shadow_color(&self) -> Rgba {
        self.shadow_color
    }

    /// Sets the display width, clamped to `[1, max_size.width]`. While the
    /// aspect lock is on, the height follows via the original aspect ratio.
    pub fn set_width(&mut self, width: f64) {
        self.width = clamp_dimension(width, self.max_size.width);
        if self.lock_aspect_ratio {
            self.height = self.width / self.original_aspect_ratio;
        }
    }

    /// Sets the display height, clamped to `[1, max_size.height]`. While the
    /// aspect lock is on, the width follows via the original aspect ratio.
    pub fn set_height(&mut self, height: f64) {
        self.height = clamp_dimension(height, self.max_size.height);
        if self.lock_aspect_ratio {
            self.width = self.height * self.original_aspect_ratio;
        }
    }

    pub fn set_lock_aspect_ratio(&mut self, lock: bool) {
        self.lock_aspect_ratio = lock;
    }

    /// Rotation in degrees, normalized into `[0, 360)`.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees.rem_euclid(360.0);
    }

    pub fn set_flipped_horizontal(&mut self, flipped: bool) {
        self.is_flipped_horizontal = flipped;
    }

    pub fn set_flipped_vertical(&mut self, flipped: bool) {
        self.is_flipped_vertical = flipped;
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_show_border(&mut self, show: bool) {
        self.show_border = show;
    }

    pub fn set_border_width(&mut self, width: f64) {
        self.border_width = width.clamp(MIN_BORDER_WIDTH, MAX_BORDER_WIDTH);
    }

    pub fn set_border_color(&mut self, color: Rgba) {
        self.border_color = color;
    }

    pub fn set_show_shadow(&mut self, show: bool) {
        self.show_shadow = show;
    }

    pub fn set_shadow_radius(&mut self, radius: f64) {
        self.shadow_radius = radius.clamp(0.0, MAX_SHADOW_RADIUS);
    }

    pub fn set_shadow_offset_x(&mut self, offset: f64) {
        self.shadow_offset_x = offset.clamp(-MAX_SHADOW_OFFSET, MAX_SHADOW_OFFSET);
    }

    pub fn set_shadow_offset_y(&mut self, offset: f64) {
        self.shadow_offset_y = offset.clamp(-MAX_SHADOW_OFFSET, MAX_SHADOW_OFFSET);
    }

    pub fn set_shadow_color(&mut self, color: Rgba) {
        self.shadow_color = color;
    }

    /// Restores the insertion-time display size and re-enables the aspect
    /// lock.
    pub fn reset_size(&mut self) {
        self.width = self.default_size.width;
        self.height = self.default_size.height;
        self.lock_aspect_ratio = true;
    }

    /// Restores border, shadow and opacity defaults.
    pub fn reset_style(&mut self) {
        self.opacity = 1.0;
        self.show_border = false;
        self.border_width = DEFAULT_BORDER_WIDTH;
        self.border_color = Rgba::BLACK;
        self.show_shadow = false;
        self.shadow_radius = DEFAULT_SHADOW_RADIUS;
        self.shadow_offset_x = 0.0;
        self.shadow_offset_y = 0.0;
        self.shadow_color = Rgba::SHADOW;
    }

    /// Restores rotation and flips.
    pub fn reset_transform(&mut self) {
        self.rotation = 0.0;
        self.is_flipped_horizontal = false;
        self.is_flipped_vertical = false;
    }

    pub fn reset_all(&mut self) {
        self.reset_size();
        self.reset_style();
        self.reset_transform();
    }
}

fn clamp_dimension(value: f64, max: f64) -> f64 {
    value.clamp(MIN_DISPLAY_DIMENSION, max.max(MIN_DISPLAY_DIMENSION))
}
