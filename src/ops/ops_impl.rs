// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Text/image mutation implementation helpers used by `apply_ops`.
/// Keeps `ops::mod` focused on public op types and orchestration.
fn check_range(start: usize, end: usize, len: usize) -> Result<(), ApplyError> {
    if start > end || end > len {
        return Err(ApplyError::RangeOutOfBounds { start, end, len });
    }
    Ok(())
}

/// Bound attachment ids whose single character falls inside `start..end`.
fn image_ids_in_range(document: &Document, start: usize, end: usize) -> Vec<ImageId> {
    let mut ids = Vec::new();
    let mut acc = 0usize;
    for run in document.styled_text().runs() {
        let span = run.char_len();
        if let RunContent::Attachment(attachment) = &run.content {
            if acc >= start && acc < end {
                if let Some(id) = attachment.image_id() {
                    ids.push(id);
                }
            }
        }
        acc += span;
    }
    ids
}

fn apply_replace_text(
    document: &mut Document,
    start: usize,
    end: usize,
    text: &str,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    check_range(start, end, document.styled_text().char_len())?;

    // Attachments swallowed by the replacement disappear, record included.
    let doomed = image_ids_in_range(document, start, end);
    document.styled_text_mut().replace_range(start, end, text);
    for image_id in doomed {
        document.remove_visual_metadata(image_id);
        delta.record_removed(image_id);
    }
    delta.mark_text_changed();
    Ok(())
}

fn apply_text_style(
    document: &mut Document,
    start: usize,
    end: usize,
    patch: &TextStylePatch,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    check_range(start, end, document.styled_text().char_len())?;
    if patch.is_empty() || start == end {
        return Ok(());
    }

    document
        .styled_text_mut()
        .apply_text_style(start, end, |style| {
            if let Some(font_family) = &patch.font_family {
                style.font_family = font_family.clone();
            }
            if let Some(font_weight) = patch.font_weight {
                style.font_weight = font_weight;
            }
            if let Some(font_size) = patch.font_size {
                style.font_size = font_size;
            }
            if let Some(color) = patch.color {
                style.color = color;
            }
            if let Some(underline) = patch.underline {
                style.underline = underline;
            }
            if let Some(strikethrough) = patch.strikethrough {
                style.strikethrough = strikethrough;
            }
        });
    delta.mark_style_changed();
    Ok(())
}

fn apply_set_alignment(
    document: &mut Document,
    start: usize,
    end: usize,
    alignment: Alignment,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    check_range(start, end, document.styled_text().char_len())?;

    let (block_start, block_end) = document.styled_text().paragraph_block(start, end);
    document
        .styled_text_mut()
        .apply_paragraph_style(block_start, block_end, |paragraph| {
            paragraph.alignment = alignment;
        });
    delta.mark_style_changed();
    Ok(())
}

fn apply_set_list_marker(
    document: &mut Document,
    start: usize,
    end: usize,
    marker: Option<ListMarkerFormat>,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    check_range(start, end, document.styled_text().char_len())?;

    let (block_start, mut block_end) = document.styled_text().paragraph_block(start, end);

    if marker.is_some() {
        let carrier = ZERO_WIDTH_SPACE.to_string();
        let carriers = document
            .styled_text()
            .empty_paragraph_positions(block_start, block_end);
        for &pos in carriers.iter().rev() {
            document
                .styled_text_mut()
                .replace_range(pos, pos, &carrier);
        }
        if !carriers.is_empty() {
            block_end += carriers.len();
            delta.mark_text_changed();
        }
    }

    document
        .styled_text_mut()
        .apply_paragraph_style(block_start, block_end, |paragraph| {
            paragraph.list_marker = marker;
        });
    delta.mark_style_changed();
    Ok(())
}

fn apply_insert_image(
    document: &mut Document,
    image_id: ImageId,
    at: usize,
    source: &ImageSource,
    container_width: f64,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    let Size { width, height } = source.pixel_size;
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(ApplyError::InvalidImageSize { width, height });
    }
    if !container_width.is_finite() || container_width <= 0.0 {
        return Err(ApplyError::InvalidContainerWidth {
            width: container_width,
        });
    }
    if document.visual_metadata(image_id).is_some()
        || document.styled_text().contains_image(image_id)
    {
        return Err(ApplyError::DuplicateImage { image_id });
    }
    let len = document.styled_text().char_len();
    check_range(at, at, len)?;

    let metadata = VisualMetadata::for_inserted_image(image_id, source.pixel_size, container_width);
    let attachment = InlineAttachment::new_bound(
        image_id,
        asset_file_name(image_id),
        Some(Arc::clone(&source.bytes)),
    );
    document.styled_text_mut().insert_attachment(at, attachment);
    document.insert_visual_metadata(metadata);

    delta.record_added(image_id);
    delta.mark_text_changed();
    Ok(())
}

fn apply_update_image_metadata(
    document: &mut Document,
    image_id: ImageId,
    patch: &VisualMetadataPatch,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    let Some(metadata) = document.visual_metadata_mut(image_id) else {
        return Err(ApplyError::UnknownImage { image_id });
    };
    if patch.is_empty() {
        return Ok(());
    }

    // Lock state first so width/height below apply under the new lock.
    if let Some(lock) = patch.lock_aspect_ratio {
        metadata.set_lock_aspect_ratio(lock);
    }
    if let Some(width) = patch.width {
        metadata.set_width(width);
    }
    if let Some(height) = patch.height {
        metadata.set_height(height);
    }
    if let Some(rotation) = patch.rotation {
        metadata.set_rotation(rotation);
    }
    if let Some(flipped) = patch.is_flipped_horizontal {
        metadata.set_flipped_horizontal(flipped);
    }
    if let Some(flipped) = patch.is_flipped_vertical {
        metadata.set_flipped_vertical(flipped);
    }
    if let Some(opacity) = patch.opacity {
        metadata.set_opacity(opacity);
    }
    if let Some(show) = patch.show_border {
        metadata.set_show_border(show);
    }
    if let Some(width) = patch.border_width {
        metadata.set_border_width(width);
    }
    if let Some(color) = patch.border_color {
        metadata.set_border_color(color);
    }
    if let Some(show) = patch.show_shadow {
        metadata.set_show_shadow(show);
    }
    if let Some(radius) = patch.shadow_radius {
        metadata.set_shadow_radius(radius);
    }
    if let Some(offset) = patch.shadow_offset_x {
        metadata.set_shadow_offset_x(offset);
    }
    if let Some(offset) = patch.shadow_offset_y {
        metadata.set_shadow_offset_y(offset);
    }
    if let Some(color) = patch.shadow_color {
        metadata.set_shadow_color(color);
    }

    delta.record_updated(image_id);
    Ok(())
}

fn apply_reset_image_metadata(
    document: &mut Document,
    image_id: ImageId,
    scope: ResetScope,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    let Some(metadata) = document.visual_metadata_mut(image_id) else {
        return Err(ApplyError::UnknownImage { image_id });
    };
    match scope {
        ResetScope::Size => metadata.reset_size(),
        ResetScope::Style => metadata.reset_style(),
        ResetScope::Transform => metadata.reset_transform(),
        ResetScope::All => metadata.reset_all(),
    }
    delta.record_updated(image_id);
    Ok(())
}

fn apply_delete_attachment(
    document: &mut Document,
    image_id: ImageId,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    let removed_run = document.styled_text_mut().remove_attachment(image_id);
    let removed_metadata = document.remove_visual_metadata(image_id);
    if removed_run.is_none() && removed_metadata.is_none() {
        return Err(ApplyError::UnknownImage { image_id });
    }

    if removed_run.is_some() {
        delta.mark_text_changed();
    }
    delta.record_removed(image_id);
    Ok(())
}
