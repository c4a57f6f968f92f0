// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::model::fixtures::{document_with_image, plain_document, png_stub};
use crate::model::{Alignment, Document, ImageId, ListMarkerFormat, Size, StyledText};

use super::{
    apply_ops, ApplyError, DocOp, ImageSource, ResetScope, TextStylePatch, VisualMetadataPatch,
};

fn source(width: f64, height: f64) -> ImageSource {
    ImageSource {
        bytes: png_stub(),
        pixel_size: Size::new(width, height),
    }
}

#[test]
fn replace_text_bumps_rev_and_mutates() {
    let mut document = Document::with_text(StyledText::from_plain("hello world"));
    let ops = [DocOp::ReplaceText {
        start: 0,
        end: 5,
        text: "goodbye".to_owned(),
    }];

    let result = apply_ops(&mut document, 0, &ops).expect("apply");
    assert_eq!(result.new_rev, 1);
    assert_eq!(result.applied, 1);
    assert!(result.delta.text_changed);
    assert!(result.delta.affects_persistence());
    assert_eq!(document.styled_text().plain_text(), "goodbye world");
    assert_eq!(document.rev(), 1);
}

#[test]
fn stale_base_rev_conflicts() {
    let mut document = plain_document();
    document.bump_rev();

    let ops = [DocOp::ReplaceText {
        start: 0,
        end: 0,
        text: "x".to_owned(),
    }];
    match apply_ops(&mut document, 0, &ops) {
        Err(ApplyError::Conflict {
            base_rev: 0,
            current_rev: 1,
        }) => {}
        other => panic!("expected Conflict, got: {other:?}"),
    }
}

#[test]
fn empty_batch_is_a_noop() {
    let mut document = plain_document();
    let before = document.clone();

    let result = apply_ops(&mut document, 0, &[]).expect("apply");
    assert_eq!(result.new_rev, 0);
    assert_eq!(result.applied, 0);
    assert!(result.delta.is_empty());
    assert!(!result.delta.affects_persistence());
    assert_eq!(document, before);
}

#[test]
fn failed_batch_leaves_document_untouched() {
    let mut document = Document::with_text(StyledText::from_plain("abc"));
    let before = document.clone();

    let ops = [
        DocOp::ReplaceText {
            start: 0,
            end: 3,
            text: "replaced".to_owned(),
        },
        DocOp::ReplaceText {
            start: 0,
            end: 99,
            text: String::new(),
        },
    ];
    match apply_ops(&mut document, 0, &ops) {
        Err(ApplyError::RangeOutOfBounds { end: 99, .. }) => {}
        other => panic!("expected RangeOutOfBounds, got: {other:?}"),
    }
    assert_eq!(document, before);
    assert_eq!(document.rev(), 0);
}

#[test]
fn insert_image_sizes_for_container() {
    let mut document = Document::with_text(StyledText::from_plain("ab"));
    let image_id = ImageId::new_v4();

    let ops = [DocOp::InsertImage {
        image_id,
        at: 1,
        source: source(1000.0, 500.0),
        container_width: 400.0,
    }];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert_eq!(result.delta.attachments_added, vec![image_id]);
    assert!(result.delta.text_changed);

    let metadata = document.visual_metadata(image_id).expect("metadata");
    assert_eq!(metadata.default_size(), Size::new(320.0, 160.0));
    assert_eq!(metadata.max_size(), Size::new(1000.0, 500.0));
    assert_eq!(metadata.original_aspect_ratio(), 2.0);
    assert_eq!(metadata.size(), Size::new(320.0, 160.0));

    let attachment = document
        .styled_text()
        .attachments()
        .next()
        .expect("attachment");
    assert_eq!(attachment.image_id(), Some(image_id));
    assert!(attachment.file_name().starts_with("image_"));
    assert!(attachment.contents().is_some());
    assert_eq!(document.styled_text().char_len(), 3);
}

#[test]
fn duplicate_image_is_rejected() {
    let (mut document, image_id) = document_with_image();
    let ops = [DocOp::InsertImage {
        image_id,
        at: 0,
        source: source(10.0, 10.0),
        container_width: 400.0,
    }];
    match apply_ops(&mut document, 0, &ops) {
        Err(ApplyError::DuplicateImage { image_id: dup }) => assert_eq!(dup, image_id),
        other => panic!("expected DuplicateImage, got: {other:?}"),
    }
}

#[test]
fn bad_image_source_and_container_are_rejected() {
    let mut document = plain_document();

    let zero_sized = [DocOp::InsertImage {
        image_id: ImageId::new_v4(),
        at: 0,
        source: source(0.0, 100.0),
        container_width: 400.0,
    }];
    match apply_ops(&mut document, 0, &zero_sized) {
        Err(ApplyError::InvalidImageSize { .. }) => {}
        other => panic!("expected InvalidImageSize, got: {other:?}"),
    }

    let bad_container = [DocOp::InsertImage {
        image_id: ImageId::new_v4(),
        at: 0,
        source: source(100.0, 100.0),
        container_width: 0.0,
    }];
    match apply_ops(&mut document, 0, &bad_container) {
        Err(ApplyError::InvalidContainerWidth { .. }) => {}
        other => panic!("expected InvalidContainerWidth, got: {other:?}"),
    }
}

#[test]
fn update_folds_into_insert_within_one_batch() {
    let mut document = plain_document();
    let image_id = ImageId::new_v4();

    let ops = [
        DocOp::InsertImage {
            image_id,
            at: 0,
            source: source(200.0, 100.0),
            container_width: 400.0,
        },
        DocOp::UpdateImageMetadata {
            image_id,
            patch: VisualMetadataPatch {
                rotation: Some(90.0),
                ..VisualMetadataPatch::default()
            },
        },
    ];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert_eq!(result.delta.attachments_added, vec![image_id]);
    assert!(result.delta.metadata_updated.is_empty());
    assert_eq!(
        document.visual_metadata(image_id).expect("metadata").rotation(),
        90.0
    );
}

#[test]
fn insert_then_delete_in_one_batch_reports_removal() {
    let mut document = plain_document();
    let image_id = ImageId::new_v4();

    let ops = [
        DocOp::InsertImage {
            image_id,
            at: 0,
            source: source(64.0, 64.0),
            container_width: 400.0,
        },
        DocOp::DeleteAttachment { image_id },
    ];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert!(result.delta.attachments_added.is_empty());
    assert_eq!(result.delta.attachments_removed, vec![image_id]);
    assert!(document.visual_metadata(image_id).is_none());
    assert!(!document.styled_text().contains_image(image_id));
}

#[test]
fn update_image_metadata_applies_patch_under_lock() {
    let (mut document, image_id) = document_with_image();

    let ops = [DocOp::UpdateImageMetadata {
        image_id,
        patch: VisualMetadataPatch {
            width: Some(500.0),
            ..VisualMetadataPatch::default()
        },
    }];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");
    assert_eq!(result.delta.metadata_updated, vec![image_id]);

    let metadata = document.visual_metadata(image_id).expect("metadata");
    assert_eq!(metadata.width(), 500.0);
    assert_eq!(metadata.height(), 250.0);
}

#[test]
fn unknown_image_is_an_error() {
    let mut document = plain_document();
    let missing = ImageId::new_v4();

    let update = [DocOp::UpdateImageMetadata {
        image_id: missing,
        patch: VisualMetadataPatch::default(),
    }];
    match apply_ops(&mut document, 0, &update) {
        Err(ApplyError::UnknownImage { image_id }) => assert_eq!(image_id, missing),
        other => panic!("expected UnknownImage, got: {other:?}"),
    }

    let delete = [DocOp::DeleteAttachment { image_id: missing }];
    match apply_ops(&mut document, 0, &delete) {
        Err(ApplyError::UnknownImage { .. }) => {}
        other => panic!("expected UnknownImage, got: {other:?}"),
    }
}

#[test]
fn reset_all_restores_insertion_state() {
    let (mut document, image_id) = document_with_image();
    let pristine = document.visual_metadata(image_id).expect("metadata").clone();

    let mutate = [DocOp::UpdateImageMetadata {
        image_id,
        patch: VisualMetadataPatch {
            lock_aspect_ratio: Some(false),
            width: Some(40.0),
            height: Some(90.0),
            rotation: Some(45.0),
            opacity: Some(0.25),
            show_border: Some(true),
            ..VisualMetadataPatch::default()
        },
    }];
    apply_ops(&mut document, 0, &mutate).expect("mutate");
    assert_ne!(
        document.visual_metadata(image_id).expect("metadata"),
        &pristine
    );

    let reset = [DocOp::ResetImageMetadata {
        image_id,
        scope: ResetScope::All,
    }];
    apply_ops(&mut document, 1, &reset).expect("reset");
    assert_eq!(
        document.visual_metadata(image_id).expect("metadata"),
        &pristine
    );
}

#[test]
fn set_list_marker_inserts_carrier_in_empty_paragraph() {
    let mut document = Document::with_text(StyledText::from_plain("a\n\nb"));
    let len = document.styled_text().char_len();

    let ops = [DocOp::SetListMarker {
        start: 0,
        end: len,
        marker: Some(ListMarkerFormat::Bullet),
    }];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert!(result.delta.text_changed);
    assert!(result.delta.style_changed);
    assert_eq!(document.styled_text().plain_text(), "a\n\u{200B}\nb");
    for pos in [0, 2, 4] {
        assert_eq!(
            document.styled_text().paragraph_style_at(pos).list_marker,
            Some(ListMarkerFormat::Bullet),
            "paragraph at {pos}"
        );
    }
}

#[test]
fn set_alignment_expands_caret_to_paragraph() {
    let mut document = Document::with_text(StyledText::from_plain("one\ntwo"));

    let ops = [DocOp::SetAlignment {
        start: 5,
        end: 5,
        alignment: Alignment::Center,
    }];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert!(result.delta.style_changed);
    assert!(!result.delta.text_changed);
    assert_eq!(
        document.styled_text().paragraph_style_at(0).alignment,
        Alignment::Left
    );
    assert_eq!(
        document.styled_text().paragraph_style_at(5).alignment,
        Alignment::Center
    );
}

#[test]
fn apply_text_style_patches_range() {
    let mut document = Document::with_text(StyledText::from_plain("styled text"));

    let ops = [DocOp::ApplyTextStyle {
        start: 0,
        end: 6,
        patch: TextStylePatch {
            underline: Some(true),
            ..TextStylePatch::default()
        },
    }];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert!(result.delta.style_changed);
    let runs = document.styled_text().runs();
    assert_eq!(runs.len(), 2);
    assert!(runs[0].style.underline);
    assert!(!runs[1].style.underline);
}

#[test]
fn replace_swallowing_attachment_drops_it_and_its_record() {
    let (mut document, image_id) = document_with_image();
    assert!(document.styled_text().contains_image(image_id));

    let ops = [DocOp::ReplaceText {
        start: 5,
        end: 10,
        text: "X".to_owned(),
    }];
    let result = apply_ops(&mut document, 0, &ops).expect("apply");

    assert_eq!(result.delta.attachments_removed, vec![image_id]);
    assert!(!document.styled_text().contains_image(image_id));
    assert!(document.visual_metadata(image_id).is_none());
}

#[test]
fn image_bytes_are_shared_not_copied() {
    let mut document = plain_document();
    let bytes: Arc<[u8]> = png_stub();
    let image_id = ImageId::new_v4();

    let ops = [DocOp::InsertImage {
        image_id,
        at: 0,
        source: ImageSource {
            bytes: Arc::clone(&bytes),
            pixel_size: Size::new(32.0, 32.0),
        },
        container_width: 400.0,
    }];
    apply_ops(&mut document, 0, &ops).expect("apply");

    let attachment = document
        .styled_text()
        .attachments()
        .next()
        .expect("attachment");
    assert!(Arc::ptr_eq(attachment.contents().expect("contents"), &bytes));
}
