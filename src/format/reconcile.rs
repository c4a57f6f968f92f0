// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::model::{AttachmentBinding, ImageId, StyledText, VisualMetadata};

use super::naming::image_id_from_file_name;

/// What the binding pass did. Attachments it could not match stay unbound
/// and keep rendering as plain images; that is degradation, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Ids newly bound in this pass, in document order.
    pub bound: Vec<ImageId>,
    /// File names that resolved to no metadata record.
    pub unmatched: Vec<SmolStr>,
}

/// Binds decoded attachments to their metadata records by file name.
///
/// Each unbound attachment's name is parsed back to an image id; if the
/// metadata table has a record under that id the attachment is bound to it.
/// Already-bound attachments are left alone, so running the pass again never
/// rewraps anything.
pub fn bind_attachments(
    text: &mut StyledText,
    metadata: &BTreeMap<ImageId, VisualMetadata>,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    for attachment in text.attachments_mut() {
        if attachment.binding() != AttachmentBinding::Unbound {
            continue;
        }
        match image_id_from_file_name(attachment.file_name()) {
            Some(id) if metadata.contains_key(&id) => {
                attachment.bind(id);
                outcome.bound.push(id);
            }
            _ => outcome.unmatched.push(SmolStr::new(attachment.file_name())),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::naming::asset_file_name;
    use crate::model::{InlineAttachment, Size};

    fn table_with(id: ImageId) -> BTreeMap<ImageId, VisualMetadata> {
        let mut table = BTreeMap::new();
        table.insert(
            id,
            VisualMetadata::for_inserted_image(id, Size::new(100.0, 100.0), 400.0),
        );
        table
    }

    #[test]
    fn binds_named_attachment_to_its_record() {
        let id = ImageId::new_v4();
        let mut text = StyledText::new();
        text.insert_attachment(0, InlineAttachment::new_unbound(asset_file_name(id)));

        let outcome = bind_attachments(&mut text, &table_with(id));
        assert_eq!(outcome.bound, vec![id]);
        assert!(outcome.unmatched.is_empty());
        assert_eq!(text.referenced_image_ids(), vec![id]);
    }

    #[test]
    fn unknown_names_stay_unbound() {
        let id = ImageId::new_v4();
        let mut text = StyledText::new();
        text.insert_attachment(0, InlineAttachment::new_unbound("image_garbage.png"));
        text.insert_attachment(1, InlineAttachment::new_unbound(asset_file_name(ImageId::new_v4())));

        let outcome = bind_attachments(&mut text, &table_with(id));
        assert!(outcome.bound.is_empty());
        assert_eq!(outcome.unmatched.len(), 2);
        assert!(text.referenced_image_ids().is_empty());
    }

    #[test]
    fn rebinding_is_a_no_op() {
        let id = ImageId::new_v4();
        let table = table_with(id);
        let mut text = StyledText::new();
        text.insert_attachment(0, InlineAttachment::new_unbound(asset_file_name(id)));

        let first = bind_attachments(&mut text, &table);
        assert_eq!(first.bound, vec![id]);
        let second = bind_attachments(&mut text, &table);
        assert!(second.bound.is_empty());
        assert!(second.unmatched.is_empty());
    }
}
