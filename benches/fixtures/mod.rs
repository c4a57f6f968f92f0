// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use proteus::model::{Document, RunContent, StyledText};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("proteus_bench_{prefix}_{pid}_{nanos}_{counter}"));
        std::fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn ascii_repeat_to_len(prefix: &str, fill: char, target_len: usize) -> String {
    if prefix.len() >= target_len {
        return prefix[..target_len].to_owned();
    }

    let mut out = String::with_capacity(target_len);
    out.push_str(prefix);
    while out.len() < target_len {
        out.push(fill);
    }
    out
}

pub fn checksum_text(text: &StyledText) -> u64 {
    let mut acc = 0u64;
    for run in text.runs() {
        match &run.content {
            RunContent::Text(content) => {
                acc = acc.wrapping_mul(131).wrapping_add(content.len() as u64);
                acc = acc
                    .wrapping_mul(131)
                    .wrapping_add(run.style.font_family.len() as u64);
                acc = acc
                    .wrapping_mul(131)
                    .wrapping_add((run.style.font_size * 2.0) as u64);
                acc = acc
                    .wrapping_mul(131)
                    .wrapping_add(u64::from(run.style.underline));
            }
            RunContent::Attachment(attachment) => {
                acc = acc
                    .wrapping_mul(131)
                    .wrapping_add(attachment.file_name().len() as u64);
            }
        }
    }
    acc
}

pub fn checksum_document(document: &Document) -> u64 {
    let mut acc = checksum_text(document.styled_text());
    acc = acc
        .wrapping_mul(131)
        .wrapping_add(document.metadata().len() as u64);
    acc = acc.wrapping_mul(131).wrapping_add(document.rev());
    acc
}

pub mod doc {
    use super::*;

    use proteus::format::asset_file_name;
    use proteus::model::{
        FontWeight, ImageId, InlineAttachment, ListMarkerFormat, Rgba, Size, TextRun, TextStyle,
        VisualMetadata, ZERO_WIDTH_SPACE,
    };
    use uuid::Uuid;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Params {
        pub paragraphs: usize,
        pub paragraph_len: usize,
        /// Every nth paragraph gets a heavier weight and a color; 0 disables.
        pub styled_every: usize,
        /// Every nth paragraph becomes a bullet item; 0 disables.
        pub listed_every: usize,
        pub images: usize,
    }

    impl Params {
        pub const fn new(
            paragraphs: usize,
            paragraph_len: usize,
            styled_every: usize,
            listed_every: usize,
            images: usize,
        ) -> Self {
            Self {
                paragraphs,
                paragraph_len,
                styled_every,
                listed_every,
                images,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Small,
        Medium,
        LargeStyled,
    }

    impl Case {
        pub const fn id(self) -> &'static str {
            match self {
                Self::Small => "small",
                Self::Medium => "medium",
                Self::LargeStyled => "large_styled",
            }
        }

        pub const fn params(self) -> Params {
            match self {
                Self::Small => Params::new(6, 40, 0, 0, 0),
                Self::Medium => Params::new(48, 120, 3, 7, 4),
                Self::LargeStyled => Params::new(400, 200, 2, 5, 16),
            }
        }
    }

    fn image_id(index: usize) -> ImageId {
        // Stable ids so asset names and metadata order never vary between runs.
        let base = 0xB0B0_0000_0000_4000_8000_0000_0000_0000u128;
        ImageId::from_uuid(Uuid::from_u128(base + index as u128))
    }

    fn image_bytes(index: usize) -> Arc<[u8]> {
        let mut bytes = Vec::with_capacity(4 * 1024 + 9);
        bytes.extend_from_slice(b"\x89PNG\r\n\x1a\n");
        while bytes.len() < 4 * 1024 {
            bytes.extend_from_slice(b"bench-image-payload-");
        }
        bytes.push(index as u8);
        Arc::from(bytes)
    }

    pub fn styled_text(params: Params) -> StyledText {
        let mut runs = Vec::with_capacity(params.paragraphs);
        for index in 0..params.paragraphs {
            let base = format!("Paragraph {index:04} ");
            let mut content = ascii_repeat_to_len(&base, 'x', params.paragraph_len);
            content.push('\n');

            let mut style = TextStyle::default();
            if params.styled_every != 0 && index % params.styled_every == 0 {
                style.font_weight = FontWeight::Semibold;
                style.color = Rgba::new(0.8, 0.1, 0.1, 1.0);
            }

            let mut run = TextRun::text(content, style);
            if params.listed_every != 0 && index % params.listed_every == 0 {
                run.paragraph.list_marker = Some(ListMarkerFormat::Bullet);
            }
            runs.push(run);
        }
        StyledText::from_runs(runs)
    }

    /// Like [`styled_text`] but with zero-width debris sprinkled into every
    /// paragraph, for exercising the sanitation pass.
    pub fn styled_text_with_debris(params: Params) -> StyledText {
        let mut text = styled_text(params);
        let debris = ZERO_WIDTH_SPACE.to_string();
        let step = (params.paragraph_len + 1).max(2);
        let mut at = step / 2;
        while at < text.char_len() {
            text.replace_range(at, at, &debris);
            at += step;
        }
        text
    }

    pub fn document(params: Params) -> Document {
        let mut document = Document::with_text(styled_text(params));
        let total = document.styled_text().char_len();
        for index in 0..params.images {
            let id = image_id(index);
            let at = (index + 1) * total / (params.images + 1);
            document.styled_text_mut().insert_attachment(
                at,
                InlineAttachment::new_bound(id, asset_file_name(id), Some(image_bytes(index))),
            );
            document.insert_visual_metadata(VisualMetadata::for_inserted_image(
                id,
                Size::new(800.0, 600.0),
                500.0,
            ));
        }
        document
    }

    pub fn fixture(case: Case) -> Document {
        document(case.params())
    }
}
