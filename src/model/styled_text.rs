// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Run-based rich text. A [`StyledText`] is a flat sequence of runs, each
//! carrying character and paragraph style; inline images sit in the sequence
//! as single-character attachment runs. All positions are character offsets,
//! an attachment counting as one character.

use std::sync::Arc;

use smallvec::SmallVec;
use smol_str::SmolStr;

use super::ids::ImageId;
use super::text_style::{ParagraphStyle, TextStyle};

/// Placeholder character an attachment occupies in the plain-text view.
pub const ATTACHMENT_CHAR: char = '\u{FFFC}';

/// Invisible carrier character that keeps list markers alive in otherwise
/// empty paragraphs.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Binding state of an inline attachment. Freshly decoded attachments start
/// unbound; reconciliation promotes those whose file name resolves to a
/// metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentBinding {
    Unbound,
    Bound(ImageId),
}

/// An image embedded in the text flow. The file name is the package member
/// the bytes live under; `contents` holds the bytes once they have been read
/// or supplied at insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineAttachment {
    file_name: SmolStr,
    binding: AttachmentBinding,
    contents: Option<Arc<[u8]>>,
}

impl InlineAttachment {
    pub fn new_unbound(file_name: impl Into<SmolStr>) -> Self {
        Self {
            file_name: file_name.into(),
            binding: AttachmentBinding::Unbound,
            contents: None,
        }
    }

    pub fn new_bound(
        id: ImageId,
        file_name: impl Into<SmolStr>,
        contents: Option<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            binding: AttachmentBinding::Bound(id),
            contents,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn binding(&self) -> AttachmentBinding {
        self.binding
    }

    /// Bound image id, if reconciliation has run.
    pub fn image_id(&self) -> Option<ImageId> {
        match self.binding {
            AttachmentBinding::Bound(id) => Some(id),
            AttachmentBinding::Unbound => None,
        }
    }

    pub fn contents(&self) -> Option<&Arc<[u8]>> {
        self.contents.as_ref()
    }

    pub fn bind(&mut self, id: ImageId) {
        self.binding = AttachmentBinding::Bound(id);
    }

    pub fn set_contents(&mut self, contents: Option<Arc<[u8]>>) {
        self.contents = contents;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Attachment(InlineAttachment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub content: RunContent,
    pub style: TextStyle,
    pub paragraph: ParagraphStyle,
}

impl TextRun {
    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        Self {
            content: RunContent::Text(content.into()),
            style,
            paragraph: ParagraphStyle::default(),
        }
    }

    pub fn attachment(attachment: InlineAttachment, style: TextStyle) -> Self {
        Self {
            content: RunContent::Attachment(attachment),
            style,
            paragraph: ParagraphStyle::default(),
        }
    }

    /// Length in characters; an attachment is one character.
    pub fn char_len(&self) -> usize {
        match &self.content {
            RunContent::Text(text) => text.chars().count(),
            RunContent::Attachment(_) => 1,
        }
    }

    fn is_empty_text(&self) -> bool {
        matches!(&self.content, RunContent::Text(text) if text.is_empty())
    }

    fn can_merge(&self, other: &Self) -> bool {
        matches!(&self.content, RunContent::Text(_))
            && matches!(&other.content, RunContent::Text(_))
            && self.style == other.style
            && self.paragraph == other.paragraph
    }
}

/// The text flow of a document.
///
/// Invariants kept by every mutator: no empty text runs, and no two adjacent
/// text runs with identical character and paragraph style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledText {
    runs: Vec<TextRun>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single run of plain text in the default style.
    pub fn from_plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::new();
        }
        Self {
            runs: vec![TextRun::text(text, TextStyle::default())],
        }
    }

    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        let mut styled = Self { runs };
        styled.coalesce();
        styled
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(TextRun::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Plain-text view with [`ATTACHMENT_CHAR`] standing in for images.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match &run.content {
                RunContent::Text(text) => out.push_str(text),
                RunContent::Attachment(_) => out.push(ATTACHMENT_CHAR),
            }
        }
        out
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        let mut acc = 0;
        for run in &self.runs {
            let span = run.char_len();
            if pos < acc + span {
                return match &run.content {
                    RunContent::Text(text) => text.chars().nth(pos - acc),
                    RunContent::Attachment(_) => Some(ATTACHMENT_CHAR),
                };
            }
            acc += span;
        }
        None
    }

    /// Paragraph style governing the character at `pos` (or the last run for
    /// the end-of-text position).
    pub fn paragraph_style_at(&self, pos: usize) -> ParagraphStyle {
        let mut acc = 0;
        for run in &self.runs {
            let span = run.char_len();
            if pos < acc + span {
                return run.paragraph;
            }
            acc += span;
        }
        self.runs.last().map(|run| run.paragraph).unwrap_or_default()
    }

    /// Replaces the characters in `start..end` with `text`, which inherits
    /// the style in effect just before the insertion point.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let len = self.char_len();
        assert!(start <= end && end <= len, "range {start}..{end} out of bounds for length {len}");

        let (style, paragraph) = self.inherited_style(start);
        let from = self.ensure_boundary(start);
        let to = self.ensure_boundary(end);
        self.runs.drain(from..to);
        if !text.is_empty() {
            self.runs.insert(
                from,
                TextRun {
                    content: RunContent::Text(text.to_string()),
                    style,
                    paragraph,
                },
            );
        }
        self.coalesce();
    }

    pub fn delete_range(&mut self, start: usize, end: usize) {
        self.replace_range(start, end, "");
    }

    /// Inserts an attachment run at `at`, inheriting the surrounding style.
    pub fn insert_attachment(&mut self, at: usize, attachment: InlineAttachment) {
        let len = self.char_len();
        assert!(at <= len, "position {at} out of bounds for length {len}");

        let (style, paragraph) = self.inherited_style(at);
        let idx = self.ensure_boundary(at);
        self.runs.insert(
            idx,
            TextRun {
                content: RunContent::Attachment(attachment),
                style,
                paragraph,
            },
        );
    }

    /// Applies `apply` to the character style of every run in `start..end`.
    pub fn apply_text_style(
        &mut self,
        start: usize,
        end: usize,
        apply: impl Fn(&mut TextStyle),
    ) {
        let len = self.char_len();
        assert!(start <= end && end <= len, "range {start}..{end} out of bounds for length {len}");
        if start == end {
            return;
        }

        let from = self.ensure_boundary(start);
        let to = self.ensure_boundary(end);
        for run in &mut self.runs[from..to] {
            apply(&mut run.style);
        }
        self.coalesce();
    }

    /// Applies `apply` to the paragraph style of every run in `start..end`.
    /// Callers expand the range to whole paragraphs first.
    pub fn apply_paragraph_style(
        &mut self,
        start: usize,
        end: usize,
        apply: impl Fn(&mut ParagraphStyle),
    ) {
        let len = self.char_len();
        assert!(start <= end && end <= len, "range {start}..{end} out of bounds for length {len}");
        if start == end {
            return;
        }

        let from = self.ensure_boundary(start);
        let to = self.ensure_boundary(end);
        for run in &mut self.runs[from..to] {
            apply(&mut run.paragraph);
        }
        self.coalesce();
    }

    /// Expands `start..end` to cover whole paragraphs: back to the character
    /// after the preceding newline, forward through the terminating newline
    /// (or the end of text).
    pub fn paragraph_block(&self, start: usize, end: usize) -> (usize, usize) {
        let chars: Vec<char> = self.plain_text().chars().collect();
        let block_start = chars[..start.min(chars.len())]
            .iter()
            .rposition(|&ch| ch == '\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let mut block_end = end.min(chars.len());
        while block_end < chars.len() {
            let ch = chars[block_end];
            block_end += 1;
            if ch == '\n' {
                break;
            }
        }
        (block_start, block_end)
    }

    /// Start positions of empty paragraphs inside `start..end`. A paragraph
    /// is empty when its newline (or the text end) follows the previous
    /// boundary immediately.
    pub fn empty_paragraph_positions(&self, start: usize, end: usize) -> SmallVec<[usize; 4]> {
        let chars: Vec<char> = self.plain_text().chars().collect();
        let mut positions = SmallVec::new();
        let mut para_start = 0usize;
        for (idx, &ch) in chars.iter().enumerate() {
            if ch == '\n' {
                if para_start == idx && para_start >= start && para_start < end.max(start + 1) {
                    positions.push(para_start);
                }
                para_start = idx + 1;
            }
        }
        if para_start == chars.len() && para_start >= start && para_start <= end {
            positions.push(para_start);
        }
        positions.retain(|&mut pos| pos >= start && pos <= end);
        positions
    }

    /// Removes the attachment bound to `id`. Returns the attachment if it was
    /// present.
    pub fn remove_attachment(&mut self, id: ImageId) -> Option<InlineAttachment> {
        let idx = self.runs.iter().position(|run| {
            matches!(&run.content, RunContent::Attachment(att) if att.image_id() == Some(id))
        })?;
        let run = self.runs.remove(idx);
        self.coalesce();
        match run.content {
            RunContent::Attachment(att) => Some(att),
            RunContent::Text(_) => unreachable!("position matched an attachment run"),
        }
    }

    pub fn attachments(&self) -> impl Iterator<Item = &InlineAttachment> {
        self.runs.iter().filter_map(|run| match &run.content {
            RunContent::Attachment(att) => Some(att),
            RunContent::Text(_) => None,
        })
    }

    pub fn attachments_mut(&mut self) -> impl Iterator<Item = &mut InlineAttachment> {
        self.runs.iter_mut().filter_map(|run| match &mut run.content {
            RunContent::Attachment(att) => Some(att),
            RunContent::Text(_) => None,
        })
    }

    /// Ids of all bound attachments, in document order.
    pub fn referenced_image_ids(&self) -> Vec<ImageId> {
        self.attachments()
            .filter_map(InlineAttachment::image_id)
            .collect()
    }

    pub fn contains_image(&self, id: ImageId) -> bool {
        self.attachments().any(|att| att.image_id() == Some(id))
    }

    /// Style inherited by content inserted at `pos`: the style of the
    /// character before it, falling back to the character at `pos`, then to
    /// the default.
    fn inherited_style(&self, pos: usize) -> (TextStyle, ParagraphStyle) {
        let probe = if pos > 0 { pos - 1 } else { 0 };
        let mut acc = 0;
        for run in &self.runs {
            let span = run.char_len();
            if probe < acc + span {
                return (run.style.clone(), run.paragraph);
            }
            acc += span;
        }
        match self.runs.last() {
            Some(run) => (run.style.clone(), run.paragraph),
            None => (TextStyle::default(), ParagraphStyle::default()),
        }
    }

    /// Makes `pos` a run boundary and returns the index of the run starting
    /// there (or `runs.len()` for the end of text).
    fn ensure_boundary(&mut self, pos: usize) -> usize {
        let mut acc = 0;
        for idx in 0..self.runs.len() {
            let span = self.runs[idx].char_len();
            if acc == pos {
                return idx;
            }
            if pos < acc + span {
                // Attachments span one character, so an interior position can
                // only land inside a text run.
                let offset = pos - acc;
                let (tail, style, paragraph) = {
                    let run = &mut self.runs[idx];
                    let RunContent::Text(text) = &mut run.content else {
                        unreachable!("interior position inside a single-character run");
                    };
                    let byte = byte_offset_of_char(text, offset);
                    (text.split_off(byte), run.style.clone(), run.paragraph)
                };
                self.runs.insert(
                    idx + 1,
                    TextRun {
                        content: RunContent::Text(tail),
                        style,
                        paragraph,
                    },
                );
                return idx + 1;
            }
            acc += span;
        }
        self.runs.len()
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.is_empty_text() {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if last.can_merge(&run) {
                    if let (RunContent::Text(dst), RunContent::Text(src)) =
                        (&mut last.content, &run.content)
                    {
                        dst.push_str(src);
                        continue;
                    }
                }
            }
            merged.push(run);
        }
        self.runs = merged;
    }
}

fn byte_offset_of_char(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
