// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use memchr::memmem;
use smallvec::SmallVec;

use crate::model::{StyledText, ZERO_WIDTH_SPACE};

/// UTF-8 encoding of [`ZERO_WIDTH_SPACE`].
const ZWS_UTF8: &[u8] = "\u{200B}".as_bytes();

/// Strips stray zero-width spaces from the text.
///
/// The editor plants a zero-width space in otherwise-empty list paragraphs
/// so the line keeps its marker; those carriers stay. A zero-width space in
/// a paragraph with real (non-whitespace) content is editing debris and is
/// deleted, in reverse order so earlier positions stay valid. Running the
/// pass twice changes nothing.
///
/// Returns the number of characters removed.
pub fn strip_stray_zero_width_spaces(text: &mut StyledText) -> usize {
    let plain = text.plain_text();
    if memmem::find(plain.as_bytes(), ZWS_UTF8).is_none() {
        return 0;
    }

    let chars: Vec<char> = plain.chars().collect();
    let mut doomed: SmallVec<[usize; 8]> = SmallVec::new();
    let mut para_start = 0usize;
    let mut scan = 0usize;
    while scan <= chars.len() {
        let at_break = scan == chars.len() || chars[scan] == '\n';
        if at_break {
            let para = &chars[para_start..scan];
            let has_content = para
                .iter()
                .any(|&ch| ch != ZERO_WIDTH_SPACE && !ch.is_whitespace());
            if has_content {
                for (offset, &ch) in para.iter().enumerate() {
                    if ch == ZERO_WIDTH_SPACE {
                        doomed.push(para_start + offset);
                    }
                }
            }
            para_start = scan + 1;
        }
        scan += 1;
    }

    for &pos in doomed.iter().rev() {
        text.delete_range(pos, pos + 1);
    }
    doomed.len()
}
