// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Body codec for the `TXT.rtf` package member.
//!
//! The writer emits a small, fixed RTF subset: font and color tables in the
//! header, one `\pard` intro per paragraph, run-level character deltas and
//! `NeXTGraphic` groups for attachments. The reader is deliberately more
//! tolerant than the writer: unknown control words are skipped, unknown
//! `{\*...}` destinations are dropped whole, and both `\'hh` and `\uN`
//! escapes are accepted even though the writer never produces them.

use std::collections::BTreeMap;
use std::fmt;

use memchr::{memchr2, memchr3};
use smol_str::SmolStr;

use crate::model::{
    Alignment, FontWeight, ImageId, InlineAttachment, ListMarkerFormat, ParagraphStyle, Rgba,
    RunContent, StyledText, TextRun, TextStyle, VisualMetadata,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtfParseError {
    MissingHeader,
    UnbalancedGroup { pos: usize },
    InvalidEscape { pos: usize },
}

impl fmt::Display for RtfParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => f.write_str("expected '{\\rtf1' at the start of the body"),
            Self::UnbalancedGroup { pos } => {
                write!(f, "unbalanced group at byte {pos}")
            }
            Self::InvalidEscape { pos } => {
                write!(f, "invalid control sequence at byte {pos}")
            }
        }
    }
}

impl std::error::Error for RtfParseError {}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    GroupOpen,
    GroupClose,
    ControlWord { word: &'a str, param: Option<i32> },
    ControlSymbol(char),
    HexByte(u8),
    Text(&'a str),
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, RtfParseError> {
        loop {
            let rest = &self.input[self.pos..];
            let Some(ch) = rest.chars().next() else {
                return Ok(None);
            };
            match ch {
                // Raw line breaks are writer cosmetics, not content.
                '\r' | '\n' => self.pos += 1,
                '{' => {
                    self.pos += 1;
                    return Ok(Some(Token::GroupOpen));
                }
                '}' => {
                    self.pos += 1;
                    return Ok(Some(Token::GroupClose));
                }
                '\\' => return self.control(rest).map(Some),
                _ => {
                    // All delimiters are ASCII, so the byte index is a char
                    // boundary.
                    let bytes = rest.as_bytes();
                    let structural = memchr3(b'\\', b'{', b'}', bytes);
                    let line_break = memchr2(b'\r', b'\n', bytes);
                    let end = match (structural, line_break) {
                        (Some(a), Some(b)) => a.min(b),
                        (Some(a), None) => a,
                        (None, Some(b)) => b,
                        (None, None) => rest.len(),
                    };
                    self.pos += end;
                    return Ok(Some(Token::Text(&rest[..end])));
                }
            }
        }
    }

    fn control(&mut self, rest: &'a str) -> Result<Token<'a>, RtfParseError> {
        let start = self.pos;
        let after = &rest[1..];
        let Some(first) = after.chars().next() else {
            return Err(RtfParseError::InvalidEscape { pos: start });
        };

        if first.is_ascii_alphabetic() {
            let bytes = after.as_bytes();
            let word_len = bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count();
            let word = &after[..word_len];

            let mut cursor = word_len;
            let negative = bytes.get(cursor) == Some(&b'-');
            let digits_from = cursor + usize::from(negative);
            let mut digits_to = digits_from;
            while bytes.get(digits_to).is_some_and(u8::is_ascii_digit) {
                digits_to += 1;
            }
            let param = if digits_to > digits_from {
                let parsed = after[cursor..digits_to].parse::<i32>().ok();
                cursor = digits_to;
                parsed
            } else {
                None
            };
            // One space after a control word is the delimiter, not content.
            if bytes.get(cursor) == Some(&b' ') {
                cursor += 1;
            }
            self.pos += 1 + cursor;
            return Ok(Token::ControlWord { word, param });
        }

        if first == '\'' {
            let hex = after
                .get(1..3)
                .ok_or(RtfParseError::InvalidEscape { pos: start })?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| RtfParseError::InvalidEscape { pos: start })?;
            self.pos += 4;
            return Ok(Token::HexByte(byte));
        }

        self.pos += 1 + first.len_utf8();
        Ok(Token::ControlSymbol(first))
    }
}

struct TokenStream<'a> {
    tokenizer: Tokenizer<'a>,
    peeked: Option<Token<'a>>,
}

impl<'a> TokenStream<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            peeked: None,
        }
    }

    fn next(&mut self) -> Result<Option<Token<'a>>, RtfParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        self.tokenizer.next_token()
    }

    fn peek(&mut self) -> Result<Option<Token<'a>>, RtfParseError> {
        if self.peeked.is_none() {
            self.peeked = self.tokenizer.next_token()?;
        }
        Ok(self.peeked)
    }

    fn pos(&self) -> usize {
        self.tokenizer.pos
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct FontFace {
    family: SmolStr,
    weight: FontWeight,
}

struct ReaderState {
    runs: Vec<TextRun>,
    style: TextStyle,
    paragraph: ParagraphStyle,
    stack: Vec<TextStyle>,
    fonts: BTreeMap<i32, FontFace>,
    colors: Vec<Option<Rgba>>,
    uc_skip: i32,
    pending_skip: i32,
}

impl ReaderState {
    fn new() -> Self {
        Self {
            runs: Vec::new(),
            style: TextStyle::default(),
            paragraph: ParagraphStyle::default(),
            stack: Vec::new(),
            fonts: BTreeMap::new(),
            colors: Vec::new(),
            uc_skip: 1,
            pending_skip: 0,
        }
    }

    fn push_char(&mut self, ch: char) {
        if let Some(TextRun {
            content: RunContent::Text(content),
            style,
            paragraph,
        }) = self.runs.last_mut()
        {
            if *style == self.style && *paragraph == self.paragraph {
                content.push(ch);
                return;
            }
        }
        self.runs.push(TextRun {
            content: RunContent::Text(ch.to_string()),
            style: self.style.clone(),
            paragraph: self.paragraph,
        });
    }

    fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if self.pending_skip > 0 {
                self.pending_skip -= 1;
                continue;
            }
            self.push_char(ch);
        }
    }

    fn push_hex(&mut self, byte: u8) {
        if self.pending_skip > 0 {
            self.pending_skip -= 1;
            return;
        }
        // Latin-1 view of the byte; good enough for the bytes we meet.
        self.push_char(char::from(byte));
    }

    fn push_attachment(&mut self, attachment: InlineAttachment) {
        self.runs.push(TextRun {
            content: RunContent::Attachment(attachment),
            style: self.style.clone(),
            paragraph: self.paragraph,
        });
    }

    fn resolve_color(&self, index: i32) -> Rgba {
        if index <= 0 {
            return Rgba::BLACK;
        }
        self.colors
            .get(index as usize)
            .copied()
            .flatten()
            .unwrap_or(Rgba::BLACK)
    }

    fn control(&mut self, word: &str, param: Option<i32>) {
        match word {
            "par" => self.push_char('\n'),
            "pard" => self.paragraph = ParagraphStyle::default(),
            "ql" => self.paragraph.alignment = Alignment::Left,
            "qc" => self.paragraph.alignment = Alignment::Center,
            "qr" => self.paragraph.alignment = Alignment::Right,
            "qj" => self.paragraph.alignment = Alignment::Justified,
            "f" => {
                if let Some(face) = param.and_then(|idx| self.fonts.get(&idx)) {
                    self.style.font_family = face.family.clone();
                    self.style.font_weight = face.weight;
                }
            }
            "fs" => {
                if let Some(half_points) = param {
                    self.style.font_size = half_points as f32 / 2.0;
                }
            }
            "cf" => {
                if let Some(index) = param {
                    self.style.color = self.resolve_color(index);
                }
            }
            "ul" => self.style.underline = param != Some(0),
            "ulnone" => self.style.underline = false,
            "strike" => self.style.strikethrough = param != Some(0),
            // Plain bold toggles map onto the weight bucket.
            "b" => {
                self.style.font_weight = if param == Some(0) {
                    FontWeight::Regular
                } else {
                    FontWeight::Bold
                };
            }
            "u" => {
                if let Some(code) = param {
                    let code = if code < 0 { code + 65536 } else { code };
                    let ch = u32::try_from(code)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or('\u{FFFD}');
                    self.push_char(ch);
                    self.pending_skip = self.uc_skip;
                }
            }
            "uc" => self.uc_skip = param.unwrap_or(1).max(0),
            _ => {}
        }
    }

    fn symbol(&mut self, ch: char) {
        match ch {
            '\\' | '{' | '}' => self.push_char(ch),
            '\n' | '\r' => self.push_char('\n'),
            '~' => self.push_char('\u{00A0}'),
            _ => {}
        }
    }
}

/// Parses a body produced by [`export_rtf`] or a reasonably close dialect.
/// Attachments come back unbound; binding them to metadata records is a
/// separate pass.
pub fn parse_rtf(input: &str) -> Result<StyledText, RtfParseError> {
    let mut tokens = TokenStream::new(input);
    match tokens.next()? {
        Some(Token::GroupOpen) => {}
        _ => return Err(RtfParseError::MissingHeader),
    }
    match tokens.next()? {
        Some(Token::ControlWord { word: "rtf", .. }) => {}
        _ => return Err(RtfParseError::MissingHeader),
    }

    let mut state = ReaderState::new();
    let mut depth = 1usize;
    loop {
        let Some(token) = tokens.next()? else {
            return Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() });
        };
        match token {
            Token::GroupOpen => match tokens.peek()? {
                Some(Token::ControlSymbol('*')) => {
                    tokens.next()?;
                    starred_destination(&mut tokens, &mut state)?;
                }
                Some(Token::ControlWord { word: "fonttbl", .. }) => {
                    tokens.next()?;
                    font_table(&mut tokens, &mut state)?;
                }
                Some(Token::ControlWord { word: "colortbl", .. }) => {
                    tokens.next()?;
                    color_table(&mut tokens, &mut state)?;
                }
                Some(Token::ControlWord {
                    word: "NeXTGraphic",
                    ..
                }) => {
                    tokens.next()?;
                    graphic(&mut tokens, &mut state)?;
                }
                _ => {
                    depth += 1;
                    state.stack.push(state.style.clone());
                }
            },
            Token::GroupClose => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                if let Some(previous) = state.stack.pop() {
                    state.style = previous;
                }
            }
            Token::ControlWord { word, param } => state.control(word, param),
            Token::ControlSymbol(ch) => state.symbol(ch),
            Token::HexByte(byte) => state.push_hex(byte),
            Token::Text(text) => state.push_text(text),
        }
    }

    Ok(StyledText::from_runs(state.runs))
}

/// Consumes tokens up to and including the close of the current group,
/// ignoring everything.
fn skip_group(tokens: &mut TokenStream<'_>) -> Result<(), RtfParseError> {
    let mut depth = 0usize;
    loop {
        match tokens.next()? {
            None => return Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() }),
            Some(Token::GroupOpen) => depth += 1,
            Some(Token::GroupClose) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Some(_) => {}
        }
    }
}

/// After `{\*`: list-numbering groups are understood, anything else is an
/// unknown destination and dropped whole.
fn starred_destination(
    tokens: &mut TokenStream<'_>,
    state: &mut ReaderState,
) -> Result<(), RtfParseError> {
    match tokens.next()? {
        None => Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() }),
        Some(Token::ControlWord { word: "pn", .. }) => list_numbering(tokens, state),
        Some(Token::GroupClose) => Ok(()),
        Some(_) => skip_group(tokens),
    }
}

fn list_numbering(
    tokens: &mut TokenStream<'_>,
    state: &mut ReaderState,
) -> Result<(), RtfParseError> {
    let mut depth = 0usize;
    let mut decimal = false;
    let mut bullet = false;
    let mut dash = false;
    loop {
        match tokens.next()? {
            None => return Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() }),
            Some(Token::GroupOpen) => depth += 1,
            Some(Token::GroupClose) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Some(Token::ControlWord { word, .. }) => match word {
                "pnlvlbody" | "pndec" => decimal = true,
                "bullet" => bullet = true,
                _ => {}
            },
            Some(Token::Text(text)) => {
                if text.trim() == "-" {
                    dash = true;
                }
            }
            Some(_) => {}
        }
    }
    let marker = if decimal {
        ListMarkerFormat::Decimal
    } else if dash && !bullet {
        ListMarkerFormat::Dash
    } else {
        ListMarkerFormat::Bullet
    };
    state.paragraph.list_marker = Some(marker);
    Ok(())
}

fn font_table(tokens: &mut TokenStream<'_>, state: &mut ReaderState) -> Result<(), RtfParseError> {
    fn flush(state: &mut ReaderState, current: &mut Option<i32>, name: &mut String) {
        let Some(index) = current.take() else {
            name.clear();
            return;
        };
        let face = name.trim().trim_end_matches(';').trim();
        if !face.is_empty() {
            let (family, weight) = match face.rsplit_once('-') {
                Some((family, suffix)) => match FontWeight::from_face_suffix(suffix) {
                    Some(weight) => (family, weight),
                    None => (face, FontWeight::Regular),
                },
                None => (face, FontWeight::Regular),
            };
            state.fonts.insert(
                index,
                FontFace {
                    family: SmolStr::new(family),
                    weight,
                },
            );
        }
        name.clear();
    }

    let mut depth = 0usize;
    let mut current: Option<i32> = None;
    let mut name = String::new();
    loop {
        match tokens.next()? {
            None => return Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() }),
            Some(Token::GroupOpen) => depth += 1,
            Some(Token::GroupClose) => {
                flush(state, &mut current, &mut name);
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Some(Token::ControlWord {
                word: "f",
                param: Some(index),
            }) => {
                flush(state, &mut current, &mut name);
                current = Some(index);
            }
            Some(Token::Text(text)) => name.push_str(text),
            Some(_) => {}
        }
    }
}

fn color_table(tokens: &mut TokenStream<'_>, state: &mut ReaderState) -> Result<(), RtfParseError> {
    fn to_rgba(components: (i32, i32, i32)) -> Rgba {
        Rgba::new(
            f64::from(components.0) / 255.0,
            f64::from(components.1) / 255.0,
            f64::from(components.2) / 255.0,
            1.0,
        )
    }

    let mut depth = 0usize;
    let mut current: Option<(i32, i32, i32)> = None;
    loop {
        match tokens.next()? {
            None => return Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() }),
            Some(Token::GroupOpen) => depth += 1,
            Some(Token::GroupClose) => {
                if depth == 0 {
                    if let Some(components) = current.take() {
                        state.colors.push(Some(to_rgba(components)));
                    }
                    return Ok(());
                }
                depth -= 1;
            }
            Some(Token::ControlWord { word, param }) => {
                let value = param.unwrap_or(0);
                match word {
                    "red" => current.get_or_insert((0, 0, 0)).0 = value,
                    "green" => current.get_or_insert((0, 0, 0)).1 = value,
                    "blue" => current.get_or_insert((0, 0, 0)).2 = value,
                    _ => {}
                }
            }
            Some(Token::Text(text)) => {
                for ch in text.chars() {
                    if ch == ';' {
                        state.colors.push(current.take().map(to_rgba));
                    }
                }
            }
            Some(_) => {}
        }
    }
}

/// `{\NeXTGraphic <name> \widthN \heightN}`: the name is all that matters,
/// the sizes are display hints the metadata table overrides anyway.
fn graphic(tokens: &mut TokenStream<'_>, state: &mut ReaderState) -> Result<(), RtfParseError> {
    let mut depth = 0usize;
    let mut name = String::new();
    loop {
        match tokens.next()? {
            None => return Err(RtfParseError::UnbalancedGroup { pos: tokens.pos() }),
            Some(Token::GroupOpen) => depth += 1,
            Some(Token::GroupClose) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Some(Token::Text(text)) => {
                if depth == 0 {
                    name.push_str(text);
                }
            }
            Some(_) => {}
        }
    }
    let trimmed = name.trim();
    if !trimmed.is_empty() {
        state.push_attachment(InlineAttachment::new_unbound(SmolStr::new(trimmed)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct CharState {
    font: usize,
    half_points: i32,
    color: usize,
    underline: bool,
    strikethrough: bool,
}

struct RtfWriter<'a> {
    out: String,
    faces: Vec<String>,
    colors: Vec<Rgba>,
    metadata: &'a BTreeMap<ImageId, VisualMetadata>,
    last: Option<CharState>,
    at_para_start: bool,
    pending_delimiter: bool,
}

fn face_name(style: &TextStyle) -> String {
    match style.font_weight.face_suffix() {
        Some(suffix) => format!("{}-{}", style.font_family, suffix),
        None => style.font_family.to_string(),
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
}

impl<'a> RtfWriter<'a> {
    fn new(text: &StyledText, metadata: &'a BTreeMap<ImageId, VisualMetadata>) -> Self {
        let mut faces: Vec<String> = Vec::new();
        let mut colors: Vec<Rgba> = Vec::new();
        for run in text.runs() {
            if matches!(run.content, RunContent::Text(_)) {
                let face = face_name(&run.style);
                if !faces.contains(&face) {
                    faces.push(face);
                }
                if !colors.contains(&run.style.color) {
                    colors.push(run.style.color);
                }
            }
        }
        if faces.is_empty() {
            faces.push(face_name(&TextStyle::default()));
        }
        if colors.is_empty() {
            colors.push(Rgba::BLACK);
        }
        Self {
            out: String::new(),
            faces,
            colors,
            metadata,
            last: None,
            at_para_start: true,
            pending_delimiter: false,
        }
    }

    fn header(&mut self) {
        let mut buf = itoa::Buffer::new();
        self.out.push_str("{\\rtf1\\ansi\\ansicpg1252\n");

        self.out.push_str("{\\fonttbl");
        for (index, face) in self.faces.iter().enumerate() {
            self.out.push_str("{\\f");
            self.out.push_str(buf.format(index));
            self.out.push(' ');
            self.out.push_str(face);
            self.out.push_str(";}");
        }
        self.out.push_str("}\n");

        self.out.push_str("{\\colortbl;");
        for color in &self.colors {
            self.out.push_str("\\red");
            self.out.push_str(buf.format(channel(color.red())));
            self.out.push_str("\\green");
            self.out.push_str(buf.format(channel(color.green())));
            self.out.push_str("\\blue");
            self.out.push_str(buf.format(channel(color.blue())));
            self.out.push(';');
        }
        self.out.push_str("}\n");
    }

    fn para_intro(&mut self, paragraph: ParagraphStyle) {
        self.out.push_str("\\pard");
        self.out.push_str(match paragraph.alignment {
            Alignment::Left => "\\ql",
            Alignment::Center => "\\qc",
            Alignment::Right => "\\qr",
            Alignment::Justified => "\\qj",
        });
        self.pending_delimiter = true;
        if let Some(marker) = paragraph.list_marker {
            self.out.push_str(match marker {
                ListMarkerFormat::Bullet => "{\\*\\pn\\pnlvlblt{\\pntxtb\\bullet}}",
                ListMarkerFormat::Dash => "{\\*\\pn\\pnlvlblt{\\pntxtb -}}",
                ListMarkerFormat::Decimal => "{\\*\\pn\\pnlvlbody\\pndec{\\pntxta .}}",
            });
            self.pending_delimiter = false;
        }
    }

    fn char_state(&mut self, style: &TextStyle) {
        let target = CharState {
            font: self
                .faces
                .iter()
                .position(|face| *face == face_name(style))
                .unwrap_or(0),
            half_points: (style.font_size * 2.0).round() as i32,
            color: self
                .colors
                .iter()
                .position(|color| *color == style.color)
                .map(|index| index + 1)
                .unwrap_or(0),
            underline: style.underline,
            strikethrough: style.strikethrough,
        };
        let mut buf = itoa::Buffer::new();
        match self.last {
            None => {
                self.out.push_str("\\f");
                self.out.push_str(buf.format(target.font));
                self.out.push_str("\\fs");
                self.out.push_str(buf.format(target.half_points));
                self.out.push_str("\\cf");
                self.out.push_str(buf.format(target.color));
                if target.underline {
                    self.out.push_str("\\ul");
                }
                if target.strikethrough {
                    self.out.push_str("\\strike");
                }
                self.pending_delimiter = true;
            }
            Some(last) if last == target => {}
            Some(last) => {
                if last.font != target.font {
                    self.out.push_str("\\f");
                    self.out.push_str(buf.format(target.font));
                }
                if last.half_points != target.half_points {
                    self.out.push_str("\\fs");
                    self.out.push_str(buf.format(target.half_points));
                }
                if last.color != target.color {
                    self.out.push_str("\\cf");
                    self.out.push_str(buf.format(target.color));
                }
                if last.underline != target.underline {
                    self.out
                        .push_str(if target.underline { "\\ul" } else { "\\ulnone" });
                }
                if last.strikethrough != target.strikethrough {
                    self.out
                        .push_str(if target.strikethrough { "\\strike" } else { "\\strike0" });
                }
                self.pending_delimiter = true;
            }
        }
        self.last = Some(target);
    }

    fn segment(&mut self, run: &TextRun, content: &str) {
        if content.is_empty() {
            return;
        }
        if self.at_para_start {
            self.para_intro(run.paragraph);
            self.at_para_start = false;
        }
        self.char_state(&run.style);
        if self.pending_delimiter {
            self.out.push(' ');
            self.pending_delimiter = false;
        }
        escape_into(&mut self.out, content);
    }

    fn attachment(&mut self, run: &TextRun, attachment: &InlineAttachment) {
        if self.at_para_start {
            self.para_intro(run.paragraph);
            self.at_para_start = false;
        }
        self.out.push_str("{{\\NeXTGraphic ");
        escape_into(&mut self.out, attachment.file_name());
        if let Some(meta) = attachment
            .image_id()
            .and_then(|id| self.metadata.get(&id))
        {
            let mut buf = itoa::Buffer::new();
            self.out.push_str(" \\width");
            self.out.push_str(buf.format(meta.width().round() as i64));
            self.out.push_str(" \\height");
            self.out.push_str(buf.format(meta.height().round() as i64));
        }
        self.out.push_str("}}");
        self.pending_delimiter = false;
    }

    fn body(&mut self, text: &StyledText) {
        for run in text.runs() {
            match &run.content {
                RunContent::Attachment(attachment) => self.attachment(run, attachment),
                RunContent::Text(content) => {
                    let mut segments = content.split('\n');
                    if let Some(first) = segments.next() {
                        self.segment(run, first);
                        for rest in segments {
                            self.out.push_str("\\par\n");
                            self.at_para_start = true;
                            self.segment(run, rest);
                        }
                    }
                }
            }
        }
        self.out.push('}');
    }
}

fn channel(value: f64) -> i32 {
    (value * 255.0).round() as i32
}

/// Serializes the text flow as the package body. Attachment sizes come from
/// the metadata table when the attachment is bound; they are informational
/// in the output either way.
pub fn export_rtf(text: &StyledText, metadata: &BTreeMap<ImageId, VisualMetadata>) -> String {
    let mut writer = RtfWriter::new(text, metadata);
    writer.header();
    writer.body(text);
    writer.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Size;

    fn roundtrip(text: &StyledText) -> StyledText {
        let body = export_rtf(text, &BTreeMap::new());
        parse_rtf(&body).unwrap_or_else(|err| panic!("body failed to parse: {err}\n{body}"))
    }

    #[test]
    fn plain_text_roundtrips() {
        let text = StyledText::from_plain("Hello, world\nSecond paragraph\n");
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn writer_emits_expected_skeleton() {
        let body = export_rtf(&StyledText::from_plain("Hi"), &BTreeMap::new());
        assert!(body.starts_with("{\\rtf1\\ansi\\ansicpg1252"));
        assert!(body.contains("{\\fonttbl{\\f0 Helvetica;}}"));
        assert!(body.contains("{\\colortbl;\\red0\\green0\\blue0;}"));
        assert!(body.contains("\\pard\\ql\\f0\\fs24\\cf1 Hi"));
        assert!(body.ends_with('}'));
    }

    #[test]
    fn weights_colors_and_decorations_roundtrip() {
        let heading = TextStyle {
            font_family: SmolStr::new("HelveticaNeue"),
            font_weight: FontWeight::Semibold,
            font_size: 17.5,
            color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            ..TextStyle::default()
        };
        let plain = TextStyle {
            underline: true,
            strikethrough: true,
            ..TextStyle::default()
        };

        let text = StyledText::from_runs(vec![
            TextRun::text("Title\n", heading),
            TextRun::text("struck and underlined", plain),
        ]);
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn alignment_and_list_markers_roundtrip() {
        let mut bullet_run = TextRun::text("item one\n", TextStyle::default());
        bullet_run.paragraph.list_marker = Some(ListMarkerFormat::Bullet);
        let mut dash_run = TextRun::text("item two\n", TextStyle::default());
        dash_run.paragraph.list_marker = Some(ListMarkerFormat::Dash);
        let mut decimal_run = TextRun::text("item three\n", TextStyle::default());
        decimal_run.paragraph.list_marker = Some(ListMarkerFormat::Decimal);
        let mut centered = TextRun::text("centered", TextStyle::default());
        centered.paragraph.alignment = Alignment::Center;

        let text = StyledText::from_runs(vec![bullet_run, dash_run, decimal_run, centered]);
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn zero_width_marker_carrier_roundtrips() {
        let mut carrier = TextRun::text("\u{200B}\n", TextStyle::default());
        carrier.paragraph.list_marker = Some(ListMarkerFormat::Bullet);
        let text = StyledText::from_runs(vec![
            TextRun::text("above\n", TextStyle::default()),
            carrier,
        ]);
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn escapes_and_unicode_roundtrip() {
        let text = StyledText::from_plain("braces {} and \\backslash\nnaïve – ümlaut");
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn attachments_roundtrip_unbound() {
        let mut text = StyledText::from_plain("before after");
        text.insert_attachment(7, InlineAttachment::new_unbound("image_feed.png"));
        let parsed = roundtrip(&text);
        assert_eq!(parsed.plain_text(), text.plain_text());
        let attachments: Vec<_> = parsed.attachments().collect();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].file_name(), "image_feed.png");
        assert_eq!(attachments[0].image_id(), None);
    }

    #[test]
    fn bound_attachment_sizes_are_written() {
        let id = ImageId::new_v4();
        let mut text = StyledText::new();
        text.insert_attachment(
            0,
            InlineAttachment::new_bound(id, crate::format::naming::asset_file_name(id), None),
        );
        let mut metadata = BTreeMap::new();
        metadata.insert(
            id,
            VisualMetadata::for_inserted_image(id, Size::new(1000.0, 500.0), 400.0),
        );
        let body = export_rtf(&text, &metadata);
        assert!(body.contains("\\width320"));
        assert!(body.contains("\\height160"));
    }

    #[test]
    fn reader_skips_unknown_words_and_destinations() {
        let body = "{\\rtf1\\ansi\\ansicpg1252\\deff0\n\
                    {\\fonttbl{\\f0\\fswiss\\fcharset0 Helvetica;}}\n\
                    {\\colortbl;\\red0\\green0\\blue0;}\n\
                    {\\*\\expandedcolortbl;;}\n\
                    \\pard\\pardirnatural\\partightenfactor0\n\
                    \\f0\\fs24 \\cf0 hello}";
        let parsed = parse_rtf(body).unwrap();
        assert_eq!(parsed.plain_text(), "hello");
        assert_eq!(parsed.runs()[0].style.font_family.as_str(), "Helvetica");
    }

    #[test]
    fn reader_accepts_hex_and_unicode_escapes() {
        let body = "{\\rtf1\\ansi caf\\'e9 \\uc0\\u8212  dash}";
        let parsed = parse_rtf(body).unwrap();
        // First space after the em-dash escape is the control-word delimiter.
        assert_eq!(parsed.plain_text(), "café — dash");
    }

    #[test]
    fn reader_maps_plain_bold_onto_weight() {
        let body = "{\\rtf1\\ansi normal \\b bold\\b0  normal}";
        let parsed = parse_rtf(body).unwrap();
        let weights: Vec<FontWeight> = parsed
            .runs()
            .iter()
            .map(|run| run.style.font_weight)
            .collect();
        assert_eq!(
            weights,
            vec![FontWeight::Regular, FontWeight::Bold, FontWeight::Regular]
        );
    }

    #[test]
    fn missing_header_is_an_error() {
        match parse_rtf("plain text, no rtf") {
            Err(RtfParseError::MissingHeader) => {}
            other => panic!("expected MissingHeader, got: {other:?}"),
        }
    }

    #[test]
    fn unbalanced_group_is_an_error() {
        match parse_rtf("{\\rtf1\\ansi {\\f0 oops") {
            Err(RtfParseError::UnbalancedGroup { .. }) => {}
            other => panic!("expected UnbalancedGroup, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_hex_escape_is_an_error() {
        match parse_rtf("{\\rtf1\\ansi \\'zq}") {
            Err(RtfParseError::InvalidEscape { .. }) => {}
            other => panic!("expected InvalidEscape, got: {other:?}"),
        }
    }
}
