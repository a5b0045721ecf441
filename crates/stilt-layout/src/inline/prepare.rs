use std::ops::Range;
use std::sync::Arc;

use stilt_library::diag::{Error, LayoutResult};
use stilt_library::geom::{Dir, Fixed};
use stilt_library::text::{AttrIndex, Attrs};
use unicode_bidi::{BidiInfo, Level as BidiLevel};
use unicode_script::{Script, UnicodeScript};

use super::ParProps;
use super::shaping::{ShapedRun, shape_segment};

/// A paragraph in which text is already itemized and shaped.
///
/// Line breaking selects byte ranges of the original text; committing
/// a line slices the shaped items by cluster, so each item is shaped
/// exactly once.
pub struct Preparation<'a> {
    /// The full paragraph text.
    pub text: &'a str,
    /// Bidirectional embedding levels over the full text.
    pub bidi: BidiInfo<'a>,
    /// The shaped items in logical order.
    pub items: Vec<Item>,
}

impl Preparation<'_> {
    /// The items intersecting the given byte range, in logical order.
    pub fn slice(&self, range: Range<usize>) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .filter(move |item| item.range.start < range.end && range.start < item.range.end)
    }

    /// The attributes covering the given byte position.
    pub fn attrs_at(&self, pos: usize) -> Option<&Arc<Attrs>> {
        self.items
            .iter()
            .find(|item| item.range.contains(&pos))
            .map(|item| &item.attrs)
    }
}

/// A maximal stretch of the paragraph with uniform attributes, BiDi
/// level and script.
pub struct Item {
    /// The item's byte range in the paragraph text.
    pub range: Range<usize>,
    /// The item's BiDi embedding level.
    pub level: BidiLevel,
    /// The attributes of every codepoint in the item.
    pub attrs: Arc<Attrs>,
    /// What the item contributes to a line.
    pub body: ItemBody,
}

/// The content of an item.
pub enum ItemBody {
    /// A run of shaped glyphs.
    Text(ShapedRun),
    /// An embedded finished sub-layout, carried by a U+00A0
    /// placeholder codepoint.
    Inlay,
    /// A zero-width control codepoint: a newline or a soft hyphen.
    Control,
}

impl Item {
    /// The advance width the item contributes to a line.
    pub fn width(&self) -> Fixed {
        match &self.body {
            ItemBody::Text(run) => run.glyphs.iter().map(|g| g.x_advance).sum(),
            ItemBody::Inlay => self.inlay_width(),
            ItemBody::Control => Fixed::ZERO,
        }
    }

    /// The extent of the item above the baseline.
    pub fn ascent(&self) -> Fixed {
        match &self.body {
            ItemBody::Text(run) => {
                run.font.metrics().ascender + self.attrs.baseline_shift.max(Fixed::ZERO)
            }
            ItemBody::Inlay => self.inlay_height() + self.attrs.baseline_shift,
            ItemBody::Control => self
                .attrs
                .font
                .as_ref()
                .map(|font| font.metrics().ascender)
                .unwrap_or(Fixed::ZERO),
        }
    }

    /// The extent of the item below the baseline.
    pub fn descent(&self) -> Fixed {
        match &self.body {
            ItemBody::Text(run) => {
                run.font.metrics().descender - self.attrs.baseline_shift.min(Fixed::ZERO)
            }
            ItemBody::Inlay => Fixed::ZERO,
            ItemBody::Control => self
                .attrs
                .font
                .as_ref()
                .map(|font| font.metrics().descender)
                .unwrap_or(Fixed::ZERO),
        }
    }

    /// The width of the item's inlay, if it carries one.
    pub fn inlay_width(&self) -> Fixed {
        self.attrs
            .inlay
            .as_deref()
            .map(|inlay| inlay.right() - inlay.left())
            .unwrap_or(Fixed::ZERO)
    }

    /// The height of the item's inlay, if it carries one.
    pub fn inlay_height(&self) -> Fixed {
        self.attrs
            .inlay
            .as_deref()
            .map(|inlay| inlay.height())
            .unwrap_or(Fixed::ZERO)
    }
}

/// Whether a codepoint is layouted as a zero-width control.
fn is_control(c: char) -> bool {
    c == '\n' || c == '\u{00AD}'
}

/// Itemize and shape the paragraph.
///
/// Items split at attribute boundaries, at BiDi level changes, at
/// Unicode script changes (with Common/Inherited merged into the
/// surrounding script), at control codepoints and at inlays.
pub fn prepare<'a>(
    text: &'a str,
    attrs: &AttrIndex,
    props: &ParProps,
) -> LayoutResult<Preparation<'a>> {
    let default_level = match props.dir {
        Dir::RTL => BidiLevel::rtl(),
        Dir::LTR => BidiLevel::ltr(),
    };
    let bidi = BidiInfo::new(text, Some(default_level));

    let mut items = Vec::new();
    for (range, attrs) in attrs.runs(text.len()) {
        if range.start >= text.len() {
            break;
        }
        let range = range.start..range.end.min(text.len());
        itemize_run(text, &bidi, range, attrs, &mut items)?;
    }

    // A gap before the first breakpoint means the index does not
    // cover the text.
    let covered = items.first().is_some_and(|item| item.range.start == 0);
    if !covered {
        return Err(missing_font());
    }

    Ok(Preparation { text, bidi, items })
}

/// Split one attribute run into items and shape them.
fn itemize_run(
    text: &str,
    bidi: &BidiInfo,
    range: Range<usize>,
    attrs: &Arc<Attrs>,
    items: &mut Vec<Item>,
) -> LayoutResult<()> {
    let mut start = range.start;
    let mut script = Script::Common;

    let flush = |items: &mut Vec<Item>, start: usize, end: usize, script: Script| {
        if start >= end {
            return Ok(());
        }
        let level = bidi.levels[start];
        let run = shape_segment(text, start..end, level, attrs, script)?;
        items.push(Item {
            range: start..end,
            level,
            attrs: attrs.clone(),
            body: ItemBody::Text(run),
        });
        Ok(())
    };

    for (offset, c) in text[range.clone()].char_indices() {
        let pos = range.start + offset;
        let level = bidi.levels[pos];

        if is_control(c) || attrs.inlay.is_some() {
            flush(items, start, pos, script)?;
            items.push(Item {
                range: pos..pos + c.len_utf8(),
                level,
                attrs: attrs.clone(),
                body: if attrs.inlay.is_some() {
                    ItemBody::Inlay
                } else {
                    ItemBody::Control
                },
            });
            start = pos + c.len_utf8();
            script = Script::Common;
            continue;
        }

        // A level boundary inside the run splits it.
        if pos > start && level != bidi.levels[start] {
            flush(items, start, pos, script)?;
            start = pos;
            script = Script::Common;
        }

        // A script change splits it as well; Common and Inherited
        // codepoints attach to the surrounding script.
        let s = c.script();
        if s != Script::Common && s != Script::Inherited {
            if script == Script::Common {
                script = s;
            } else if s != script {
                flush(items, start, pos, script)?;
                start = pos;
                script = s;
            }
        }
    }

    flush(items, start, range.end, script)
}

/// The error for a style run without a usable face.
pub fn missing_font() -> Error {
    Error::FontNotFound {
        family: "".into(),
        variant: Default::default(),
        path: "".into(),
    }
}
