use std::ops::Range;

use stilt_library::diag::{Error, LayoutResult};
use stilt_library::geom::Fixed;
use stilt_library::shape::Shape;
use stilt_library::style::Rounding;
use unicode_linebreak::{BreakOpportunity, linebreaks};

use super::prepare::{ItemBody, Preparation};
use super::{Align, ParProps};

/// A chosen line of the paragraph, placed vertically.
pub struct Line {
    /// The full byte range of the line, including trailing
    /// whitespace.
    pub range: Range<usize>,
    /// The byte range without trailing whitespace; this is what gets
    /// drawn and measured.
    pub trimmed: Range<usize>,
    /// The top of the line.
    pub y: Fixed,
    /// The baseline position, already rounded per the rounding mode.
    pub baseline: Fixed,
    /// The vertical advance to the next line's top.
    pub height: Fixed,
    /// The advance width of the trimmed content, including a trailing
    /// hyphen if the line breaks at a soft hyphen.
    pub width: Fixed,
    /// The byte position of the soft hyphen the line breaks at.
    pub hyphen: Option<usize>,
    /// Whether the line stretches to the full shape width.
    pub justify: bool,
}

/// A measured line candidate ending at a break opportunity.
struct Candidate {
    start: usize,
    end: usize,
    trimmed_end: usize,
    width: Fixed,
    ascent: Fixed,
    descent: Fixed,
    hyphen: Option<usize>,
}

/// Break the paragraph into vertically placed lines.
///
/// Lines are filled greedily: each takes as many clusters as fit the
/// shape's width at its vertical band, where the band's height is the
/// running maximum of the candidate content's ascender plus
/// descender. A word wider than the shape breaks at the last cluster
/// that fits.
pub fn break_lines(
    p: &Preparation,
    shape: &dyn Shape,
    props: &ParProps,
    y_start: Fixed,
) -> LayoutResult<Vec<Line>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut last: Option<Candidate> = None;
    let mut y = y_start;

    for (end, op) in linebreaks(p.text) {
        let mandatory = op == BreakOpportunity::Mandatory;
        let mut attempt = measure(p, start..end);

        if !fits(shape, props, y, lines.is_empty(), &attempt) {
            // Fall back to the last break that fit.
            if let Some(prev) = last.take() {
                start = prev.end;
                finalize(&mut lines, &mut y, props, prev, false);
                attempt = measure(p, start..end);
            }

            // If the rest still overflows, a single word exceeds the
            // width: break it at the last cluster that fits.
            while !fits(shape, props, y, lines.is_empty(), &attempt) {
                let cut = emergency_cut(p, shape, props, y, lines.is_empty(), start, end)?;
                let forced = measure(p, start..cut);
                start = cut;
                finalize(&mut lines, &mut y, props, forced, false);
                attempt = measure(p, start..end);
            }
        }

        if mandatory {
            start = end;
            finalize(&mut lines, &mut y, props, attempt, true);
            last = None;
        } else {
            last = Some(attempt);
        }
    }

    // The break iterator always ends with a mandatory break, so
    // nothing can be left over.
    debug_assert!(last.is_none());

    Ok(lines)
}

/// Measure the candidate line covering `range`.
fn measure(p: &Preparation, range: Range<usize>) -> Candidate {
    // Trim trailing whitespace; U+00A0 stays, it is an inlay
    // placeholder. A trailing soft hyphen marks a hyphenated break.
    let mut trimmed_end = range.end;
    let mut hyphen = None;
    for (i, c) in p.text[range.clone()].char_indices().rev() {
        let pos = range.start + i;
        if c == '\u{00AD}' {
            // The hyphen shows only when the break is right at the
            // soft hyphen, not when it merely precedes trailing
            // whitespace.
            if pos + c.len_utf8() == range.end {
                hyphen = Some(pos);
                trimmed_end = pos;
            }
            break;
        }
        if !c.is_whitespace() || c == '\u{00A0}' {
            break;
        }
        trimmed_end = pos;
    }

    let mut width = Fixed::ZERO;
    let mut ascent = Fixed::ZERO;
    let mut descent = Fixed::ZERO;

    for item in p.slice(range.clone()) {
        // Trailing whitespace is not drawn, but its face still
        // partakes in the line height.
        ascent.set_max(item.ascent());
        descent.set_max(item.descent());

        match &item.body {
            ItemBody::Text(run) => {
                width += run
                    .glyphs
                    .iter()
                    .filter(|g| g.start >= range.start && g.start < trimmed_end)
                    .map(|g| g.x_advance)
                    .sum::<Fixed>();
            }
            ItemBody::Inlay if item.range.start < trimmed_end => {
                width += item.width();
            }
            _ => {}
        }
    }

    if let Some(pos) = hyphen {
        width += hyphen_advance(p, pos);
    }

    Candidate {
        start: range.start,
        end: range.end,
        trimmed_end,
        width,
        ascent,
        descent,
        hyphen,
    }
}

/// The advance of the visible hyphen shown when breaking at a soft
/// hyphen.
fn hyphen_advance(p: &Preparation, pos: usize) -> Fixed {
    p.attrs_at(pos)
        .and_then(|attrs| attrs.font.as_ref())
        .map(|font| font.advance(font.glyph_index('-').unwrap_or(0)))
        .unwrap_or(Fixed::ZERO)
}

/// Whether a candidate fits the shape at its vertical band.
fn fits(
    shape: &dyn Shape,
    props: &ParProps,
    y: Fixed,
    first: bool,
    candidate: &Candidate,
) -> bool {
    let height = candidate.ascent + candidate.descent;
    let (left, right) = bounds(shape, props, y, height, first);
    candidate.width <= right - left
}

/// The horizontal bounds for a line at `y` of the given height,
/// including the first-line indent.
pub fn bounds(
    shape: &dyn Shape,
    props: &ParProps,
    y: Fixed,
    height: Fixed,
    first: bool,
) -> (Fixed, Fixed) {
    let mut left = shape.left(y, y + height);
    let mut right = shape.right(y, y + height);
    if first {
        if props.dir.is_rtl() {
            right -= props.indent;
        } else {
            left += props.indent;
        }
    }
    (left, right)
}

/// Find the byte position to force-break an over-wide word at: the
/// last cluster boundary in `(start, end]` that still fits.
fn emergency_cut(
    p: &Preparation,
    shape: &dyn Shape,
    props: &ParProps,
    y: Fixed,
    first: bool,
    start: usize,
    end: usize,
) -> LayoutResult<usize> {
    let mut cuts: Vec<usize> = Vec::new();
    for item in p.slice(start..end) {
        match &item.body {
            ItemBody::Text(run) => {
                cuts.extend(run.glyphs.iter().map(|g| g.start));
            }
            ItemBody::Inlay | ItemBody::Control => cuts.push(item.range.start),
        }
    }
    cuts.retain(|&pos| pos > start && pos < end);
    cuts.push(end);
    cuts.sort_unstable();
    cuts.dedup();

    let mut best = start;
    for &cut in &cuts {
        if fits(shape, props, y, first, &measure(p, start..cut)) {
            best = cut;
        } else {
            break;
        }
    }

    if best == start {
        return Err(Error::ShapeTooNarrow);
    }
    Ok(best)
}

/// Place a finished candidate vertically and push it.
fn finalize(
    lines: &mut Vec<Line>,
    y: &mut Fixed,
    props: &ParProps,
    candidate: Candidate,
    mandatory: bool,
) {
    let raw_height = candidate.ascent + candidate.descent;
    let (baseline, height) = match props.rounding {
        Rounding::None => (*y + candidate.ascent, raw_height),
        Rounding::Pixel => ((*y + candidate.ascent).round_px(), raw_height.ceil_px()),
        Rounding::Baseline => ((*y + candidate.ascent).round_px(), raw_height),
    };

    let justify =
        matches!(props.align, Align::JustifyLeft | Align::JustifyRight) && !mandatory;

    lines.push(Line {
        range: candidate.start..candidate.end,
        trimmed: candidate.start..candidate.trimmed_end,
        y: *y,
        baseline,
        height,
        width: candidate.width,
        hyphen: candidate.hyphen,
        justify,
    });

    *y += height;
}
