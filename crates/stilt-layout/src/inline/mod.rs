//! Paragraph layout.
//!
//! Converts a styled Unicode string into positioned glyphs inside a
//! shape: itemization and shaping first, then greedy line filling
//! against the shape's per-band width, then per-line BiDi reordering,
//! alignment or justification, and command emission.

mod line;
mod linebreak;
mod prepare;
mod shaping;

use stilt_library::diag::LayoutResult;
use stilt_library::font::Font;
use stilt_library::geom::{Dir, Fixed};
use stilt_library::layout::Layout;
use stilt_library::shape::Shape;
use stilt_library::style::Rounding;
use stilt_library::text::AttrIndex;

use self::line::commit_line;
use self::linebreak::break_lines;
use self::prepare::prepare;

/// Horizontal alignment of the lines of a paragraph.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Align {
    /// Align at the shape's left boundary.
    #[default]
    Left,
    /// Align at the shape's right boundary.
    Right,
    /// Center between the boundaries.
    Center,
    /// Stretch to both boundaries; the last line aligns left.
    JustifyLeft,
    /// Stretch to both boundaries; the last line aligns right.
    JustifyRight,
}

/// Properties applying to a paragraph as a whole.
#[derive(Default, Debug, Clone)]
pub struct ParProps {
    /// How lines are placed horizontally.
    pub align: Align,
    /// Extra indentation of the first line, applied at the line-start
    /// side of the dominant direction.
    pub indent: Fixed,
    /// The dominant direction, seeding the BiDi paragraph level.
    pub dir: Dir,
    /// How vertical positions are rounded.
    pub rounding: Rounding,
    /// The face whose metrics place underlines, for visual continuity
    /// across style runs. Falls back to each run's own face.
    pub underline_font: Option<Font>,
}

/// Lay out a paragraph of styled text inside a shape.
///
/// `text` is the full paragraph; `attrs` must cover every byte of it.
/// The returned layout's height continues from `y_start`, which is
/// the distance of the paragraph's top from the top of the shape.
pub fn layout_paragraph(
    text: &str,
    attrs: &AttrIndex,
    shape: &dyn Shape,
    props: &ParProps,
    y_start: Fixed,
) -> LayoutResult<Layout> {
    let mut layout = Layout::new();
    layout.set_height(y_start);

    if text.is_empty() {
        layout.set_left(shape.left_outer(y_start, y_start));
        layout.set_right(shape.right_outer(y_start, y_start));
        return Ok(layout);
    }

    let p = prepare(text, attrs, props)?;
    let lines = break_lines(&p, shape, props, y_start)?;

    for (i, line) in lines.iter().enumerate() {
        commit_line(&mut layout, &p, line, shape, props, i == 0)?;
        layout.set_height(line.y + line.height);
    }

    let height = layout.height();
    layout.set_left(shape.left_outer(y_start, height));
    layout.set_right(shape.right_outer(y_start, height));
    Ok(layout)
}
