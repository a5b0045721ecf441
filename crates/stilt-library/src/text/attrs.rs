use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use bitflags::bitflags;

use crate::font::Font;
use crate::geom::{Color, Fixed};
use crate::layout::Layout;
use crate::text::Lang;

bitflags! {
    /// Boolean styling switches for a codepoint.
    #[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
    pub struct AttrFlags: u8 {
        /// Draw an underline below the codepoint.
        const UNDERLINE = 1 << 0;
    }
}

/// One entry of a `text-shadow` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    /// The horizontal offset of the shadow copy.
    pub dx: Fixed,
    /// The vertical offset of the shadow copy. Positive goes down.
    pub dy: Fixed,
    /// The blur radius a renderer should apply to the copy.
    pub blur: Fixed,
    /// The color of the copy.
    pub color: Color,
}

/// The styling of a single codepoint of paragraph input.
#[derive(Debug, Default, Clone)]
pub struct Attrs {
    /// The face the codepoint is shaped with.
    pub font: Option<Font>,
    /// The foreground color.
    pub color: Color,
    /// The language the codepoint belongs to, for shaping and
    /// language-dependent line breaking.
    pub lang: Lang,
    /// Boolean switches.
    pub flags: AttrFlags,
    /// An offset applied to the baseline. Positive shifts up.
    pub baseline_shift: Fixed,
    /// Shadow copies drawn behind the codepoint, in back-to-front
    /// order.
    pub shadows: Vec<Shadow>,
    /// A finished sub-layout replacing the codepoint's glyph. The
    /// codepoint must be U+00A0, acting as a placeholder that carries
    /// the inlay's metrics through shaping.
    pub inlay: Option<Arc<Layout>>,
    /// An index into the surrounding layout's link table.
    pub link: Option<usize>,
}

impl Attrs {
    /// Whether the codepoint is underlined.
    pub fn underline(&self) -> bool {
        self.flags.contains(AttrFlags::UNDERLINE)
    }
}

/// Maps byte positions of a paragraph string to attributes.
///
/// Attributes are stored as breakpoints: a lookup finds the entry with
/// the largest position at or before the queried one. Phrasing covers
/// every input position, so lookups during layout always hit.
#[derive(Debug, Default, Clone)]
pub struct AttrIndex {
    breaks: BTreeMap<usize, Arc<Attrs>>,
}

impl AttrIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index assigning `attrs` to the whole input.
    pub fn uniform(attrs: Attrs) -> Self {
        let mut index = Self::new();
        index.set(0, attrs);
        index
    }

    /// Assign attributes from `pos` up to the next breakpoint.
    pub fn set(&mut self, pos: usize, attrs: Attrs) {
        self.breaks.insert(pos, Arc::new(attrs));
    }

    /// Assign attributes to everything in `range`.
    pub fn set_range(&mut self, range: Range<usize>, attrs: Attrs) {
        if range.is_empty() {
            return;
        }

        // Preserve what a later position was mapped to before carving
        // out the range.
        let after = self.get(range.end).cloned();
        self.breaks.retain(|&pos, _| pos < range.start || pos >= range.end);
        self.breaks.insert(range.start, Arc::new(attrs));
        if let Some(after) = after {
            self.breaks.entry(range.end).or_insert(after);
        }
    }

    /// The attributes in effect at `pos`.
    pub fn get(&self, pos: usize) -> Option<&Arc<Attrs>> {
        self.breaks.range(..=pos).next_back().map(|(_, attrs)| attrs)
    }

    /// Iterate over the attribute runs covering `0..len`, in order.
    pub fn runs(&self, len: usize) -> impl Iterator<Item = (Range<usize>, &Arc<Attrs>)> {
        let mut iter = self.breaks.range(..len).peekable();
        std::iter::from_fn(move || {
            let (&start, attrs) = iter.next()?;
            let end = iter.peek().map(|&(&pos, _)| pos).unwrap_or(len);
            Some((start..end, attrs))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored(color: Color) -> Attrs {
        Attrs { color, ..Default::default() }
    }

    #[test]
    fn test_breakpoint_lookup() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);

        let mut index = AttrIndex::new();
        index.set_range(0..4, colored(red));
        index.set_range(4..10, colored(blue));

        assert_eq!(index.get(0).unwrap().color, red);
        assert_eq!(index.get(3).unwrap().color, red);
        assert_eq!(index.get(4).unwrap().color, blue);
        assert_eq!(index.get(100).unwrap().color, blue);
        assert!(AttrIndex::new().get(0).is_none());
    }

    #[test]
    fn test_overwrite_keeps_tail() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let green = Color::rgb(0, 255, 0);

        let mut index = AttrIndex::new();
        index.set_range(0..10, colored(red));
        index.set_range(2..4, colored(blue));
        index.set_range(1..3, colored(green));

        assert_eq!(index.get(1).unwrap().color, green);
        assert_eq!(index.get(3).unwrap().color, blue);
        assert_eq!(index.get(5).unwrap().color, red);
    }

    #[test]
    fn test_runs() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);

        let mut index = AttrIndex::new();
        index.set_range(0..4, colored(red));
        index.set_range(4..6, colored(blue));

        let runs: Vec<_> =
            index.runs(6).map(|(range, attrs)| (range, attrs.color)).collect();
        assert_eq!(runs, vec![(0..4, red), (4..6, blue)]);
    }
}
