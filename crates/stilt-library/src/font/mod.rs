//! Font handling.

mod family;
mod variant;

pub use self::family::{FontFamily, FontSource};
pub use self::variant::{FontCaps, FontStyle, FontVariant, FontWeight};

use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ttf_parser::GlyphId;

use crate::geom::Fixed;

/// An OpenType face instantiated at a pixel size.
///
/// All metrics and advances a font reports are pre-scaled to 26.6
/// fixed point at that size. Values of this type are cheap to clone.
#[derive(Clone)]
pub struct Font(Arc<Repr>);

/// The internal representation of a font.
struct Repr {
    /// The pixel size this face is instantiated at.
    size: Fixed,
    /// The face's metrics at `size`.
    metrics: FontMetrics,
    /// The number of font units per em.
    units_per_em: u16,
    /// The underlying ttf-parser face.
    ttf: ttf_parser::Face<'static>,
    /// The underlying rustybuzz face.
    rusty: rustybuzz::Face<'static>,
    // NOTE: `ttf` and `rusty` reference the data held by `source`, so
    // `source` must be dropped after them. Fields drop in declaration
    // order.
    /// Where the face's data comes from. The buffer's allocation must
    /// not move, because `ttf` and `rusty` point into it.
    source: FontSource,
}

impl Font {
    /// Instantiate a face from a source at a pixel size.
    pub fn new(source: FontSource, size: Fixed) -> Option<Self> {
        // Safety:
        // - The slice's location is stable in memory:
        //   - We don't move the underlying vector.
        //   - Nobody else can move it since we hold a strong ref to
        //     the `Arc`.
        // - The internal 'static lifetime is not leaked because it is
        //   rewritten to the self-lifetime in `ttf()` and `rusty()`.
        let slice: &'static [u8] =
            unsafe { std::slice::from_raw_parts(source.data.as_ptr(), source.data.len()) };

        let ttf = ttf_parser::Face::parse(slice, source.index).ok()?;
        let rusty = rustybuzz::Face::from_slice(slice, source.index)?;
        let units_per_em = ttf.units_per_em();
        let metrics = FontMetrics::from_ttf(&ttf, size);

        Some(Self(Arc::new(Repr { size, metrics, units_per_em, ttf, rusty, source })))
    }

    /// Where the face's data comes from.
    pub fn source(&self) -> &FontSource {
        &self.0.source
    }

    /// The pixel size this face is instantiated at.
    pub fn size(&self) -> Fixed {
        self.0.size
    }

    /// The face's metrics at its size.
    pub fn metrics(&self) -> &FontMetrics {
        &self.0.metrics
    }

    /// Convert a value in font units into 26.6 at the face's size.
    pub fn to_fixed(&self, units: i32) -> Fixed {
        Fixed::raw(units).scale(self.0.size.get() as i64, self.0.units_per_em as i64)
    }

    /// Look up the glyph for a character.
    pub fn glyph_index(&self, c: char) -> Option<u16> {
        self.0.ttf.glyph_index(c).map(|id| id.0)
    }

    /// Look up the horizontal advance of a glyph.
    pub fn advance(&self, glyph: u16) -> Fixed {
        let units = self.0.ttf.glyph_hor_advance(GlyphId(glyph)).unwrap_or(0);
        self.to_fixed(units as i32)
    }

    /// A reference to the underlying `ttf-parser` face.
    pub fn ttf(&self) -> &ttf_parser::Face<'_> {
        // We can't implement Deref because that would leak the
        // internal 'static lifetime.
        &self.0.ttf
    }

    /// A reference to the underlying `rustybuzz` face.
    pub fn rusty(&self) -> &rustybuzz::Face<'_> {
        &self.0.rusty
    }
}

impl Hash for Font {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0.source.data).hash(state);
        self.0.source.index.hash(state);
        self.0.size.hash(state);
    }
}

impl Debug for Font {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Font({}@{}, {:?})", self.0.source.path, self.0.source.index, self.0.size)
    }
}

impl Eq for Font {}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.source.data, &other.0.source.data)
            && self.0.source.index == other.0.source.index
            && self.0.size == other.0.size
    }
}

/// Metrics of a face at a pixel size, in 26.6 fixed point.
#[derive(Debug, Copy, Clone)]
pub struct FontMetrics {
    /// The distance from the baseline up to the typographic ascender.
    pub ascender: Fixed,
    /// The distance from the baseline down to the typographic
    /// descender, as a positive value.
    pub descender: Fixed,
    /// Recommended metrics for an underline.
    pub underline: LineMetrics,
}

impl FontMetrics {
    /// Extract a face's metrics, scaled to `size`.
    pub fn from_ttf(ttf: &ttf_parser::Face, size: Fixed) -> Self {
        let upem = ttf.units_per_em() as i64;
        let scale = |units: i32| Fixed::raw(units).scale(size.get() as i64, upem);

        let ascender = ttf.typographic_ascender().unwrap_or(ttf.ascender());
        let descender = ttf.typographic_descender().unwrap_or(ttf.descender());
        let underline = ttf.underline_metrics();

        Self {
            ascender: scale(ascender as i32),
            descender: scale(-(descender as i32)).max(Fixed::ZERO),
            underline: LineMetrics {
                // Fall back to typical values for fonts without an
                // underline record.
                position: underline
                    .map(|m| scale(m.position as i32))
                    .unwrap_or(-size / 10),
                thickness: underline
                    .map(|m| scale(m.thickness as i32))
                    .unwrap_or(size / 16),
            },
        }
    }

    /// The distance between two consecutive baselines.
    pub fn height(&self) -> Fixed {
        self.ascender + self.descender
    }
}

/// Metrics for a decorative line.
#[derive(Debug, Copy, Clone)]
pub struct LineMetrics {
    /// The vertical offset of the line's center from the baseline.
    /// Positive goes upwards, negative downwards.
    pub position: Fixed,
    /// The thickness of the line.
    pub thickness: Fixed,
}
