use std::ops::Range;

use stilt_library::diag::LayoutResult;
use stilt_library::font::Font;
use stilt_library::geom::Fixed;
use stilt_library::text::Attrs;
use ttf_parser::Tag;
use unicode_bidi::Level as BidiLevel;
use unicode_script::Script;

use super::prepare::missing_font;

/// A run of glyphs shaped with a single face.
pub struct ShapedRun {
    /// The face the run was shaped with.
    pub font: Font,
    /// The glyphs in visual order within the run. For right-to-left
    /// runs this is the reverse of logical order.
    pub glyphs: Vec<ShapedGlyph>,
}

/// A single glyph resulting from shaping.
pub struct ShapedGlyph {
    /// The glyph's index in the face.
    pub glyph: u16,
    /// The advance width of the glyph.
    pub x_advance: Fixed,
    /// The horizontal offset of the glyph within its advance.
    pub x_offset: Fixed,
    /// The upwards offset of the glyph from the baseline.
    pub y_offset: Fixed,
    /// The byte position of the glyph's cluster in the paragraph.
    pub start: usize,
    /// The first char of the glyph's cluster.
    pub c: char,
}

impl ShapedGlyph {
    /// Whether the glyph stretches under justification.
    pub fn is_space(&self) -> bool {
        self.c == ' '
    }
}

/// Shape one itemized segment of the paragraph with its attributes'
/// face.
///
/// Embedded BiDi controls produce no glyphs; the shaper drops default
/// ignorables. A codepoint missing from the face shapes to the
/// face's tofu glyph, since face selection is fixed per run.
pub fn shape_segment(
    text: &str,
    range: Range<usize>,
    level: BidiLevel,
    attrs: &Attrs,
    script: Script,
) -> LayoutResult<ShapedRun> {
    let font = attrs.font.clone().ok_or_else(missing_font)?;

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(&text[range.clone()]);
    buffer.set_direction(if level.is_rtl() {
        rustybuzz::Direction::RightToLeft
    } else {
        rustybuzz::Direction::LeftToRight
    });
    if let Some(script) = script_tag(script) {
        buffer.set_script(script);
    }
    if !attrs.lang.is_empty()
        && let Ok(language) = attrs.lang.as_str().parse::<rustybuzz::Language>()
    {
        buffer.set_language(language);
    }

    // Embedded LRE/RLE/PDF controls must not become visible glyphs.
    buffer.set_flags(rustybuzz::BufferFlags::REMOVE_DEFAULT_IGNORABLES);

    let glyphs = rustybuzz::shape(font.rusty(), &[], buffer);
    let infos = glyphs.glyph_infos();
    let positions = glyphs.glyph_positions();

    let mut shaped = Vec::with_capacity(infos.len());
    for (info, pos) in infos.iter().zip(positions) {
        let cluster = range.start + info.cluster as usize;
        let c = text[cluster..].chars().next().unwrap_or('\u{0}');
        shaped.push(ShapedGlyph {
            glyph: info.glyph_id as u16,
            x_advance: font.to_fixed(pos.x_advance),
            x_offset: font.to_fixed(pos.x_offset),
            y_offset: font.to_fixed(pos.y_offset),
            start: cluster,
            c,
        });
    }

    Ok(ShapedRun { font, glyphs: shaped })
}

/// Convert a Unicode script into the shaper's script type.
fn script_tag(script: Script) -> Option<rustybuzz::Script> {
    let bytes: [u8; 4] = script.short_name().as_bytes().try_into().ok()?;
    rustybuzz::Script::from_iso15924_tag(Tag::from_bytes(&bytes))
}
