//! End-to-end tests driving the XHTML entry point against a real
//! face embedded in the dev assets.

use std::sync::{Arc, OnceLock};

use stilt_layout::{layout_xhtml, read_layout, write_layout};
use stilt_library::Error;
use stilt_library::font::{Font, FontSource};
use stilt_library::geom::Fixed;
use stilt_library::layout::Command;
use stilt_library::shape::Rectangle;
use stilt_library::style::Stylesheet;

/// An embedded face covering Latin, Hebrew, the bullet and the
/// hyphen. All tests share one source so that faces compare equal by
/// identity.
fn test_source() -> FontSource {
    static SOURCE: OnceLock<FontSource> = OnceLock::new();
    SOURCE
        .get_or_init(|| {
            for data in typst_assets::fonts() {
                if let Ok(face) = ttf_parser::Face::parse(data, 0) {
                    let has = |c| face.glyph_index(c).is_some();
                    if has('A') && has('א') && has('\u{2022}') && has('-') {
                        return FontSource::new(Arc::new(data.to_vec()), "test-font");
                    }
                }
            }
            panic!("no embedded face with the required coverage");
        })
        .clone()
}

/// A sheet with the test face registered under the default family.
fn test_sheet() -> Stylesheet {
    let mut sheet = Stylesheet::new();
    sheet.add_font("sans", test_source());
    sheet
}

/// The test face instantiated at a pixel size.
fn test_font(size: i32) -> Font {
    Font::new(test_source(), Fixed::from_px(size)).expect("face must parse")
}

fn glyphs(commands: &[Command]) -> Vec<(Fixed, Fixed, u16)> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::Glyph { x, y, glyph, blur, .. } if blur.is_zero() => {
                Some((*x, *y, *glyph))
            }
            _ => None,
        })
        .collect()
}

/// The rightmost edge covered by glyph advances.
fn right_edge(commands: &[Command]) -> Fixed {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::Glyph { font, glyph, x, .. } => Some(*x + font.advance(*glyph)),
            _ => None,
        })
        .max()
        .unwrap_or(Fixed::ZERO)
}

#[test]
fn test_single_line_paragraph() {
    let mut sheet = test_sheet();
    sheet.add_rule("body", "font-size", "16px").unwrap();
    let shape = Rectangle::new(Fixed::from_px(1000));

    let layout =
        layout_xhtml("<html><body><p>Hello</p></body></html>", &sheet, &shape).unwrap();

    let glyphs = glyphs(layout.commands());
    assert_eq!(glyphs.len(), 5);

    // One line: all glyphs share the first baseline.
    let font = test_font(16);
    let baseline = font.metrics().ascender.round_px();
    assert_eq!(layout.first_baseline(), Some(baseline));
    assert!(glyphs.iter().all(|&(_, y, _)| y == baseline));
    assert_eq!(layout.height(), font.metrics().height().ceil_px());

    // Left-aligned and inside the shape.
    assert_eq!(glyphs[0].0, Fixed::ZERO);
    assert!(glyphs.windows(2).all(|pair| pair[0].0 < pair[1].0));
    assert!(right_edge(layout.commands()) <= Fixed::from_px(1000));
}

#[test]
fn test_rtl_glyphs_run_leftwards() {
    let mut sheet = test_sheet();
    sheet.add_rule("p", "direction", "rtl").unwrap();
    let shape = Rectangle::new(Fixed::from_px(1000));

    let layout = layout_xhtml(
        "<html><body><p lang='he'>\u{5d0}\u{5d1}\u{5d2}</p></body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    // Commands come in visual order, left to right; the logical
    // characters therefore sit at strictly decreasing x positions.
    let glyphs = glyphs(layout.commands());
    assert_eq!(glyphs.len(), 3);
    assert!(glyphs.windows(2).all(|pair| pair[0].0 < pair[1].0));

    let font = test_font(10);
    let x_of = |c: char| {
        let id = font.glyph_index(c).unwrap();
        glyphs.iter().find(|&&(.., g)| g == id).map(|&(x, ..)| x).unwrap()
    };
    assert!(x_of('\u{5d0}') > x_of('\u{5d1}'));
    assert!(x_of('\u{5d1}') > x_of('\u{5d2}'));
}

#[test]
fn test_table_places_cells_at_column_starts() {
    let sheet = test_sheet();
    // Exactly the table width, so centering adds no indent.
    let shape = Rectangle::new(Fixed::from_px(200));

    let layout = layout_xhtml(
        "<html><body><table>\
         <colgroup><col span='2' width='100px'/></colgroup>\
         <tr><td>A</td><td>B</td></tr>\
         </table></body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    let glyphs = glyphs(layout.commands());
    assert_eq!(glyphs.len(), 2);

    let (ax, ay, _) = glyphs[0];
    let (bx, by, _) = glyphs[1];
    assert!(ax < Fixed::from_px(100));
    assert!(bx >= Fixed::from_px(100) && bx < Fixed::from_px(200));
    assert_eq!(ay, by);
}

#[test]
fn test_justified_line_reaches_both_edges() {
    let mut sheet = test_sheet();
    sheet.add_rule("p", "text-align", "justify").unwrap();

    // Find the natural width of the words that should span the line.
    let probe = layout_xhtml(
        "<html><body><p>one two three</p></body></html>",
        &sheet,
        &Rectangle::new(Fixed::from_px(100_000)),
    )
    .unwrap();
    let natural = right_edge(probe.commands());

    // A fourth word wraps, leaving "one two three" as a justified
    // line stretched to the shape width.
    let width = natural + Fixed::from_px(5);
    let layout = layout_xhtml(
        "<html><body><p>one two three four</p></body></html>",
        &sheet,
        &Rectangle::new(width),
    )
    .unwrap();

    let first_baseline = layout.first_baseline().unwrap();
    let first_line: Vec<_> = layout
        .commands()
        .iter()
        .filter(|command| {
            matches!(command, Command::Glyph { y, .. } if *y == first_baseline)
        })
        .cloned()
        .collect();

    let leftmost = glyphs(&first_line).iter().map(|&(x, ..)| x).min().unwrap();
    assert_eq!(leftmost, Fixed::ZERO);
    assert_eq!(right_edge(&first_line), width);
}

#[test]
fn test_list_bullet_shares_the_content_baseline() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(500));

    let layout =
        layout_xhtml("<html><body><ul><li>x</li></ul></body></html>", &sheet, &shape)
            .unwrap();

    let font = test_font(10);
    let bullet_glyph = font.glyph_index('\u{2022}').unwrap();

    let glyphs = glyphs(layout.commands());
    assert_eq!(glyphs.len(), 2);
    let (bullet_x, bullet_y, id) = glyphs[0];
    let (text_x, text_y, _) = glyphs[1];
    assert_eq!(id, bullet_glyph);
    assert!(bullet_x < text_x);
    assert_eq!(bullet_y, text_y);
}

#[test]
fn test_character_references() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(1000));

    let layout = layout_xhtml(
        "<html><body><p>&amp;&#x41;&#65;</p></body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    let font = test_font(10);
    let expected = vec![
        font.glyph_index('&').unwrap(),
        font.glyph_index('A').unwrap(),
        font.glyph_index('A').unwrap(),
    ];
    let actual: Vec<_> = glyphs(layout.commands()).iter().map(|&(.., id)| id).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_named_entity_decoding() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(1000));

    let layout = layout_xhtml(
        "<html><body><p>a&nbsp;b</p></body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    let font = test_font(10);
    let ids: Vec<_> = glyphs(layout.commands()).iter().map(|&(.., id)| id).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], font.glyph_index('a').unwrap());
    assert_eq!(ids[2], font.glyph_index('b').unwrap());
}

#[test]
fn test_empty_body() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(100));

    let layout = layout_xhtml("<html><body></body></html>", &sheet, &shape).unwrap();
    assert_eq!(layout.height(), Fixed::ZERO);
    assert!(layout.commands().is_empty());
}

#[test]
fn test_zero_width_shape_fails() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::ZERO);

    let result = layout_xhtml("<html><body><p>word</p></body></html>", &sheet, &shape);
    assert_eq!(result.unwrap_err(), Error::ShapeTooNarrow);
}

#[test]
fn test_unknown_tag_reports_path() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(100));

    let result =
        layout_xhtml("<html><body><blink>x</blink></body></html>", &sheet, &shape);
    match result.unwrap_err() {
        Error::UnexpectedTag { path } => assert_eq!(path, "/html/body/blink"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_parse_error_carries_context() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(100));

    let result = layout_xhtml("<html><body><p>broken", &sheet, &shape);
    match result.unwrap_err() {
        Error::Parse { context, .. } => assert!(context.contains("broken")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_soft_hyphen_breaks_with_visible_hyphen() {
    let sheet = test_sheet();
    let font = test_font(10);
    let hyphen = font.glyph_index('-').unwrap();

    // Wide enough for "aaa-" but not for "aaabbb".
    let probe = layout_xhtml(
        "<html><body><p>aaabbb</p></body></html>",
        &sheet,
        &Rectangle::new(Fixed::from_px(100_000)),
    )
    .unwrap();
    let full = right_edge(probe.commands());
    let width = full - Fixed::from_px(2);

    let layout = layout_xhtml(
        "<html><body><p>aaa&shy;bbb</p></body></html>",
        &sheet,
        &Rectangle::new(width),
    )
    .unwrap();

    let glyphs = glyphs(layout.commands());
    let hyphens: Vec<_> = glyphs.iter().filter(|&&(.., id)| id == hyphen).collect();
    assert_eq!(hyphens.len(), 1);

    // The hyphen sits on the first line; the second line starts back
    // at the left edge below it.
    let first_baseline = layout.first_baseline().unwrap();
    assert_eq!(hyphens[0].1, first_baseline);
    assert!(glyphs.iter().any(|&(_, y, _)| y > first_baseline));
}

#[test]
fn test_br_at_start_makes_a_blank_first_line() {
    let mut sheet = test_sheet();
    sheet.add_rule("body", "font-size", "16px").unwrap();
    let shape = Rectangle::new(Fixed::from_px(1000));

    let layout =
        layout_xhtml("<html><body><p><br/>x</p></body></html>", &sheet, &shape).unwrap();

    let font = test_font(16);
    let line_height = font.metrics().height().ceil_px();
    assert_eq!(layout.height(), line_height * 2);

    // The only glyph sits on the second line.
    let glyphs = glyphs(layout.commands());
    assert_eq!(glyphs.len(), 1);
    assert!(glyphs[0].1 > line_height);
}

#[test]
fn test_vertical_margins_collapse() {
    let mut sheet = test_sheet();
    sheet.add_rule("p", "margin-bottom", "10px").unwrap();
    sheet.add_rule("p", "margin-top", "30px").unwrap();
    let shape = Rectangle::new(Fixed::from_px(1000));

    let layout = layout_xhtml(
        "<html><body><p>a</p><p>b</p></body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    let glyphs = glyphs(layout.commands());
    assert_eq!(glyphs.len(), 2);

    let font = test_font(10);
    let line_height = font.metrics().height().ceil_px();

    // The space between the blocks is max(10, 30), not 40.
    let gap = Fixed::from_px(30);
    assert_eq!(glyphs[1].1 - glyphs[0].1, line_height + gap);
}

#[test]
fn test_deterministic_output() {
    let mut sheet = test_sheet();
    sheet.add_rule("p", "text-shadow", "1px 1px #808080").unwrap();
    let shape = Rectangle::new(Fixed::from_px(300));

    let source = "<html><body><p>determinism test with several words</p>\
                  <ul><li>entry</li></ul></body></html>";
    let one = layout_xhtml(source, &sheet, &shape).unwrap();
    let two = layout_xhtml(source, &sheet, &shape).unwrap();
    assert_eq!(write_layout(&one), write_layout(&two));
}

#[test]
fn test_layout_xml_roundtrip() {
    let mut sheet = test_sheet();
    sheet.add_rule("p", "text-decoration", "underline").unwrap();
    let shape = Rectangle::new(Fixed::from_px(300));

    let layout = layout_xhtml(
        "<html><body><p><a href='https://example.org'>link text</a> plus \
         trailing words</p></body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    let source = test_source();
    let written = write_layout(&layout);
    let reread = read_layout(&written, |path, index, size| {
        (path == source.path.as_str() && index == source.index)
            .then(|| Font::new(source.clone(), size))
            .flatten()
    })
    .unwrap();

    assert_eq!(layout.commands(), reread.commands());
    assert_eq!(layout.links(), reread.links());
    assert_eq!(layout.left(), reread.left());
    assert_eq!(layout.right(), reread.right());
    assert_eq!(layout.height(), reread.height());
    assert_eq!(layout.first_baseline(), reread.first_baseline());
    assert_eq!(write_layout(&reread), written);
}

#[test]
fn test_link_indices_reach_the_glyphs() {
    let sheet = test_sheet();
    let shape = Rectangle::new(Fixed::from_px(500));

    let layout = layout_xhtml(
        "<html><body><p>pre <a href='https://example.org'>in</a> post</p>\
         </body></html>",
        &sheet,
        &shape,
    )
    .unwrap();

    assert_eq!(layout.links(), ["https://example.org"]);
    let linked: Vec<_> = layout
        .commands()
        .iter()
        .filter(|command| {
            matches!(command, Command::Glyph { link: Some(0), .. })
        })
        .collect();
    assert_eq!(linked.len(), 2);
}
