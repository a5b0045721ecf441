//! Phrasing content collection.
//!
//! Walks the inline descendants of a block, accumulating normalized
//! text and per-codepoint attributes, then hands the paragraph to the
//! shaper.

use std::sync::Arc;

use ecow::EcoString;
use roxmltree::Node;
use stilt_library::diag::{Error, LayoutResult};
use stilt_library::geom::{Dir, Fixed};
use stilt_library::layout::Layout;
use stilt_library::shape::{Rectangle, Shape};
use stilt_library::style::{Stylesheet, parse_color, parse_shadows, parse_size};
use stilt_library::text::{AttrFlags, AttrIndex, Attrs};

use super::{lang_of, node_path, resolve_font};
use crate::flow::{BoxContext, box_it};
use crate::image::layout_image;
use crate::inline::{Align, ParProps, layout_paragraph};

/// Accumulates the paragraph input while walking inline content.
struct Collector<'a> {
    sheet: &'a Stylesheet,
    text: String,
    attrs: AttrIndex,
    links: Vec<EcoString>,
}

/// Styling state pushed down by enclosing inline elements.
#[derive(Default, Copy, Clone)]
struct Inherited {
    /// The accumulated baseline shift from `<sub>`/`<sup>`.
    shift: Fixed,
    /// The link index from an enclosing `<a href>`.
    link: Option<usize>,
}

/// Collect phrasing content starting at `first` and lay it out as a
/// paragraph.
///
/// Returns the finished paragraph and the first sibling that is not
/// phrasing content, where the caller's flow continues.
pub(crate) fn phrasing<'a, 'input>(
    first: Option<Node<'a, 'input>>,
    props_node: Node,
    sheet: &Stylesheet,
    shape: &dyn Shape,
    y_start: Fixed,
) -> LayoutResult<(Layout, Option<Node<'a, 'input>>)> {
    let mut collector = Collector {
        sheet,
        text: String::new(),
        attrs: AttrIndex::new(),
        links: Vec::new(),
    };
    let next = collect(&mut collector, first, Inherited::default())?;

    let dir = Dir::from_css(sheet.value_of(Some(props_node), "direction"));
    let align = resolve_align(sheet, props_node, dir)?;
    let indent =
        parse_size("text-indent", sheet.value_of(Some(props_node), "text-indent"))?;
    let underline_font =
        if sheet.value_of(Some(props_node), "text-decoration") == "underline" {
            Some(resolve_font(sheet, Some(props_node))?)
        } else {
            None
        };

    let props = ParProps {
        align,
        indent,
        dir,
        rounding: sheet.rounding(),
        underline_font,
    };

    let mut layout =
        layout_paragraph(&collector.text, &collector.attrs, shape, &props, y_start)?;
    for url in collector.links {
        layout.add_link(url);
    }
    Ok((layout, next))
}

/// Walk siblings, collecting text and inline elements until something
/// else appears. Returns the first unconsumed sibling.
fn collect<'a, 'input>(
    c: &mut Collector,
    mut node: Option<Node<'a, 'input>>,
    state: Inherited,
) -> LayoutResult<Option<Node<'a, 'input>>> {
    while let Some(cur) = node {
        if cur.is_comment() {
            node = cur.next_sibling();
            continue;
        }

        if cur.is_text() {
            let attrs = text_attrs(c.sheet, cur.parent(), state)?;
            push_text(c, cur.text().unwrap_or(""), attrs);
        } else if cur.is_element() {
            match cur.tag_name().name() {
                "span" | "i" | "b" | "em" | "strong" | "code" | "q" | "small" => {
                    collect_element(c, cur, state)?;
                }
                "sub" | "sup" => {
                    let font = resolve_font(c.sheet, Some(cur))?;
                    let half = font.metrics().ascender / 2;
                    let shift = if cur.tag_name().name() == "sub" {
                        state.shift - half
                    } else {
                        state.shift + half
                    };
                    collect_element(c, cur, Inherited { shift, ..state })?;
                }
                "a" => {
                    let mut inner = state;
                    if let Some(href) = cur.attribute("href") {
                        inner.link = Some(c.links.len());
                        c.links.push(href.into());
                    }
                    collect_element(c, cur, inner)?;
                }
                "br" => {
                    // A mandatory break, carrying the surrounding font
                    // so a blank line still has a height.
                    let attrs = text_attrs(c.sheet, cur.parent(), state)?;
                    push_char(c, '\n', attrs);
                }
                "img" => {
                    let attrs = image_attrs(c.sheet, cur, state)?;
                    push_char(c, '\u{00A0}', attrs);
                }
                _ => break,
            }
        }

        node = cur.next_sibling();
    }

    Ok(node)
}

/// Collect an inline element's children, isolated between BiDi
/// embedding controls matching the element's direction.
fn collect_element(c: &mut Collector, element: Node, state: Inherited) -> LayoutResult<()> {
    let attrs = text_attrs(c.sheet, Some(element), state)?;
    let dir = Dir::from_css(c.sheet.value_of(Some(element), "direction"));
    let opening = if dir.is_rtl() { '\u{202B}' } else { '\u{202A}' };

    push_char(c, opening, attrs.clone());
    if let Some(extra) = collect(c, element.first_child(), state)? {
        return Err(Error::UnexpectedTag { path: node_path(extra) });
    }
    push_char(c, '\u{202C}', attrs);
    Ok(())
}

/// The attributes of text under the given element.
fn text_attrs(
    sheet: &Stylesheet,
    node: Option<Node>,
    state: Inherited,
) -> LayoutResult<Attrs> {
    let mut flags = AttrFlags::empty();
    if sheet.value_of(node, "text-decoration") == "underline" {
        flags |= AttrFlags::UNDERLINE;
    }

    Ok(Attrs {
        font: Some(resolve_font(sheet, node)?),
        color: parse_color("color", sheet.value_of(node, "color"))?,
        lang: node.map(lang_of).unwrap_or_default(),
        flags,
        baseline_shift: state.shift,
        shadows: parse_shadows(sheet.value_of(node, "text-shadow"))?,
        inlay: None,
        link: state.link,
    })
}

/// The attributes of an inline image: a no-break space carrying the
/// boxed image as an inlay.
fn image_attrs(sheet: &Stylesheet, img: Node, state: Inherited) -> LayoutResult<Attrs> {
    // The image is boxed inside a practically unbounded rectangle; its
    // own width attribute decides the inlay's extent.
    let open = Rectangle::new(Fixed::from_px(1_000_000));
    let inlay = box_it(img, sheet, &open, Fixed::ZERO, BoxContext::default(), |inner, ys| {
        layout_image(img, inner, ys)
    })?;

    let parent = img.parent();
    let mut attrs = Attrs {
        inlay: Some(Arc::new(inlay)),
        baseline_shift: state.shift,
        shadows: parse_shadows(sheet.value_of(parent, "text-shadow"))?,
        link: state.link,
        ..Default::default()
    };

    // Underline continuity across the image needs the surrounding
    // font's metrics.
    if sheet.value_of(parent, "text-decoration") == "underline" {
        attrs.flags |= AttrFlags::UNDERLINE;
        attrs.font = Some(resolve_font(sheet, parent)?);
        attrs.color = parse_color("color", sheet.value_of(parent, "color"))?;
    }

    Ok(attrs)
}

/// Append a text node's value with HTML whitespace normalization:
/// CR/LF become spaces and space runs collapse, with the previous
/// character carried across node boundaries.
fn push_text(c: &mut Collector, raw: &str, attrs: Attrs) {
    let start = c.text.len();
    let mut prev = c.text.chars().last().unwrap_or(' ');

    for mut ch in raw.chars() {
        if ch == '\n' || ch == '\r' {
            ch = ' ';
        }
        if ch == ' ' && prev == ' ' {
            continue;
        }
        c.text.push(ch);
        prev = ch;
    }

    if c.text.len() > start {
        c.attrs.set_range(start..c.text.len(), attrs);
    }
}

/// Append a single codepoint with its own attributes.
fn push_char(c: &mut Collector, ch: char, attrs: Attrs) {
    let start = c.text.len();
    c.text.push(ch);
    c.attrs.set_range(start..c.text.len(), attrs);
}

/// Resolve the paragraph alignment from `text-align`,
/// `text-align-last` and `direction`.
fn resolve_align(sheet: &Stylesheet, node: Node, dir: Dir) -> LayoutResult<Align> {
    match sheet.value_of(Some(node), "text-align") {
        "left" => Ok(Align::Left),
        "right" => Ok(Align::Right),
        "center" => Ok(Align::Center),
        "justify" => match sheet.value_of(Some(node), "text-align-last") {
            "left" => Ok(Align::JustifyLeft),
            "right" => Ok(Align::JustifyRight),
            "" => Ok(if dir.is_rtl() { Align::JustifyRight } else { Align::JustifyLeft }),
            other => Err(Error::BadValue {
                property: "text-align-last".into(),
                value: other.into(),
            }),
        },
        "" => Ok(if dir.is_rtl() { Align::Right } else { Align::Left }),
        other => {
            Err(Error::BadValue { property: "text-align".into(), value: other.into() })
        }
    }
}
