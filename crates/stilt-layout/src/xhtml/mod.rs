//! The XHTML driver.
//!
//! Parses an XHTML string into a DOM, dispatches block elements
//! through flow, table, list and image layout, and collects inline
//! content into attribute-indexed paragraph input.

mod entities;
mod phrasing;

pub(crate) use self::phrasing::phrasing;

use ecow::EcoString;
use roxmltree::Node;
use stilt_library::diag::{Error, LayoutResult};
use stilt_library::font::{Font, FontVariant};
use stilt_library::geom::Fixed;
use stilt_library::layout::Layout;
use stilt_library::shape::Shape;
use stilt_library::style::{Stylesheet, parse_size_or_percent};
use stilt_library::text::Lang;

use crate::flow::{BoxContext, box_it, layout_flow};

/// Lay out an XHTML document inside a shape.
///
/// The document must be `html > head?, body`; the body contains flow
/// content. The returned layout starts at the top of the shape.
pub fn layout_xhtml(
    text: &str,
    sheet: &Stylesheet,
    shape: &dyn Shape,
) -> LayoutResult<Layout> {
    let decoded = entities::decode_entities(text);
    let doc = roxmltree::Document::parse(&decoded)
        .map_err(|error| Error::from_xml(error, &decoded))?;

    let root = doc.root_element();
    if root.tag_name().name() != "html" {
        return Err(Error::UnexpectedTag { path: node_path(root) });
    }

    let mut body = None;
    let mut head_seen = false;
    for child in root.children() {
        if child.is_comment()
            || (child.is_text() && child.text().unwrap_or("").trim().is_empty())
        {
            continue;
        }
        match child.tag_name().name() {
            "head" if child.is_element() && !head_seen => head_seen = true,
            "body" if child.is_element() && body.is_none() => body = Some(child),
            _ => return Err(Error::UnexpectedTag { path: node_path(child) }),
        }
    }

    match body {
        Some(body) => {
            box_it(body, sheet, shape, Fixed::ZERO, BoxContext::default(), |inner, ys| {
                layout_flow(body, sheet, inner, ys)
            })
        }
        None => Ok(Layout::new()),
    }
}

/// The tags that participate in phrasing content.
pub(crate) fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "span"
            | "i"
            | "b"
            | "em"
            | "strong"
            | "code"
            | "q"
            | "small"
            | "sub"
            | "sup"
            | "br"
            | "a"
            | "img"
    )
}

/// The slash-separated DOM ancestry of a node, for error messages.
pub(crate) fn node_path(node: Node) -> EcoString {
    let mut parts: Vec<&str> = node
        .ancestors()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    parts.reverse();

    let mut path = EcoString::new();
    for part in &parts {
        path.push('/');
        path.push_str(part);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// The face for a node per its computed `font-*` properties.
pub(crate) fn resolve_font(
    sheet: &Stylesheet,
    node: Option<Node>,
) -> LayoutResult<Font> {
    let family = sheet.value_of(node, "font-family");
    let style = sheet.value_of(node, "font-style");
    let caps = sheet.value_of(node, "font-variant");
    let weight = sheet.value_of(node, "font-weight");

    let variant = FontVariant::from_css(style, caps, weight).ok_or_else(|| {
        Error::BadValue {
            property: "font".into(),
            value: ecow::eco_format!("{style} {caps} {weight}"),
        }
    })?;
    let size = font_size(sheet, node)?;
    let path = node.map(node_path).unwrap_or_default();

    let found = sheet.find_family(family).and_then(|f| f.best_face(size, variant));
    found.ok_or_else(|| Error::FontNotFound { family: family.into(), variant, path })
}

/// A node's computed font size. Percentages resolve against the
/// parent's computed font size.
pub(crate) fn font_size(sheet: &Stylesheet, node: Option<Node>) -> LayoutResult<Fixed> {
    // Text nodes take their enclosing element's size; resolving
    // against them directly would double-apply a percentage.
    if let Some(n) = node
        && !n.is_element()
    {
        return font_size(sheet, n.parent().filter(|p| p.is_element()));
    }

    let value = sheet.value_of(node, "font-size");
    parse_size_or_percent("font-size", value, || {
        let parent = node.and_then(|n| n.parent()).filter(|p| p.is_element());
        font_size(sheet, parent)
    })
}

/// The `lang` attribute in effect for a node, inherited through its
/// ancestors.
pub(crate) fn lang_of(node: Node) -> Lang {
    node.ancestors()
        .find_map(|n| n.attribute("lang"))
        .map(Lang::new)
        .unwrap_or_default()
}
