//! Layout serialization.
//!
//! A finished layout can be persisted as XML and read back, with all
//! coordinates as raw 26.6 integers. Fonts are referenced by source
//! path, collection index and pixel size; the reader maps those back
//! to faces through a caller-supplied resolver.

use stilt_library::diag::{Error, LayoutResult};
use stilt_library::font::Font;
use stilt_library::geom::{Color, Fixed};
use stilt_library::layout::{Command, Layout};
use xmlwriter::XmlWriter;

/// Write a layout to its XML form.
pub fn write_layout(layout: &Layout) -> String {
    let mut xml = XmlWriter::new(xmlwriter::Options::default());

    xml.start_element("layout");
    xml.write_attribute("left", &layout.left().get());
    xml.write_attribute("right", &layout.right().get());
    xml.write_attribute("height", &layout.height().get());
    if let Some(baseline) = layout.first_baseline() {
        xml.write_attribute("baseline", &baseline.get());
    }

    // Fonts referenced by the commands, deduplicated in first-use
    // order.
    let mut fonts: Vec<&Font> = Vec::new();
    for command in layout.commands() {
        if let Command::Glyph { font, .. } = command
            && !fonts.contains(&font)
        {
            fonts.push(font);
        }
    }

    for (id, font) in fonts.iter().enumerate() {
        xml.start_element("font");
        xml.write_attribute("id", &id);
        xml.write_attribute("path", font.source().path.as_str());
        xml.write_attribute("index", &font.source().index);
        xml.write_attribute("size", &font.size().get());
        xml.end_element();
    }

    for (id, url) in layout.links().iter().enumerate() {
        xml.start_element("link");
        xml.write_attribute("id", &id);
        xml.write_attribute("url", url.as_str());
        xml.end_element();
    }

    for command in layout.commands() {
        match command {
            Command::Glyph { font, glyph, x, y, color, blur, link } => {
                let font_id = fonts.iter().position(|f| *f == font).unwrap_or(0);
                xml.start_element("glyph");
                xml.write_attribute("font", &font_id);
                xml.write_attribute("id", glyph);
                xml.write_attribute("x", &x.get());
                xml.write_attribute("y", &y.get());
                xml.write_attribute("color", color.to_hex().as_str());
                if !blur.is_zero() {
                    xml.write_attribute("blur", &blur.get());
                }
                if let Some(link) = link {
                    xml.write_attribute("link", link);
                }
                xml.end_element();
            }
            Command::Rect { x, y, w, h, color, blur } => {
                xml.start_element("rect");
                xml.write_attribute("x", &x.get());
                xml.write_attribute("y", &y.get());
                xml.write_attribute("w", &w.get());
                xml.write_attribute("h", &h.get());
                xml.write_attribute("color", color.to_hex().as_str());
                if !blur.is_zero() {
                    xml.write_attribute("blur", &blur.get());
                }
                xml.end_element();
            }
            Command::Image { x, y, w, h, url, link } => {
                xml.start_element("image");
                xml.write_attribute("x", &x.get());
                xml.write_attribute("y", &y.get());
                xml.write_attribute("w", &w.get());
                xml.write_attribute("h", &h.get());
                xml.write_attribute("url", url.as_str());
                if let Some(link) = link {
                    xml.write_attribute("link", link);
                }
                xml.end_element();
            }
        }
    }

    xml.end_document()
}

/// Read a layout back from its XML form.
///
/// The resolver maps a font's `(path, index, size)` reference back to
/// a face; returning `None` aborts with `FontNotFound`.
pub fn read_layout(
    text: &str,
    mut resolver: impl FnMut(&str, u32, Fixed) -> Option<Font>,
) -> LayoutResult<Layout> {
    let doc = roxmltree::Document::parse(text)
        .map_err(|error| Error::from_xml(error, text))?;
    let root = doc.root_element();
    if root.tag_name().name() != "layout" {
        return Err(Error::UnexpectedTag { path: "/".into() });
    }

    let mut layout = Layout::new();
    layout.set_left(Fixed::raw(attr_i32(root, "left")?));
    layout.set_right(Fixed::raw(attr_i32(root, "right")?));
    layout.set_height(Fixed::raw(attr_i32(root, "height")?));
    if root.attribute("baseline").is_some() {
        layout.set_first_baseline(Fixed::raw(attr_i32(root, "baseline")?));
    }

    let mut fonts: Vec<Font> = Vec::new();
    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "font" => {
                let path = node.attribute("path").unwrap_or("");
                let index = attr_i32(node, "index")? as u32;
                let size = Fixed::raw(attr_i32(node, "size")?);
                let font = resolver(path, index, size).ok_or_else(|| {
                    Error::FontNotFound {
                        family: path.into(),
                        variant: Default::default(),
                        path: "/layout/font".into(),
                    }
                })?;
                fonts.push(font);
            }
            "link" => {
                layout.add_link(node.attribute("url").unwrap_or(""));
            }
            "glyph" => {
                let font_id = attr_i32(node, "font")? as usize;
                let font = fonts.get(font_id).cloned().ok_or_else(|| {
                    bad_value("font", node.attribute("font").unwrap_or(""))
                })?;
                layout.push(Command::Glyph {
                    font,
                    glyph: attr_i32(node, "id")? as u16,
                    x: Fixed::raw(attr_i32(node, "x")?),
                    y: Fixed::raw(attr_i32(node, "y")?),
                    color: attr_color(node)?,
                    blur: attr_blur(node)?,
                    link: attr_link(node)?,
                });
            }
            "rect" => {
                layout.push(Command::Rect {
                    x: Fixed::raw(attr_i32(node, "x")?),
                    y: Fixed::raw(attr_i32(node, "y")?),
                    w: Fixed::raw(attr_i32(node, "w")?),
                    h: Fixed::raw(attr_i32(node, "h")?),
                    color: attr_color(node)?,
                    blur: attr_blur(node)?,
                });
            }
            "image" => {
                layout.push(Command::Image {
                    x: Fixed::raw(attr_i32(node, "x")?),
                    y: Fixed::raw(attr_i32(node, "y")?),
                    w: Fixed::raw(attr_i32(node, "w")?),
                    h: Fixed::raw(attr_i32(node, "h")?),
                    url: node.attribute("url").unwrap_or("").into(),
                    link: attr_link(node)?,
                });
            }
            other => return Err(bad_value("element", other)),
        }
    }

    Ok(layout)
}

fn attr_i32(node: roxmltree::Node, name: &str) -> LayoutResult<i32> {
    node.attribute(name)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_value(name, node.attribute(name).unwrap_or("")))
}

fn attr_color(node: roxmltree::Node) -> LayoutResult<Color> {
    let raw = node.attribute("color").unwrap_or("");
    Color::parse_hex(raw).ok_or_else(|| bad_value("color", raw))
}

fn attr_blur(node: roxmltree::Node) -> LayoutResult<Fixed> {
    match node.attribute("blur") {
        None => Ok(Fixed::ZERO),
        Some(_) => Ok(Fixed::raw(attr_i32(node, "blur")?)),
    }
}

fn attr_link(node: roxmltree::Node) -> LayoutResult<Option<usize>> {
    match node.attribute("link") {
        None => Ok(None),
        Some(raw) => {
            raw.parse().map(Some).map_err(|_| bad_value("link", raw))
        }
    }
}

fn bad_value(property: &str, value: &str) -> Error {
    Error::BadValue { property: property.into(), value: value.into() }
}
