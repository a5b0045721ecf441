use std::sync::Arc;

use smallvec::SmallVec;
use stilt_library::diag::LayoutResult;
use stilt_library::font::Font;
use stilt_library::geom::Fixed;
use stilt_library::layout::{Command, Layout};
use stilt_library::shape::Shape;
use stilt_library::text::Attrs;

use super::linebreak::{Line, bounds};
use super::prepare::{Item, ItemBody, Preparation};
use super::{Align, ParProps};

/// A contiguous underlined stretch being accumulated while walking a
/// line in visual order.
struct UnderlineSeg {
    start: Fixed,
    end: Fixed,
    font: Font,
    attrs: Arc<Attrs>,
}

/// Emit the commands for one line.
///
/// Runs are walked in visual order after BiDi reordering; within a
/// run, the shaped glyphs are already visual. Shadows precede the
/// glyph or rect they decorate.
pub fn commit_line(
    layout: &mut Layout,
    p: &Preparation,
    line: &Line,
    shape: &dyn Shape,
    props: &ParProps,
    first: bool,
) -> LayoutResult<()> {
    let (left, right) = bounds(shape, props, line.y, line.height, first);
    let free = right - left - line.width;

    let spaces = count_spaces(p, line);
    let justify = line.justify && free > Fixed::ZERO && spaces > 0;
    let (per_space, mut remainder) = if justify {
        (free / spaces, free.get() % spaces)
    } else {
        (Fixed::ZERO, 0)
    };

    let mut x = match props.align {
        Align::Left | Align::JustifyLeft => left,
        Align::Center => left + free / 2,
        Align::Right => right - line.width,
        Align::JustifyRight => {
            if justify {
                left
            } else {
                right - line.width
            }
        }
    };

    if layout.first_baseline().is_none() {
        layout.set_first_baseline(line.baseline);
    }

    if line.trimmed.is_empty() && line.hyphen.is_none() {
        return Ok(());
    }

    let mut deco: Option<UnderlineSeg> = None;

    // In a right-to-left paragraph the line ends at its left edge, so
    // a break hyphen goes before the reordered runs.
    if let Some(pos) = line.hyphen
        && props.dir.is_rtl()
    {
        x += emit_hyphen(layout, p, pos, x, line.baseline);
    }

    let para = p
        .bidi
        .paragraphs
        .iter()
        .find(|para| {
            para.range.start <= line.trimmed.start && line.trimmed.end <= para.range.end
        });
    let Some(para) = para else { return Ok(()) };
    let (_, runs) = p.bidi.visual_runs(para, line.trimmed.clone());

    for run in runs {
        let rtl = p.bidi.levels[run.start].is_rtl();
        let lo = run.start.max(line.trimmed.start);
        let hi = run.end.min(line.trimmed.end);

        let mut items: SmallVec<[&Item; 8]> = p.slice(lo..hi).collect();
        if rtl {
            // A right-to-left run's items appear mirrored.
            items.reverse();
        }

        for item in items {
            match &item.body {
                ItemBody::Text(shaped) => {
                    for glyph in
                        shaped.glyphs.iter().filter(|g| g.start >= lo && g.start < hi)
                    {
                        let mut advance = glyph.x_advance;
                        if justify && glyph.is_space() {
                            advance += per_space;
                            if remainder > 0 {
                                advance += Fixed::raw(1);
                                remainder -= 1;
                            }
                        }

                        track_underline(
                            layout,
                            &mut deco,
                            item.attrs.underline(),
                            x,
                            x + advance,
                            &shaped.font,
                            &item.attrs,
                            props,
                            line.baseline,
                        );

                        let gx = x + glyph.x_offset;
                        let gy =
                            line.baseline - item.attrs.baseline_shift - glyph.y_offset;
                        for shadow in &item.attrs.shadows {
                            layout.push(Command::Glyph {
                                font: shaped.font.clone(),
                                glyph: glyph.glyph,
                                x: gx + shadow.dx,
                                y: gy + shadow.dy,
                                color: shadow.color,
                                blur: shadow.blur,
                                link: None,
                            });
                        }
                        layout.push(Command::Glyph {
                            font: shaped.font.clone(),
                            glyph: glyph.glyph,
                            x: gx,
                            y: gy,
                            color: item.attrs.color,
                            blur: Fixed::ZERO,
                            link: item.attrs.link,
                        });

                        x += advance;
                    }
                }
                ItemBody::Inlay => {
                    if item.range.start >= lo && item.range.start < hi {
                        let advance = item.width();
                        if let Some(font) = &item.attrs.font {
                            track_underline(
                                layout,
                                &mut deco,
                                item.attrs.underline(),
                                x,
                                x + advance,
                                font,
                                &item.attrs,
                                props,
                                line.baseline,
                            );
                        }
                        emit_inlay(layout, item, x, line.baseline);
                        x += advance;
                    }
                }
                ItemBody::Control => {}
            }
        }
    }

    if let Some(pos) = line.hyphen
        && !props.dir.is_rtl()
    {
        emit_hyphen(layout, p, pos, x, line.baseline);
    }

    flush_underline(layout, &mut deco, line.baseline);
    Ok(())
}

/// The number of justifiable space clusters on the line.
fn count_spaces(p: &Preparation, line: &Line) -> i32 {
    let mut spaces = 0;
    for item in p.slice(line.trimmed.clone()) {
        if let ItemBody::Text(shaped) = &item.body {
            spaces += shaped
                .glyphs
                .iter()
                .filter(|g| {
                    g.start >= line.trimmed.start
                        && g.start < line.trimmed.end
                        && g.is_space()
                })
                .count() as i32;
        }
    }
    spaces
}

/// Extend, start or flush the current underline segment.
#[allow(clippy::too_many_arguments)]
fn track_underline(
    layout: &mut Layout,
    deco: &mut Option<UnderlineSeg>,
    underline: bool,
    start: Fixed,
    end: Fixed,
    font: &Font,
    attrs: &Arc<Attrs>,
    props: &ParProps,
    baseline: Fixed,
) {
    if underline {
        match deco {
            Some(seg) => seg.end = end,
            None => {
                *deco = Some(UnderlineSeg {
                    start,
                    end,
                    font: props.underline_font.clone().unwrap_or_else(|| font.clone()),
                    attrs: attrs.clone(),
                });
            }
        }
    } else {
        flush_underline(layout, deco, baseline);
    }
}

/// Emit the rect (and its shadows) for a finished underline segment.
fn flush_underline(layout: &mut Layout, deco: &mut Option<UnderlineSeg>, baseline: Fixed) {
    let Some(seg) = deco.take() else { return };

    let metrics = seg.font.metrics().underline;
    let y = baseline - metrics.position - metrics.thickness / 2;
    let w = seg.end - seg.start;
    if w <= Fixed::ZERO {
        return;
    }

    for shadow in &seg.attrs.shadows {
        layout.push(Command::Rect {
            x: seg.start + shadow.dx,
            y: y + shadow.dy,
            w,
            h: metrics.thickness,
            color: shadow.color,
            blur: shadow.blur,
        });
    }
    layout.push(Command::Rect {
        x: seg.start,
        y,
        w,
        h: metrics.thickness,
        color: seg.attrs.color,
        blur: Fixed::ZERO,
    });
}

/// Emit the visible hyphen for a line broken at a soft hyphen and
/// return its advance.
fn emit_hyphen(
    layout: &mut Layout,
    p: &Preparation,
    pos: usize,
    x: Fixed,
    baseline: Fixed,
) -> Fixed {
    let Some(attrs) = p.attrs_at(pos) else { return Fixed::ZERO };
    let Some(font) = attrs.font.clone() else { return Fixed::ZERO };

    let glyph = font.glyph_index('-').unwrap_or(0);
    let advance = font.advance(glyph);
    layout.push(Command::Glyph {
        font,
        glyph,
        x,
        y: baseline - attrs.baseline_shift,
        color: attrs.color,
        blur: Fixed::ZERO,
        link: attrs.link,
    });
    advance
}

/// Copy an inlay's commands to the glyph slot, with the slot's link
/// applied to commands that can carry one.
fn emit_inlay(layout: &mut Layout, item: &Item, x: Fixed, baseline: Fixed) {
    let Some(inlay) = item.attrs.inlay.as_deref() else { return };

    let dx = x - inlay.left();
    let dy = baseline - item.attrs.baseline_shift - inlay.height();
    for command in inlay.commands() {
        let mut command = command.clone();
        command.translate(dx, dy);
        if item.attrs.link.is_some() {
            match &mut command {
                Command::Glyph { link, .. } | Command::Image { link, .. }
                    if link.is_none() =>
                {
                    *link = item.attrs.link;
                }
                _ => {}
            }
        }
        layout.push(command);
    }
}
