use ecow::EcoString;

use crate::diag::{Error, LayoutResult};
use crate::geom::{Color, Fixed};
use crate::text::Shadow;

/// How the paragraph layouter rounds vertical positions.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Rounding {
    /// Keep raw 26.6 positions.
    None,
    /// Round line heights and baselines to whole pixels.
    #[default]
    Pixel,
    /// Round only baseline positions to whole pixels.
    Baseline,
}

/// Parse a size value in the `<num>px` form.
pub fn parse_size(property: &str, value: &str) -> LayoutResult<Fixed> {
    let number = value
        .strip_suffix("px")
        .and_then(|num| num.trim().parse::<f64>().ok())
        .filter(|num| num.is_finite())
        .ok_or_else(|| bad_value(property, value))?;
    Ok(Fixed::from_px_f64(number))
}

/// Parse a size value in the `<num>px` or `<num>%` form. The percent
/// base is computed lazily since resolving it may itself fail.
pub fn parse_size_or_percent(
    property: &str,
    value: &str,
    base: impl FnOnce() -> LayoutResult<Fixed>,
) -> LayoutResult<Fixed> {
    if let Some(percent) = value.strip_suffix('%') {
        let number = percent
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|num| num.is_finite())
            .ok_or_else(|| bad_value(property, value))?;
        return Ok(Fixed::from_px_f64(base()?.to_px() * number / 100.0));
    }
    parse_size(property, value)
}

/// Parse a CSS color value.
pub fn parse_color(property: &str, value: &str) -> LayoutResult<Color> {
    Color::parse(value).ok_or_else(|| bad_value(property, value))
}

/// Parse a `text-shadow` list: `dx dy [blur] color`, comma-separated.
pub fn parse_shadows(value: &str) -> LayoutResult<Vec<Shadow>> {
    let mut shadows = Vec::new();
    if value.trim().is_empty() {
        return Ok(shadows);
    }

    for entry in value.split(',') {
        let parts: Vec<_> = entry.split_whitespace().collect();
        let (sizes, color) = match parts.as_slice() {
            [dx, dy, color] => ([*dx, *dy, "0px"], *color),
            [dx, dy, blur, color] => ([*dx, *dy, *blur], *color),
            _ => return Err(bad_value("text-shadow", value)),
        };
        shadows.push(Shadow {
            dx: parse_size("text-shadow", sizes[0])?,
            dy: parse_size("text-shadow", sizes[1])?,
            blur: parse_size("text-shadow", sizes[2])?,
            color: parse_color("text-shadow", color)?,
        });
    }

    Ok(shadows)
}

fn bad_value(property: &str, value: &str) -> Error {
    Error::BadValue { property: EcoString::from(property), value: EcoString::from(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("margin", "16px").unwrap(), Fixed::from_px(16));
        assert_eq!(parse_size("margin", "0.5px").unwrap(), Fixed::raw(32));
        assert_eq!(parse_size("margin", "-2px").unwrap(), Fixed::from_px(-2));
        assert!(parse_size("margin", "16").is_err());
        assert!(parse_size("margin", "2em").is_err());
        assert!(parse_size("margin", "50%").is_err());
        assert!(parse_size("margin", "").is_err());
    }

    #[test]
    fn test_parse_percent() {
        let base = || Ok(Fixed::from_px(200));
        assert_eq!(
            parse_size_or_percent("width", "50%", base).unwrap(),
            Fixed::from_px(100)
        );
        assert_eq!(
            parse_size_or_percent("width", "30px", base).unwrap(),
            Fixed::from_px(30)
        );
    }

    #[test]
    fn test_parse_shadows() {
        let shadows = parse_shadows("1px 2px #ff0000, -1px 0px 3px #0000ff").unwrap();
        assert_eq!(shadows.len(), 2);
        assert_eq!(shadows[0].dx, Fixed::from_px(1));
        assert_eq!(shadows[0].blur, Fixed::ZERO);
        assert_eq!(shadows[1].dx, Fixed::from_px(-1));
        assert_eq!(shadows[1].blur, Fixed::from_px(3));
        assert!(parse_shadows("1px #ff0000").is_err());
        assert!(parse_shadows("").unwrap().is_empty());
    }
}
