//! The CSS-subset style sheet.

mod selector;
mod values;

pub use self::selector::{Selector, Specificity};
pub use self::values::{
    Rounding, parse_color, parse_shadows, parse_size, parse_size_or_percent,
};

use std::collections::HashMap;

use ecow::EcoString;

use crate::diag::{Error, LayoutResult};
use crate::font::{FontFamily, FontSource, FontVariant};

/// A style sheet: cascade rules plus the font families layout may
/// draw from.
///
/// Sheets are built imperatively with [`add_rule`](Self::add_rule) and
/// [`add_font`](Self::add_font), then borrowed immutably for the
/// duration of every layout call.
pub struct Stylesheet {
    rules: Vec<Rule>,
    families: HashMap<EcoString, FontFamily>,
    rounding: Rounding,
}

struct Rule {
    selector: Selector,
    specificity: Specificity,
    property: EcoString,
    value: EcoString,
}

impl Stylesheet {
    /// Create a sheet with no rules; the built-in defaults still
    /// apply.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            families: HashMap::new(),
            rounding: Rounding::default(),
        }
    }

    /// Add a cascade rule. The selector is parsed eagerly.
    pub fn add_rule(
        &mut self,
        selector: &str,
        property: &str,
        value: &str,
    ) -> LayoutResult<()> {
        let parsed = Selector::parse(selector).ok_or_else(|| Error::BadValue {
            property: "selector".into(),
            value: selector.into(),
        })?;
        self.rules.push(Rule {
            specificity: parsed.specificity(),
            selector: parsed,
            property: property.into(),
            value: value.into(),
        });
        Ok(())
    }

    /// Register a font source under a family name, for the default
    /// variant.
    pub fn add_font(&mut self, family: &str, source: FontSource) {
        self.add_font_variant(family, FontVariant::default(), source);
    }

    /// Register a font source under a family name for a specific
    /// variant.
    pub fn add_font_variant(
        &mut self,
        family: &str,
        variant: FontVariant,
        source: FontSource,
    ) {
        self.families
            .entry(family.into())
            .or_insert_with(|| FontFamily::new(family))
            .add(variant, source);
    }

    /// Look up a registered family.
    pub fn find_family(&self, name: &str) -> Option<&FontFamily> {
        self.families.get(name)
    }

    /// How the paragraph layouter rounds vertical positions.
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Set the rounding behavior.
    pub fn set_rounding(&mut self, rounding: Rounding) {
        self.rounding = rounding;
    }

    /// The effective value of a property on a node.
    ///
    /// Considers matching rules (most specific wins, source order
    /// breaks ties), then inheritance for inheritable properties, then
    /// the built-in defaults. Without a node, the defaults apply
    /// directly. Unknown properties yield the empty string, which
    /// callers treat as "not set".
    pub fn value_of(&self, node: Option<roxmltree::Node>, property: &str) -> &str {
        let Some(node) = node else {
            return default_value(property);
        };

        if node.is_element() {
            let best = self
                .rules
                .iter()
                .filter(|rule| rule.property == property)
                .enumerate()
                .filter(|(_, rule)| rule.selector.matches(node))
                .max_by_key(|(order, rule)| (rule.specificity, *order));
            if let Some((_, rule)) = best {
                return &rule.value;
            }
        }

        if is_inherited(property) {
            let parent = node.parent().filter(|parent| parent.is_element());
            if parent.is_some() {
                return self.value_of(parent, property);
            }
        }

        default_value(property)
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a property's value propagates from parent to child
/// elements.
fn is_inherited(property: &str) -> bool {
    matches!(property, "color" | "direction" | "line-height")
        || property.starts_with("font-")
        || property.starts_with("text-")
}

/// The built-in default for a property, mirroring typical browser
/// defaults for the supported subset.
fn default_value(property: &str) -> &'static str {
    match property {
        "color" => "#000000",
        "font-family" => "sans",
        "font-size" => "10px",
        "font-style" => "normal",
        "font-variant" => "normal",
        "font-weight" => "normal",
        "direction" => "ltr",
        "text-indent" => "0px",
        "padding" | "margin" | "border-width" => "0px",
        "background-color" => "transparent",
        "vertical-align" => "top",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rules: &[(&str, &str, &str)]) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        for (selector, property, value) in rules {
            sheet.add_rule(selector, property, value).unwrap();
        }
        sheet
    }

    #[test]
    fn test_defaults_without_node() {
        let sheet = Stylesheet::new();
        assert_eq!(sheet.value_of(None, "color"), "#000000");
        assert_eq!(sheet.value_of(None, "font-size"), "10px");
        assert_eq!(sheet.value_of(None, "direction"), "ltr");
        assert_eq!(sheet.value_of(None, "text-decoration"), "");
        assert_eq!(sheet.value_of(None, "no-such-property"), "");
    }

    #[test]
    fn test_cascade_specificity_and_order() {
        let sheet = sheet(&[
            ("p", "color", "#111111"),
            (".warn", "color", "#222222"),
            ("p", "color", "#333333"),
        ]);
        let doc = roxmltree::Document::parse(
            "<html><body><p class='warn'>x</p><p>y</p></body></html>",
        )
        .unwrap();
        let mut paragraphs = doc.descendants().filter(|n| n.has_tag_name("p"));
        let warn = paragraphs.next().unwrap();
        let plain = paragraphs.next().unwrap();

        // Class beats tag; among equal tags the later rule wins.
        assert_eq!(sheet.value_of(Some(warn), "color"), "#222222");
        assert_eq!(sheet.value_of(Some(plain), "color"), "#333333");
    }

    #[test]
    fn test_inheritance() {
        let sheet = sheet(&[("body", "color", "#123456"), ("p", "padding", "7px")]);
        let doc = roxmltree::Document::parse(
            "<html><body><p><span>x</span></p></body></html>",
        )
        .unwrap();
        let span = doc.descendants().find(|n| n.has_tag_name("span")).unwrap();
        let text = span.first_child().unwrap();

        // color inherits through p and span down to the text node.
        assert_eq!(sheet.value_of(Some(span), "color"), "#123456");
        assert_eq!(sheet.value_of(Some(text), "color"), "#123456");
        // padding does not inherit.
        assert_eq!(sheet.value_of(Some(span), "padding"), "0px");
    }

    #[test]
    fn test_descendant_rules() {
        let sheet = sheet(&[("div p", "text-indent", "4px")]);
        let doc = roxmltree::Document::parse(
            "<html><body><div><p>x</p></div><p>y</p></body></html>",
        )
        .unwrap();
        let mut paragraphs = doc.descendants().filter(|n| n.has_tag_name("p"));
        let nested = paragraphs.next().unwrap();
        let top = paragraphs.next().unwrap();

        assert_eq!(sheet.value_of(Some(nested), "text-indent"), "4px");
        assert_eq!(sheet.value_of(Some(top), "text-indent"), "0px");
    }

    #[test]
    fn test_bad_selector() {
        let mut sheet = Stylesheet::new();
        assert!(sheet.add_rule("p:first-child", "color", "#000000").is_err());
    }
}
