use ecow::EcoString;

use crate::text::lang::lang_prefix_eq;

/// A parsed selector: a descendant chain of simple selectors, the last
/// of which is the subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    parts: Vec<SimpleSelector>,
}

/// One step of a descendant chain: `tag`, `.class`, `tag.class` or
/// `tag[attr|=value]`.
#[derive(Debug, Default, Clone, PartialEq)]
struct SimpleSelector {
    tag: Option<EcoString>,
    class: Option<EcoString>,
    attr: Option<(EcoString, EcoString)>,
}

/// How specific a selector is: `(classes + attributes, tags, total
/// attribute value length)`, compared lexicographically. The value
/// length makes a longer `|=` prefix win over a shorter one.
pub type Specificity = (u32, u32, u32);

impl Selector {
    /// Parse a selector. Returns `None` for syntax outside the
    /// supported subset.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<_> = s
            .split_whitespace()
            .map(SimpleSelector::parse)
            .collect::<Option<_>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    /// The selector's cascade weight.
    pub fn specificity(&self) -> Specificity {
        let mut classes = 0;
        let mut tags = 0;
        let mut value_len = 0;
        for part in &self.parts {
            classes += part.class.is_some() as u32 + part.attr.is_some() as u32;
            tags += part.tag.is_some() as u32;
            if let Some((_, value)) = &part.attr {
                value_len += value.len() as u32;
            }
        }
        (classes, tags, value_len)
    }

    /// Whether the selector matches a node, resolving the descendant
    /// combinator against the node's ancestors.
    pub fn matches(&self, node: roxmltree::Node) -> bool {
        let (subject, ancestors) = self.parts.split_last().expect("non-empty");
        if !subject.matches(node) {
            return false;
        }

        // Each remaining part must match some ancestor, in order.
        let mut current = node;
        'parts: for part in ancestors.iter().rev() {
            while let Some(parent) = current.parent() {
                current = parent;
                if parent.is_element() && part.matches(parent) {
                    continue 'parts;
                }
            }
            return false;
        }

        true
    }
}

impl SimpleSelector {
    fn parse(s: &str) -> Option<Self> {
        let mut sel = Self::default();
        let mut rest = s;

        if let Some((tag, bracketed)) = rest.split_once('[') {
            // tag[attr|=value]
            if tag.is_empty() || !is_name(tag) {
                return None;
            }
            let inner = bracketed.strip_suffix(']')?;
            let (attr, value) = inner.split_once("|=")?;
            if !is_name(attr) || value.is_empty() {
                return None;
            }
            sel.tag = Some(tag.into());
            sel.attr = Some((attr.into(), value.into()));
            return Some(sel);
        }

        if let Some((tag, class)) = rest.split_once('.') {
            if !is_name(class) {
                return None;
            }
            sel.class = Some(class.into());
            rest = tag;
        }

        if !rest.is_empty() {
            if !is_name(rest) {
                return None;
            }
            sel.tag = Some(rest.into());
        }

        if sel.tag.is_none() && sel.class.is_none() {
            return None;
        }

        Some(sel)
    }

    fn matches(&self, node: roxmltree::Node) -> bool {
        if let Some(tag) = &self.tag
            && node.tag_name().name() != tag.as_str()
        {
            return false;
        }

        if let Some(class) = &self.class {
            let found = node
                .attribute("class")
                .is_some_and(|list| list.split_whitespace().any(|c| c == class));
            if !found {
                return false;
            }
        }

        if let Some((attr, value)) = &self.attr {
            let found = node
                .attribute(attr.as_str())
                .is_some_and(|actual| lang_prefix_eq(actual, value));
            if !found {
                return false;
            }
        }

        true
    }
}

/// Whether a string is a plain identifier usable as a tag, class or
/// attribute name.
fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(xml: &'static str) -> roxmltree::Document<'static> {
        roxmltree::Document::parse(xml).unwrap()
    }

    fn find<'a>(
        doc: &'a roxmltree::Document<'a>,
        tag: &str,
    ) -> roxmltree::Node<'a, 'a> {
        doc.descendants().find(|n| n.has_tag_name(tag)).unwrap()
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        assert!(Selector::parse("p").is_some());
        assert!(Selector::parse(".warn").is_some());
        assert!(Selector::parse("p.warn").is_some());
        assert!(Selector::parse("p[lang|=en]").is_some());
        assert!(Selector::parse("div p.warn").is_some());
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse("*").is_none());
        assert!(Selector::parse("p:hover").is_none());
        assert!(Selector::parse("p > em").is_none());
    }

    #[test]
    fn test_specificity_order() {
        let tag = Selector::parse("p").unwrap();
        let class = Selector::parse(".warn").unwrap();
        let both = Selector::parse("p.warn").unwrap();
        let attr_short = Selector::parse("p[lang|=en]").unwrap();
        let attr_long = Selector::parse("p[lang|=en-US]").unwrap();

        assert!(class.specificity() > tag.specificity());
        assert!(both.specificity() > class.specificity());
        assert!(attr_long.specificity() > attr_short.specificity());
    }

    #[test]
    fn test_matching() {
        let doc = doc(
            "<html><body><div class='a b'><p lang='en-US'>x</p></div></body></html>",
        );
        let p = find(&doc, "p");
        let div = find(&doc, "div");

        assert!(Selector::parse("p").unwrap().matches(p));
        assert!(!Selector::parse("div").unwrap().matches(p));
        assert!(Selector::parse(".a").unwrap().matches(div));
        assert!(Selector::parse(".b").unwrap().matches(div));
        assert!(!Selector::parse(".c").unwrap().matches(div));
        assert!(Selector::parse("div p").unwrap().matches(p));
        assert!(Selector::parse("body p").unwrap().matches(p));
        assert!(!Selector::parse("p div").unwrap().matches(p));
        assert!(Selector::parse("p[lang|=en]").unwrap().matches(p));
        assert!(Selector::parse("p[lang|=en-US]").unwrap().matches(p));
        assert!(!Selector::parse("p[lang|=de]").unwrap().matches(p));
    }
}
