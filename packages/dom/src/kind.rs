use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element kinds the engine knows how to render.
///
/// `Other` stands for a custom tag; its name is carried by the mutation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    A,
    Br,
    Button,
    Col,
    Colgroup,
    Div,
    Fieldset,
    Form,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Iframe,
    Img,
    Input,
    Label,
    Legend,
    Li,
    Ol,
    Option,
    Ul,
    Script,
    Select,
    Span,
    Table,
    Tbody,
    Thead,
    Tfoot,
    Th,
    Td,
    Textarea,
    Optgroup,
    Tr,
    P,
    Canvas,
    Map,
    Area,
    Style,
    Object,
    Param,
    Audio,
    Video,
    Source,
    B,
    Strong,
    Em,
    I,
    Hr,
    Datalist,
    Other,
}

struct KindInfo {
    tag: &'static str,
    inline: bool,
    self_closing: bool,
    bulk_rewrite_safe: bool,
}

const fn info(tag: &'static str, inline: bool) -> KindInfo {
    KindInfo {
        tag,
        inline,
        self_closing: false,
        bulk_rewrite_safe: true,
    }
}

const fn void(tag: &'static str, inline: bool) -> KindInfo {
    KindInfo {
        tag,
        inline,
        self_closing: true,
        bulk_rewrite_safe: true,
    }
}

const fn rewrite_unsafe(tag: &'static str, inline: bool) -> KindInfo {
    KindInfo {
        tag,
        inline,
        self_closing: false,
        bulk_rewrite_safe: false,
    }
}

// Indexed by discriminant; `Other` has no entry.
const KINDS: [KindInfo; 51] = [
    info("a", true),
    void("br", false),
    info("button", true),
    void("col", false),
    rewrite_unsafe("colgroup", false),
    info("div", false),
    info("fieldset", false),
    info("form", false),
    info("h1", false),
    info("h2", false),
    info("h3", false),
    info("h4", false),
    info("h5", false),
    info("h6", false),
    info("iframe", true),
    void("img", true),
    void("input", true),
    info("label", true),
    info("legend", true),
    info("li", false),
    info("ol", false),
    info("option", true),
    info("ul", false),
    info("script", false),
    rewrite_unsafe("select", true),
    info("span", true),
    rewrite_unsafe("table", false),
    rewrite_unsafe("tbody", false),
    rewrite_unsafe("thead", false),
    rewrite_unsafe("tfoot", false),
    info("th", false),
    rewrite_unsafe("td", false),
    info("textarea", true),
    rewrite_unsafe("optgroup", true),
    rewrite_unsafe("tr", false),
    info("p", false),
    info("canvas", true),
    info("map", false),
    void("area", true),
    info("style", true),
    info("object", false),
    info("param", false),
    info("audio", false),
    info("video", false),
    info("source", false),
    info("b", true),
    info("strong", true),
    info("em", true),
    info("i", true),
    info("hr", false),
    info("datalist", false),
];

impl ElementKind {
    /// Every kind with a fixed tag name, in catalogue order
    pub const ALL: [ElementKind; 51] = [
        ElementKind::A,
        ElementKind::Br,
        ElementKind::Button,
        ElementKind::Col,
        ElementKind::Colgroup,
        ElementKind::Div,
        ElementKind::Fieldset,
        ElementKind::Form,
        ElementKind::H1,
        ElementKind::H2,
        ElementKind::H3,
        ElementKind::H4,
        ElementKind::H5,
        ElementKind::H6,
        ElementKind::Iframe,
        ElementKind::Img,
        ElementKind::Input,
        ElementKind::Label,
        ElementKind::Legend,
        ElementKind::Li,
        ElementKind::Ol,
        ElementKind::Option,
        ElementKind::Ul,
        ElementKind::Script,
        ElementKind::Select,
        ElementKind::Span,
        ElementKind::Table,
        ElementKind::Tbody,
        ElementKind::Thead,
        ElementKind::Tfoot,
        ElementKind::Th,
        ElementKind::Td,
        ElementKind::Textarea,
        ElementKind::Optgroup,
        ElementKind::Tr,
        ElementKind::P,
        ElementKind::Canvas,
        ElementKind::Map,
        ElementKind::Area,
        ElementKind::Style,
        ElementKind::Object,
        ElementKind::Param,
        ElementKind::Audio,
        ElementKind::Video,
        ElementKind::Source,
        ElementKind::B,
        ElementKind::Strong,
        ElementKind::Em,
        ElementKind::I,
        ElementKind::Hr,
        ElementKind::Datalist,
    ];

    fn info(self) -> Option<&'static KindInfo> {
        KINDS.get(self as usize)
    }

    /// Canonical tag name; `None` for custom tags
    pub fn tag_name(self) -> Option<&'static str> {
        self.info().map(|i| i.tag)
    }

    pub fn is_default_inline(self) -> bool {
        self.info().map_or(false, |i| i.inline)
    }

    /// Void elements, written as `<tag ... />` without children
    pub fn is_self_closing(self) -> bool {
        self.info().map_or(false, |i| i.self_closing)
    }

    /// Whether the element's content may be replaced in one `innerHTML`
    /// assignment. Table structure, selects and option groups are ignored or
    /// corrupted by at least one deployed engine, so their children are
    /// always inserted one by one.
    pub fn accepts_bulk_rewrite(self) -> bool {
        self.info().map_or(true, |i| i.bulk_rewrite_safe)
    }

    /// Kinds that collapse incorrectly when left completely empty on the
    /// empty-element quirk engine.
    pub fn needs_placeholder_when_empty(self) -> bool {
        self == ElementKind::Div
    }

    /// Look up a kind by tag name (case-insensitive)
    pub fn parse_tag_name(tag: &str) -> Option<ElementKind> {
        ElementKind::ALL
            .iter()
            .copied()
            .find(|k| k.tag_name().map_or(false, |t| t.eq_ignore_ascii_case(tag)))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name().unwrap_or("other"))
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::parse_tag_name(s).ok_or_else(|| format!("Unknown element kind: {}", s))
    }
}

/// Tag name test for elements referenced only by name
pub fn is_self_closing_tag(tag: &str) -> bool {
    matches!(
        tag,
        "br" | "hr" | "img" | "area" | "col" | "input" | "link" | "meta"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_aligned_with_enum() {
        for (index, kind) in ElementKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, index);
            assert_eq!(ElementKind::parse_tag_name(kind.tag_name().unwrap()), Some(*kind));
        }
        assert_eq!(ElementKind::Other.tag_name(), None);
    }

    #[test]
    fn test_bulk_rewrite_unsafe_kinds() {
        let unsafe_kinds: Vec<_> = ElementKind::ALL
            .iter()
            .filter(|k| !k.accepts_bulk_rewrite())
            .map(|k| k.tag_name().unwrap())
            .collect();
        assert_eq!(
            unsafe_kinds,
            vec!["colgroup", "select", "table", "tbody", "thead", "tfoot", "td", "optgroup", "tr"]
        );
        assert!(ElementKind::Other.accepts_bulk_rewrite());
    }

    #[test]
    fn test_self_closing() {
        assert!(ElementKind::Input.is_self_closing());
        assert!(ElementKind::Br.is_self_closing());
        assert!(!ElementKind::Hr.is_self_closing());
        assert!(!ElementKind::Div.is_self_closing());
        assert!(is_self_closing_tag("meta"));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("TBODY".parse::<ElementKind>(), Ok(ElementKind::Tbody));
        assert!("blink".parse::<ElementKind>().is_err());
        assert_eq!(ElementKind::Span.to_string(), "span");
        assert!(ElementKind::Span.is_default_inline());
        assert!(!ElementKind::P.is_default_inline());
    }
}
