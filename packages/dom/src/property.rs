use serde::{Deserialize, Serialize};

/// Managed element properties.
///
/// The declaration order is significant: it is the order in which
/// properties, and the CSS declarations collapsed into a `style` attribute,
/// are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    InnerHtml,
    AddedInnerHtml,
    Value,
    Disabled,
    ReadOnly,
    TabIndex,
    Checked,
    Selected,
    SelectedIndex,
    Multiple,
    Target,
    Download,
    Indeterminate,
    Src,
    ColSpan,
    RowSpan,
    Class,
    Label,
    Placeholder,
    Orient,
    StyleWidthExpression,
    /// Free-form style text, appended after every managed CSS declaration
    Style,
    StylePosition,
    StyleZIndex,
    StyleFloat,
    StyleClear,
    StyleWidth,
    StyleHeight,
    StyleLineHeight,
    StyleMinWidth,
    StyleMinHeight,
    StyleMaxWidth,
    StyleMaxHeight,
    StyleLeft,
    StyleRight,
    StyleTop,
    StyleBottom,
    StyleVerticalAlign,
    StyleTextAlign,
    StylePadding,
    StylePaddingTop,
    StylePaddingRight,
    StylePaddingBottom,
    StylePaddingLeft,
    StyleMargin,
    StyleMarginTop,
    StyleMarginRight,
    StyleMarginBottom,
    StyleMarginLeft,
    StyleCursor,
    StyleBorderTop,
    StyleBorderRight,
    StyleBorderBottom,
    StyleBorderLeft,
    StyleColor,
    StyleOverflowX,
    StyleOverflowY,
    StyleOpacity,
    StyleFontFamily,
    StyleFontStyle,
    StyleFontVariant,
    StyleFontWeight,
    StyleFontSize,
    StyleBackgroundColor,
    StyleBackgroundImage,
    StyleBackgroundRepeat,
    StyleBackgroundAttachment,
    StyleBackgroundPosition,
    StyleTextDecoration,
    StyleWhiteSpace,
    StyleTableLayout,
    StyleBorderSpacing,
    StyleBorderCollapse,
    StylePageBreakBefore,
    StylePageBreakAfter,
    StyleZoom,
    StyleVisibility,
    StyleDisplay,
    StyleWebkitAppearance,
    StyleBoxSizing,
    StyleFlex,
    StyleFlexDirection,
    StyleFlexFlow,
    StyleAlignSelf,
    StyleJustifyContent,
}

/// How a property value is written into the DOM from script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptValue {
    /// `el.name='escaped';`
    Quoted(&'static str),
    /// `el.name=value;` for numbers and booleans
    Raw(&'static str),
    /// `el.setAttribute('name', 'escaped');`
    Attribute,
}

/// Serialization rule for one property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyRule {
    /// Element content: `innerHTML` in script, literal children in markup
    InnerMarkup,
    /// `value` attribute, or escaped text content for text areas
    Value,
    /// Boolean attribute present only when the value is `"true"`
    BooleanAttribute {
        attribute: &'static str,
        dom: &'static str,
    },
    /// Ordinary attribute in markup
    Attribute {
        attribute: &'static str,
        script: ScriptValue,
    },
    /// No attribute form: always assigned from script, optionally on the
    /// next event-loop turn because the DOM applies it asynchronously.
    ScriptOnly { dom: &'static str, deferred: bool },
    /// One CSS declaration
    Css {
        name: &'static str,
        js_name: &'static str,
        vendor_prefixed: bool,
    },
    /// Free-form style text
    StyleText,
    /// Legacy width emulation through a CSS expression
    WidthExpression,
}

impl Property {
    pub fn rule(self) -> PropertyRule {
        use Property::*;
        use PropertyRule as R;

        match self {
            InnerHtml | AddedInnerHtml => R::InnerMarkup,
            Value => R::Value,
            Disabled => R::BooleanAttribute {
                attribute: "disabled",
                dom: "disabled",
            },
            ReadOnly => R::BooleanAttribute {
                attribute: "readonly",
                dom: "readOnly",
            },
            Checked => R::BooleanAttribute {
                attribute: "checked",
                dom: "checked",
            },
            Selected => R::BooleanAttribute {
                attribute: "selected",
                dom: "selected",
            },
            Multiple => R::BooleanAttribute {
                attribute: "multiple",
                dom: "multiple",
            },
            TabIndex => R::Attribute {
                attribute: "tabindex",
                script: ScriptValue::Raw("tabIndex"),
            },
            Target => R::Attribute {
                attribute: "target",
                script: ScriptValue::Quoted("target"),
            },
            Download => R::Attribute {
                attribute: "download",
                script: ScriptValue::Quoted("download"),
            },
            Src => R::Attribute {
                attribute: "src",
                script: ScriptValue::Quoted("src"),
            },
            ColSpan => R::Attribute {
                attribute: "colspan",
                script: ScriptValue::Raw("colSpan"),
            },
            RowSpan => R::Attribute {
                attribute: "rowspan",
                script: ScriptValue::Raw("rowSpan"),
            },
            Class => R::Attribute {
                attribute: "class",
                script: ScriptValue::Quoted("className"),
            },
            Label => R::Attribute {
                attribute: "label",
                script: ScriptValue::Quoted("label"),
            },
            Placeholder => R::Attribute {
                attribute: "placeholder",
                script: ScriptValue::Quoted("placeholder"),
            },
            Orient => R::Attribute {
                attribute: "orient",
                script: ScriptValue::Attribute,
            },
            SelectedIndex => R::ScriptOnly {
                dom: "selectedIndex",
                deferred: true,
            },
            Indeterminate => R::ScriptOnly {
                dom: "indeterminate",
                deferred: false,
            },
            StyleWidthExpression => R::WidthExpression,
            Style => R::StyleText,
            css => {
                let (name, js_name) = css_names(css);
                R::Css {
                    name,
                    js_name,
                    vendor_prefixed: css >= StyleBoxSizing,
                }
            }
        }
    }

    pub fn is_css(self) -> bool {
        self >= Property::StylePosition
    }

    /// CSS property name, for CSS-backed properties
    pub fn css_name(self) -> Option<&'static str> {
        match self.rule() {
            PropertyRule::Css { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Name of the matching `element.style` member
    pub fn css_js_name(self) -> Option<&'static str> {
        match self.rule() {
            PropertyRule::Css { js_name, .. } => Some(js_name),
            _ => None,
        }
    }

    pub fn is_min_max_size(self) -> bool {
        matches!(
            self,
            Property::StyleMinWidth
                | Property::StyleMinHeight
                | Property::StyleMaxWidth
                | Property::StyleMaxHeight
        )
    }
}

fn css_names(property: Property) -> (&'static str, &'static str) {
    use Property::*;

    match property {
        StylePosition => ("position", "position"),
        StyleZIndex => ("z-index", "zIndex"),
        StyleFloat => ("float", "cssFloat"),
        StyleClear => ("clear", "clear"),
        StyleWidth => ("width", "width"),
        StyleHeight => ("height", "height"),
        StyleLineHeight => ("line-height", "lineHeight"),
        StyleMinWidth => ("min-width", "minWidth"),
        StyleMinHeight => ("min-height", "minHeight"),
        StyleMaxWidth => ("max-width", "maxWidth"),
        StyleMaxHeight => ("max-height", "maxHeight"),
        StyleLeft => ("left", "left"),
        StyleRight => ("right", "right"),
        StyleTop => ("top", "top"),
        StyleBottom => ("bottom", "bottom"),
        StyleVerticalAlign => ("vertical-align", "verticalAlign"),
        StyleTextAlign => ("text-align", "textAlign"),
        StylePadding => ("padding", "padding"),
        StylePaddingTop => ("padding-top", "paddingTop"),
        StylePaddingRight => ("padding-right", "paddingRight"),
        StylePaddingBottom => ("padding-bottom", "paddingBottom"),
        StylePaddingLeft => ("padding-left", "paddingLeft"),
        StyleMargin => ("margin", "margin"),
        StyleMarginTop => ("margin-top", "marginTop"),
        StyleMarginRight => ("margin-right", "marginRight"),
        StyleMarginBottom => ("margin-bottom", "marginBottom"),
        StyleMarginLeft => ("margin-left", "marginLeft"),
        StyleCursor => ("cursor", "cursor"),
        StyleBorderTop => ("border-top", "borderTop"),
        StyleBorderRight => ("border-right", "borderRight"),
        StyleBorderBottom => ("border-bottom", "borderBottom"),
        StyleBorderLeft => ("border-left", "borderLeft"),
        StyleColor => ("color", "color"),
        StyleOverflowX => ("overflow-x", "overflowX"),
        StyleOverflowY => ("overflow-y", "overflowY"),
        StyleOpacity => ("opacity", "opacity"),
        StyleFontFamily => ("font-family", "fontFamily"),
        StyleFontStyle => ("font-style", "fontStyle"),
        StyleFontVariant => ("font-variant", "fontVariant"),
        StyleFontWeight => ("font-weight", "fontWeight"),
        StyleFontSize => ("font-size", "fontSize"),
        StyleBackgroundColor => ("background-color", "backgroundColor"),
        StyleBackgroundImage => ("background-image", "backgroundImage"),
        StyleBackgroundRepeat => ("background-repeat", "backgroundRepeat"),
        StyleBackgroundAttachment => ("background-attachment", "backgroundAttachment"),
        StyleBackgroundPosition => ("background-position", "backgroundPosition"),
        StyleTextDecoration => ("text-decoration", "textDecoration"),
        StyleWhiteSpace => ("white-space", "whiteSpace"),
        StyleTableLayout => ("table-layout", "tableLayout"),
        StyleBorderSpacing => ("border-spacing", "borderSpacing"),
        StyleBorderCollapse => ("border-collapse", "borderCollapse"),
        StylePageBreakBefore => ("page-break-before", "pageBreakBefore"),
        StylePageBreakAfter => ("page-break-after", "pageBreakAfter"),
        StyleZoom => ("zoom", "zoom"),
        StyleVisibility => ("visibility", "visibility"),
        StyleDisplay => ("display", "display"),
        StyleWebkitAppearance => ("-webkit-appearance", "webkitAppearance"),
        StyleBoxSizing => ("box-sizing", "boxSizing"),
        StyleFlex => ("flex", "flex"),
        StyleFlexDirection => ("flex-direction", "flexDirection"),
        StyleFlexFlow => ("flex-flow", "flexFlow"),
        StyleAlignSelf => ("align-self", "alignSelf"),
        StyleJustifyContent => ("justify-content", "justifyContent"),
        // Non-CSS properties never reach this table.
        _ => ("", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_rules() {
        assert_eq!(Property::StyleZIndex.css_name(), Some("z-index"));
        assert_eq!(Property::StyleZIndex.css_js_name(), Some("zIndex"));
        assert_eq!(Property::Class.css_name(), None);
        assert!(Property::StyleDisplay.is_css());
        assert!(!Property::Style.is_css());
    }

    #[test]
    fn test_every_css_property_has_names() {
        for property in [
            Property::StylePosition,
            Property::StyleOpacity,
            Property::StyleVisibility,
            Property::StyleJustifyContent,
        ] {
            assert!(!property.css_name().unwrap().is_empty());
            assert!(!property.css_js_name().unwrap().is_empty());
        }
    }

    #[test]
    fn test_vendor_prefixed_group() {
        assert!(matches!(
            Property::StyleFlex.rule(),
            PropertyRule::Css { vendor_prefixed: true, .. }
        ));
        assert!(matches!(
            Property::StyleWidth.rule(),
            PropertyRule::Css { vendor_prefixed: false, .. }
        ));
    }

    #[test]
    fn test_rules_for_managed_properties() {
        assert_eq!(Property::InnerHtml.rule(), PropertyRule::InnerMarkup);
        assert_eq!(
            Property::Checked.rule(),
            PropertyRule::BooleanAttribute {
                attribute: "checked",
                dom: "checked"
            }
        );
        assert_eq!(
            Property::SelectedIndex.rule(),
            PropertyRule::ScriptOnly {
                dom: "selectedIndex",
                deferred: true
            }
        );
        assert!(Property::StyleMaxHeight.is_min_max_size());
    }

    #[test]
    fn test_property_names_in_json() {
        let json = serde_json::to_string(&Property::StyleBackgroundColor).unwrap();
        assert_eq!(json, "\"styleBackgroundColor\"");
        let parsed: Property = serde_json::from_str("\"innerHtml\"").unwrap();
        assert_eq!(parsed, Property::InnerHtml);
    }
}
