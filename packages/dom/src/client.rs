use serde::{Deserialize, Serialize};

/// Browser engine families that need special treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum UserAgent {
    #[default]
    Generic,
    Gecko,
    WebKit,
    Konqueror,
    Ie6,
    Ie7,
    Ie8,
    Ie9,
    Ie10Plus,
}

impl UserAgent {
    pub fn is_ie(self) -> bool {
        self >= UserAgent::Ie6
    }

    /// Engines that accept a whole opening tag in `document.createElement`
    pub fn creates_from_opening_tag(self) -> bool {
        matches!(self, UserAgent::Ie6 | UserAgent::Ie7 | UserAgent::Ie8)
    }

    /// Engines where the wheel event is only delivered to listeners
    pub fn needs_wheel_listener(self) -> bool {
        self >= UserAgent::Ie9
    }

    /// Engines that need the CSS prefix for the flexbox/box-sizing group
    pub fn vendor_prefix(self) -> Option<&'static str> {
        match self {
            UserAgent::Gecko => Some("-moz-"),
            UserAgent::WebKit => Some("-webkit-"),
            _ => None,
        }
    }
}

/// What the receiving client can do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientProfile {
    /// Whether the client runs script; without it clicks are delivered by
    /// form submission
    pub scripting: bool,
    pub agent: UserAgent,
    /// Crawlers get neither button wraps nor `name` attributes
    pub spider_bot: bool,
    /// URL of the current page, used for links that encode a click
    pub page_url: String,
    /// Whether the theme can style an anchor like a button, so that clicked
    /// anchors may become plain links instead of being wrapped
    pub anchor_as_button: bool,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            scripting: true,
            agent: UserAgent::Generic,
            spider_bot: false,
            page_url: "?".to_string(),
            anchor_as_button: true,
        }
    }
}

impl ClientProfile {
    /// A client with scripting disabled
    pub fn plain_html() -> Self {
        Self {
            scripting: false,
            ..Self::default()
        }
    }

    pub fn with_agent(mut self, agent: UserAgent) -> Self {
        self.agent = agent;
        self
    }

    /// Whether the empty-element height quirk applies
    pub fn has_empty_element_quirk(&self) -> bool {
        self.agent == UserAgent::Ie6
    }

    /// Whether min/max sizes must be emulated
    pub fn needs_min_max_emulation(&self) -> bool {
        self.agent == UserAgent::Ie6
    }
}

/// Names of the client runtime objects generated script calls into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Global object exposing the DOM helpers (`$`, `setHtml`, `insertAt`, ...)
    pub runtime_class: String,
    /// Application object exposing `_p_` (timers, signals, global events)
    pub app_class: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            runtime_class: "Wt".to_string(),
            app_class: "APP".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_capabilities() {
        assert!(UserAgent::Ie8.is_ie());
        assert!(!UserAgent::WebKit.is_ie());
        assert!(UserAgent::Ie7.creates_from_opening_tag());
        assert!(!UserAgent::Ie9.creates_from_opening_tag());
        assert!(UserAgent::Ie10Plus.needs_wheel_listener());
        assert_eq!(UserAgent::Gecko.vendor_prefix(), Some("-moz-"));
    }

    #[test]
    fn test_profile_from_partial_json() {
        let profile: ClientProfile =
            serde_json::from_str(r#"{ "scripting": false, "agent": "ie6" }"#).unwrap();
        assert!(!profile.scripting);
        assert!(profile.has_empty_element_quirk());
        assert_eq!(profile.page_url, "?");
    }

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.runtime_class, "Wt");
        assert_eq!(config.app_class, "APP");
    }
}
