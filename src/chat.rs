//! Chat components, the format Java servers use for their MOTD.
//!
//! A component can be a bare string, an object with `text` and `extra`
//! children, or an array of components. They're flattened into legacy text
//! (with `§` formatting codes) since that's what everything else deals with.

use serde::Deserialize;

use crate::status::Motd;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChatComponent {
    Text(String),
    List(Vec<ChatComponent>),
    Object(Box<ChatObject>),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ChatObject {
    #[serde(default)]
    pub text: Option<String>,
    /// Used by some servers instead of `text`, we don't have the translation
    /// tables so the key is shown as is.
    #[serde(default)]
    pub translate: Option<String>,
    #[serde(default)]
    pub extra: Vec<ChatComponent>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underlined: Option<bool>,
    #[serde(default)]
    pub strikethrough: Option<bool>,
    #[serde(default)]
    pub obfuscated: Option<bool>,
}

impl Default for ChatComponent {
    fn default() -> Self {
        ChatComponent::Text(String::new())
    }
}

impl ChatComponent {
    /// Read a component from arbitrary json, falling back to an empty one if
    /// it doesn't look like a component at all.
    pub fn from_value(value: &serde_json::Value) -> Self {
        ChatComponent::deserialize(value).unwrap_or_default()
    }

    /// Flatten the component tree into a single string with legacy formatting
    /// codes.
    pub fn to_legacy(&self) -> String {
        let mut out = String::new();
        self.write_legacy(&mut out);
        out
    }

    fn write_legacy(&self, out: &mut String) {
        match self {
            ChatComponent::Text(text) => out.push_str(text),
            ChatComponent::List(components) => {
                for component in components {
                    component.write_legacy(out);
                }
            }
            ChatComponent::Object(object) => {
                if let Some(code) = object.color.as_deref().and_then(color_code) {
                    out.push('§');
                    out.push(code);
                }
                for (enabled, code) in [
                    (object.obfuscated, 'k'),
                    (object.bold, 'l'),
                    (object.strikethrough, 'm'),
                    (object.underlined, 'n'),
                    (object.italic, 'o'),
                ] {
                    if enabled == Some(true) {
                        out.push('§');
                        out.push(code);
                    }
                }
                if let Some(text) = object.text.as_deref().or(object.translate.as_deref()) {
                    out.push_str(text);
                }
                for child in &object.extra {
                    child.write_legacy(out);
                }
            }
        }
    }

    pub fn to_motd(&self) -> Motd {
        Motd::from_text(&self.to_legacy())
    }
}

/// Named colors to their legacy code. Hex colors have no legacy equivalent.
fn color_code(color: &str) -> Option<char> {
    Some(match color {
        "black" => '0',
        "dark_blue" => '1',
        "dark_green" => '2',
        "dark_aqua" => '3',
        "dark_red" => '4',
        "dark_purple" => '5',
        "gold" => '6',
        "gray" => '7',
        "dark_gray" => '8',
        "blue" => '9',
        "green" => 'a',
        "aqua" => 'b',
        "red" => 'c',
        "light_purple" => 'd',
        "yellow" => 'e',
        "white" => 'f',
        "reset" => 'r',
        _ => return None,
    })
}
