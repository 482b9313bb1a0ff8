//! Keyboard shortcuts of GUI actions: representation, parsing and formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Modifier keys (combinations) used for shortcuts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    None,
    Ctrl,
    Alt,
    Shift,
    CtrlAlt,
    CtrlShift,
    AltShift,
    CtrlAltShift,
}

impl Modifier {
    /// Combine the three modifier flags of a key press.
    pub fn from_flags(ctrl: bool, alt: bool, shift: bool) -> Self {
        match (ctrl, alt, shift) {
            (false, false, false) => Modifier::None,
            (true, false, false) => Modifier::Ctrl,
            (false, true, false) => Modifier::Alt,
            (false, false, true) => Modifier::Shift,
            (true, true, false) => Modifier::CtrlAlt,
            (true, false, true) => Modifier::CtrlShift,
            (false, true, true) => Modifier::AltShift,
            (true, true, true) => Modifier::CtrlAltShift,
        }
    }

    fn parse(mods: &[&str]) -> Result<Self, String> {
        let mut ctrl = false;
        let mut alt = false;
        let mut shift = false;
        for m in mods {
            let flag = match m.to_lowercase().as_str() {
                "ctrl" | "control" => &mut ctrl,
                "alt" => &mut alt,
                "shift" => &mut shift,
                other => return Err(format!("unknown modifier '{}'", other)),
            };
            if *flag {
                return Err(format!("duplicate modifier in {:?}", mods));
            }
            *flag = true;
        }
        Ok(Self::from_flags(ctrl, alt, shift))
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modifier::None => "",
            Modifier::Ctrl => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::CtrlAlt => "Ctrl+Alt",
            Modifier::CtrlShift => "Ctrl+Shift",
            Modifier::AltShift => "Alt+Shift",
            Modifier::CtrlAltShift => "Ctrl+Alt+Shift",
        };
        write!(f, "{}", s)
    }
}

/// A shortcut consisting of optional modifier(s) and a character key.
///
/// Letters are stored upper case. `'+'`, `'-'`, `' '` and DEL are written as
/// `Plus`, `Minus`, `Space` and `Del`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hotkey {
    pub modifier: Modifier,
    pub key: char,
}

const DELETE: char = '\u{7f}';

fn key_name(key: char) -> String {
    match key {
        '+' => "Plus".to_string(),
        '-' => "Minus".to_string(),
        ' ' => "Space".to_string(),
        DELETE => "Del".to_string(),
        other => other.to_string(),
    }
}

fn key_from_name(name: &str) -> Result<char, String> {
    match name.to_lowercase().as_str() {
        "plus" => return Ok('+'),
        "minus" => return Ok('-'),
        "space" => return Ok(' '),
        "del" | "delete" => return Ok(DELETE),
        _ => {}
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c.to_ascii_uppercase()),
        (None, _) => Err("no key char".to_string()),
        _ => Err(format!("unknown key '{}'", name)),
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier == Modifier::None {
            write!(f, "{}", key_name(self.key))
        } else {
            write!(f, "{}+{}", self.modifier, key_name(self.key))
        }
    }
}

impl FromStr for Hotkey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty hotkey".to_string());
        }
        // "Ctrl++" means Ctrl with the plus key, "+" and "++" the bare key
        let (body, plus_key) = match s.strip_suffix("++") {
            _ if s == "+" => ("", true),
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let parts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('+').map(|p| p.trim()).collect()
        };
        let (mods, key) = if plus_key {
            (&parts[..], '+')
        } else {
            let Some((last, mods)) = parts.split_last() else {
                return Err("invalid hotkey".to_string());
            };
            (mods, key_from_name(last)?)
        };
        if mods.len() > 3 {
            return Err(format!("too many modifiers: {:?}", mods));
        }
        let modifier = Modifier::parse(mods)?;
        Ok(Hotkey { modifier, key })
    }
}

impl Hotkey {
    pub fn new(modifier: Modifier, key: char) -> Self {
        Self {
            modifier,
            key: key.to_ascii_uppercase(),
        }
    }

    /// Whether a key press with `modifier` and `key` triggers this shortcut.
    pub fn matches(&self, modifier: Modifier, key: char) -> bool {
        self.modifier == modifier && self.key == key.to_ascii_uppercase()
    }
}

/// "Zoom In [Ctrl+Plus]" style tooltip.
pub fn format_tooltip(text: &str, hotkey: Option<&Hotkey>) -> String {
    match hotkey {
        Some(hk) => format!("{} [{}]", text, hk),
        None => text.to_string(),
    }
}
