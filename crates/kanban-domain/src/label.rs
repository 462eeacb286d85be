use serde::{Deserialize, Deserializer, Serialize};

/// Colour used when a foreign colour has no counterpart in the palette.
pub const FALLBACK_COLOR: &str = "slate";

const PALETTE: &[&str] = &[
    "green", "yellow", "orange", "red", "purple", "blue", "sky", "lime", "pink",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub color: String,
    pub name: String,
}

impl Label {
    pub fn new(color: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            name: name.into(),
        }
    }

    /// Map a foreign colour name onto the board palette.
    pub fn palette_color(color: Option<&str>) -> &'static str {
        let Some(color) = color else {
            return FALLBACK_COLOR;
        };
        let base = color.split('_').next().unwrap_or(color);
        PALETTE
            .iter()
            .find(|known| **known == base)
            .copied()
            .unwrap_or(FALLBACK_COLOR)
    }

    /// Display name derived from a colour, e.g. `green` -> `Green`.
    pub fn capitalized(color: &str) -> String {
        let mut chars = color.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// Older layouts stored bare colour strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelRepr {
    Color(String),
    Full {
        color: String,
        #[serde(default)]
        name: String,
    },
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match LabelRepr::deserialize(deserializer)? {
            LabelRepr::Color(color) => {
                let name = Label::capitalized(&color);
                Label { color, name }
            }
            LabelRepr::Full { color, name } => Label { color, name },
        })
    }
}
