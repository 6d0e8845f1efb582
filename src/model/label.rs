//! Labels and the ordered label registry.
//!
//! A label's export index is its position in the registry at export time.
//! It is never stored: reordering the registry renumbers every label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoxmarkError;

/// An RGB display color for a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);

    /// Creates a color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns the `index`-th color of the default label palette.
    ///
    /// Hues are spaced by the golden angle so neighbouring labels stay
    /// visually distinct no matter how many are added.
    pub fn palette(index: usize) -> Self {
        let hue = (index as f32 * 137.508) % 360.0;
        let (r, g, b) = hsv_to_rgb(hue, 0.75, 0.95);
        Self::rgb(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = BoxmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BoxmarkError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

// Colors are stored as "#rrggbb" strings in documents.
impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A named, colored class label. Identity is the text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub color: Color,
}

impl Label {
    /// Creates a new label.
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Ordered set of labels, unique by text, plus the currently selected label.
#[derive(Clone, Debug, Default)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    selected: Option<String>,
}

impl LabelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a sequence, keeping the first label for each text.
    pub fn from_labels(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut registry = Self::new();
        for label in labels {
            let text = label.text.clone();
            if !registry.add(label) {
                log::warn!("Dropping duplicate label '{}'", text);
            }
        }
        registry
    }

    /// Appends a label. Returns false (and changes nothing) if the text exists.
    pub fn add(&mut self, label: Label) -> bool {
        if self.contains(&label.text) {
            return false;
        }
        self.labels.push(label);
        true
    }

    /// Appends a new label named `text` with the next palette color.
    pub fn add_text(&mut self, text: impl Into<String>) -> bool {
        let color = self.next_color();
        self.add(Label::new(text, color))
    }

    /// Removes the label with the given text.
    ///
    /// Annotations referencing it are left alone; they become dangling.
    pub fn remove(&mut self, text: &str) -> Option<Label> {
        let index = self.index_of(text)?;
        if self.selected.as_deref() == Some(text) {
            self.selected = None;
        }
        Some(self.labels.remove(index))
    }

    /// Returns the label's current position, which is its export index.
    pub fn index_of(&self, text: &str) -> Option<usize> {
        self.labels.iter().position(|label| label.text == text)
    }

    /// Returns true if a label with this text exists.
    pub fn contains(&self, text: &str) -> bool {
        self.index_of(text).is_some()
    }

    /// Looks a label up by text.
    pub fn get(&self, text: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.text == text)
    }

    /// Renames a label in place, keeping its position and color.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<(), BoxmarkError> {
        let new = new.into();
        if old == new {
            return if self.contains(old) {
                Ok(())
            } else {
                Err(BoxmarkError::LabelNotFound(old.to_string()))
            };
        }
        if self.contains(&new) {
            return Err(BoxmarkError::LabelExists(new));
        }
        let index = self
            .index_of(old)
            .ok_or_else(|| BoxmarkError::LabelNotFound(old.to_string()))?;
        if self.selected.as_deref() == Some(old) {
            self.selected = Some(new.clone());
        }
        self.labels[index].text = new;
        Ok(())
    }

    /// Changes a label's color.
    pub fn set_color(&mut self, text: &str, color: Color) -> Result<(), BoxmarkError> {
        let index = self
            .index_of(text)
            .ok_or_else(|| BoxmarkError::LabelNotFound(text.to_string()))?;
        self.labels[index].color = color;
        Ok(())
    }

    /// Moves a label to `to_index` (clamped to the last position).
    ///
    /// Returns the position the label ended up at.
    pub fn move_label(&mut self, text: &str, to_index: usize) -> Result<usize, BoxmarkError> {
        let from = self
            .index_of(text)
            .ok_or_else(|| BoxmarkError::LabelNotFound(text.to_string()))?;
        let label = self.labels.remove(from);
        let to = to_index.min(self.labels.len());
        self.labels.insert(to, label);
        Ok(to)
    }

    /// Selects the label used for new annotations. No-op if the text is unknown.
    pub fn select(&mut self, text: &str) -> bool {
        if !self.contains(text) {
            return false;
        }
        self.selected = Some(text.to_string());
        true
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Returns the currently selected label, if any.
    pub fn selected(&self) -> Option<&Label> {
        self.selected.as_deref().and_then(|text| self.get(text))
    }

    /// Returns the labels in export order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Palette color for the next label to be added.
    pub fn next_color(&self) -> Color {
        Color::palette(self.labels.len())
    }
}
