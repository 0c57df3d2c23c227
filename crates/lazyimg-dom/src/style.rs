//! Inline Style
//!
//! The `style` declaration block of a single element.

/// Inline style declarations, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a property value
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.declarations.iter_mut().find(|(name, _)| name == property) {
            Some(slot) => slot.1 = value,
            None => self.declarations.push((property.to_string(), value)),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self.declarations.iter().position(|(name, _)| name == property)?;
        Some(self.declarations.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialize as `style` attribute text
    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
