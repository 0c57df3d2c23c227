//! Custom Elements
//!
//! Custom element registry and lifecycle callbacks.

use std::collections::HashMap;

/// Custom elements registry
#[derive(Debug, Default)]
pub struct CustomElementRegistry {
    definitions: HashMap<String, CustomElementDefinition>,
}

/// Custom element definition
#[derive(Debug, Clone)]
pub struct CustomElementDefinition {
    pub name: String,
    pub observed_attributes: Vec<String>,
}

impl CustomElementDefinition {
    /// Whether changes to `attribute` reach `attributeChangedCallback`
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }
}

/// Custom element options
#[derive(Debug, Clone, Default)]
pub struct CustomElementOptions {
    pub observed_attributes: Vec<String>,
}

impl CustomElementOptions {
    pub fn observing(attributes: &[&str]) -> Self {
        Self {
            observed_attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Custom element errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomElementError {
    #[error("invalid custom element name: {0}")]
    InvalidName(String),

    #[error("custom element already defined: {0}")]
    AlreadyDefined(String),
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a custom element
    pub fn define(
        &mut self,
        name: &str,
        options: CustomElementOptions,
    ) -> Result<(), CustomElementError> {
        if !Self::is_valid_name(name) {
            return Err(CustomElementError::InvalidName(name.to_string()));
        }
        if self.definitions.contains_key(name) {
            return Err(CustomElementError::AlreadyDefined(name.to_string()));
        }

        tracing::debug!(name, observed = ?options.observed_attributes, "custom element defined");
        self.definitions.insert(
            name.to_string(),
            CustomElementDefinition {
                name: name.to_string(),
                observed_attributes: options.observed_attributes,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CustomElementDefinition> {
        self.definitions.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Validate custom element name
    fn is_valid_name(name: &str) -> bool {
        // Must contain hyphen
        if !name.contains('-') {
            return false;
        }

        // Must start with lowercase letter
        if !name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
            return false;
        }

        if name.chars().any(|c| c.is_ascii_uppercase()) {
            return false;
        }

        let reserved = [
            "annotation-xml", "color-profile", "font-face", "font-face-src",
            "font-face-uri", "font-face-format", "font-face-name", "missing-glyph",
        ];
        !reserved.contains(&name)
    }
}
