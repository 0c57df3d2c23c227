//! Element Attributes
//!
//! Ordered attribute map with name lookup.

use std::collections::HashMap;

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Attribute collection, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
    by_name: HashMap<String, usize>,
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Get attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .and_then(|&i| self.attributes.get(i))
            .map(|a| a.value.as_str())
    }

    /// Set attribute, returning the previous value if there was one
    pub fn set(&mut self, name: &str, value: &str) -> Option<String> {
        match self.by_name.get(name) {
            Some(&index) => Some(std::mem::replace(
                &mut self.attributes[index].value,
                value.to_string(),
            )),
            None => {
                self.by_name.insert(name.to_string(), self.attributes.len());
                self.attributes.push(Attr::new(name, value));
                None
            }
        }
    }

    /// Remove attribute by name
    pub fn remove(&mut self, name: &str) -> Option<Attr> {
        let index = self.by_name.remove(name)?;
        for idx in self.by_name.values_mut() {
            if *idx > index {
                *idx -= 1;
            }
        }
        Some(self.attributes.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_returns_previous() {
        let mut attrs = NamedNodeMap::new();
        assert_eq!(attrs.set("imageid", "a"), None);
        assert_eq!(attrs.set("imageid", "b"), Some("a".to_string()));
        assert_eq!(attrs.get("imageid"), Some("b"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut attrs = NamedNodeMap::new();
        attrs.set("base", "https://img/");
        attrs.set("imageid", "cat");
        attrs.set("alt", "A cat");

        assert!(attrs.remove("base").is_some());
        assert!(!attrs.contains("base"));
        assert_eq!(attrs.get("alt"), Some("A cat"));
        assert_eq!(attrs.names(), vec!["imageid", "alt"]);
    }
}
