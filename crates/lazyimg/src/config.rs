//! Image Configuration
//!
//! The three values a lazy image is configured with, readable both as
//! attributes and as properties. The widget caches its own copy and
//! reflects property writes back into attributes.

/// Attributes routed to `attribute_changed`
pub const OBSERVED_ATTRIBUTES: [&str; 3] = ["base", "imageid", "alt"];

/// One configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Base,
    ImageId,
    Alt,
}

impl ConfigField {
    /// Map an attribute name; names are matched case-insensitively
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "base" => Some(Self::Base),
            "imageid" => Some(Self::ImageId),
            "alt" => Some(Self::Alt),
            _ => None,
        }
    }

    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::ImageId => "imageid",
            Self::Alt => "alt",
        }
    }
}

/// What an accepted change requires of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// Image source moved: refetch metadata and images
    Source,
    /// Accessible text only
    AltText,
}

/// Image configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageConfig {
    /// URL prefix of the image host, including trailing slash
    pub base: String,
    /// Opaque image identifier on the host
    pub image_id: String,
    pub alt: String,
}

impl ImageConfig {
    pub fn new(base: &str, image_id: &str, alt: &str) -> Self {
        Self {
            base: base.to_string(),
            image_id: image_id.to_string(),
            alt: alt.to_string(),
        }
    }

    pub fn get(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::Base => &self.base,
            ConfigField::ImageId => &self.image_id,
            ConfigField::Alt => &self.alt,
        }
    }

    /// Store a value; `None` when it matches what is already cached
    pub fn apply(&mut self, field: ConfigField, value: &str) -> Option<ConfigChange> {
        let slot = match field {
            ConfigField::Base => &mut self.base,
            ConfigField::ImageId => &mut self.image_id,
            ConfigField::Alt => &mut self.alt,
        };
        if *slot == value {
            return None;
        }
        *slot = value.to_string();

        Some(match field {
            ConfigField::Alt => ConfigChange::AltText,
            ConfigField::Base | ConfigField::ImageId => ConfigChange::Source,
        })
    }

    /// Both halves of the image URL are known
    pub fn has_source(&self) -> bool {
        !self.base.is_empty() && !self.image_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_attribute() {
        assert_eq!(ConfigField::from_attribute("imageid"), Some(ConfigField::ImageId));
        assert_eq!(ConfigField::from_attribute("imageId"), Some(ConfigField::ImageId));
        assert_eq!(ConfigField::from_attribute("src"), None);
        for name in OBSERVED_ATTRIBUTES {
            assert_eq!(ConfigField::from_attribute(name).unwrap().attribute_name(), name);
        }
    }

    #[test]
    fn test_apply_reports_change_kind() {
        let mut config = ImageConfig::default();

        assert_eq!(config.apply(ConfigField::Base, "https://img/"), Some(ConfigChange::Source));
        assert_eq!(config.apply(ConfigField::Base, "https://img/"), None);
        assert_eq!(config.apply(ConfigField::Alt, "A cat"), Some(ConfigChange::AltText));
        assert!(!config.has_source());

        config.apply(ConfigField::ImageId, "cat");
        assert!(config.has_source());
        assert_eq!(config, ImageConfig::new("https://img/", "cat", "A cat"));
    }
}
