//! Path-to-category notification mappings.

use serde::{Deserialize, Serialize};

use crate::category::{CategorySet, EventCategory};

/// Association between a path pattern and the categories of interest for it.
///
/// The pattern is passed to the engine untouched; matching paths against
/// it is the engine's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMapping {
    /// Path pattern, relative to the virtualization root ("" = whole root).
    #[serde(rename = "path", default)]
    pub path_pattern: String,
    /// Categories reported for matching paths.
    #[serde(with = "category_list")]
    pub categories: CategorySet,
}

impl NotificationMapping {
    /// Create a mapping.
    ///
    /// # Arguments
    /// * `path_pattern` - Path pattern relative to the virtualization root
    /// * `categories` - Categories of interest
    pub fn new(path_pattern: impl Into<String>, categories: CategorySet) -> Self {
        Self {
            path_pattern: path_pattern.into(),
            categories,
        }
    }

    /// Mapping covering the whole virtualization root.
    pub fn root(categories: CategorySet) -> Self {
        Self::new("", categories)
    }

    /// Create a mapping from a list of categories.
    pub fn with_categories<I>(path_pattern: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = EventCategory>,
    {
        Self::new(path_pattern, categories.into_iter().collect())
    }
}

/// Serializes a `CategorySet` as a list of category names.
mod category_list {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::category::{CategorySet, EventCategory};

    pub fn serialize<S: Serializer>(set: &CategorySet, serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<&'static str> = set.categories().map(EventCategory::name).collect();
        names.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<CategorySet, D::Error> {
        let names: Vec<String> = Vec::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| name.parse::<EventCategory>().map_err(D::Error::custom))
            .collect()
    }
}
