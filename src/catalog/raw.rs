use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Every section of Prism's `components.json` has a `meta` entry describing the section
/// itself rather than a component.
pub(crate) const META_KEY: &str = "meta";

/// Custom deserializer for `require` fields that can be string or array
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RequireVisitor;

    impl<'de> Visitor<'de> for RequireVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_owned()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(RequireVisitor)
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct RawComponentDetails {
    pub title: Option<String>,
    #[serde(
        default,
        alias = "require",
        deserialize_with = "deserialize_string_or_vec"
    )]
    pub requires: Vec<String>,
}

/// A catalog entry is either a bare title or an object with a title and dependencies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawComponent {
    Title(String),
    Detailed(RawComponentDetails),
}

impl RawComponent {
    /// Returns the title (the id if there's none) and the dependencies.
    pub fn into_parts(self, id: &str) -> (String, Vec<String>) {
        match self {
            RawComponent::Title(title) => (title, Vec::new()),
            RawComponent::Detailed(details) => (
                details.title.unwrap_or_else(|| id.to_string()),
                details.requires,
            ),
        }
    }
}

pub(crate) type RawSection = BTreeMap<String, RawComponent>;

/// The sections of `components.json` we care about, anything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCatalog {
    pub languages: Option<RawSection>,
    #[serde(default)]
    pub plugins: RawSection,
    #[serde(default)]
    pub themes: RawSection,
}
