//! Candidate identity records, as handed over by search connectors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{PropertyMap, Value};

/// One raw candidate identity.
///
/// Every signal is optional; comparisons only look at signals present on
/// both sides. `biographical` stays loosely typed because connectors
/// disagree on shapes (`"1984"` vs `1984`); bad values are skipped at
/// comparison time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityRecord {
    pub id: Option<String>,
    pub source: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub biographical: PropertyMap,
}

impl IdentityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn bio(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.biographical.insert(key.into(), value.into());
        self
    }

    /// Build a record from a connector's raw key/value map.
    ///
    /// Recognised keys are `id`, `source`, `name`, `email`, `phone`,
    /// `username` (strings) and `biographical` (a map). Anything else is
    /// ignored, as are recognised keys holding the wrong type.
    pub fn from_properties(props: &PropertyMap) -> Self {
        let text = |key: &str| -> Option<String> {
            let value = props.get(key)?;
            match value.as_str() {
                Some(s) => Some(s.to_owned()),
                None => {
                    debug!(key, got = value.type_name(), "ignoring non-string record field");
                    None
                }
            }
        };

        Self {
            id: text("id"),
            source: text("source"),
            name: text("name"),
            email: text("email"),
            phone: text("phone"),
            username: text("username"),
            biographical: props
                .get("biographical")
                .and_then(Value::as_map)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub(crate) fn name_signal(&self) -> Option<&str> {
        present(&self.name)
    }

    pub(crate) fn email_signal(&self) -> Option<&str> {
        present(&self.email)
    }

    pub(crate) fn phone_signal(&self) -> Option<&str> {
        present(&self.phone)
    }

    pub(crate) fn username_signal(&self) -> Option<&str> {
        present(&self.username)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
