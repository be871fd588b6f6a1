//! Module name domain type

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeliveryError, Result, invalid_module_name};

/// Identifier of an optional unit of functionality.
///
/// Equality is exact and case-sensitive. A `ModuleName` built through
/// [`ModuleName::new`] is never empty; [`ModuleName::unchecked`] exists so a
/// caller can forward a raw name to the backend and let it decide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a validated module name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(invalid_module_name(name, "module name cannot be empty"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(invalid_module_name(
                name,
                "module name cannot contain whitespace",
            ));
        }
        Ok(Self(name))
    }

    /// Wrap a name without validation
    pub fn unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleName {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Parse a list of raw names into a module set
pub fn parse_module_set<I, S>(names: I) -> Result<BTreeSet<ModuleName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| ModuleName::new(name.as_ref()))
        .collect()
}

/// Join module names for display (e.g. `image_feature, image_large_feature`)
pub fn display_modules<'a>(names: impl IntoIterator<Item = &'a ModuleName>) -> String {
    names
        .into_iter()
        .map(ModuleName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
