//! Installed module set

use std::collections::BTreeSet;

use crate::domain::ModuleName;

/// Modules currently installed for the running instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    modules: BTreeSet<ModuleName>,
}

impl InstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.modules.contains(name)
    }

    /// Whether every name is installed (false for an empty request)
    pub fn contains_all<'a>(&self, names: impl IntoIterator<Item = &'a ModuleName>) -> bool {
        let mut any = false;
        for name in names {
            if !self.modules.contains(name) {
                return false;
            }
            any = true;
        }
        any
    }

    /// Add modules, returning the ones that were not installed before
    pub fn insert_all<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a ModuleName>,
    ) -> Vec<ModuleName> {
        names
            .into_iter()
            .filter(|name| self.modules.insert((*name).clone()))
            .cloned()
            .collect()
    }

    /// Remove modules, returning the ones that were actually installed
    pub fn remove_all<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a ModuleName>,
    ) -> Vec<ModuleName> {
        names
            .into_iter()
            .filter(|name| self.modules.remove(*name))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleName> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn to_set(&self) -> BTreeSet<ModuleName> {
        self.modules.clone()
    }
}

impl FromIterator<ModuleName> for InstalledSet {
    fn from_iter<I: IntoIterator<Item = ModuleName>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}
