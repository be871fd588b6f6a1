//! Launcher resolver
//!
//! Maps a module name to the entry point to open once the module is
//! installed. The table is static for the lifetime of the process and is
//! supplied at startup from configuration; entry point descriptors are opaque
//! here and interpreted by the presentation layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ModuleName;
use crate::error::{Result, entry_point_not_found, not_installed};
use crate::session::InstalledSet;

/// Opaque entry point descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryPoint(String);

impl EntryPoint {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self(descriptor.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation collaborator that opens entry points
pub trait Presenter {
    /// Hide any progress or confirmation UI still on screen
    fn clear_progress(&mut self);

    /// Open the entry point of an installed module
    fn open(&mut self, module: &ModuleName, entry: &EntryPoint);
}

/// Module name to entry point table
#[derive(Debug, Clone, Default)]
pub struct LauncherTable {
    entries: BTreeMap<ModuleName, EntryPoint>,
}

impl LauncherTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with_entry(mut self, module: ModuleName, entry: EntryPoint) -> Self {
        self.entries.insert(module, entry);
        self
    }

    /// Look up the entry point for `name`
    pub fn resolve(&self, name: &ModuleName) -> Result<&EntryPoint> {
        self.entries
            .get(name)
            .ok_or_else(|| entry_point_not_found(name.as_str()))
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether every module has an entry (false for an empty set)
    pub fn covers<'a>(&self, names: impl IntoIterator<Item = &'a ModuleName>) -> bool {
        let mut any = false;
        for name in names {
            if !self.entries.contains_key(name) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ModuleName, EntryPoint)> for LauncherTable {
    fn from_iter<I: IntoIterator<Item = (ModuleName, EntryPoint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Launches installed modules through a [`Presenter`]
pub struct Launcher<'a> {
    table: &'a LauncherTable,
    installed: &'a InstalledSet,
}

impl<'a> Launcher<'a> {
    pub fn new(table: &'a LauncherTable, installed: &'a InstalledSet) -> Self {
        Self { table, installed }
    }

    /// Resolve the entry point of an installed module
    pub fn resolve_installed(&self, name: &ModuleName) -> Result<&'a EntryPoint> {
        if !self.installed.contains(name) {
            return Err(not_installed(name.as_str()));
        }
        self.table.resolve(name)
    }

    /// Clear pending progress UI, then open the module's entry point once
    pub fn launch<P: Presenter + ?Sized>(
        &self,
        name: &ModuleName,
        presenter: &mut P,
    ) -> Result<EntryPoint> {
        let entry = self.resolve_installed(name)?;
        info!(module = %name, entry = %entry, "launching module");
        presenter.clear_progress();
        presenter.open(name, entry);
        Ok(entry.clone())
    }
}
