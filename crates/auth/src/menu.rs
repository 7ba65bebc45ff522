//! Menu Authorization Map: static `menu → sub-menu → action → [permission]`.
//!
//! The map is configuration, not user data. It is loaded once (usually from a
//! JSON document) and only read afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Permission;

type ActionTable = BTreeMap<String, Vec<Permission>>;
type SubMenuTable = BTreeMap<String, ActionTable>;

#[derive(Debug, Error)]
pub enum MenuMapError {
    #[error("failed to read menu map from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid menu map document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Which permissions unlock which (menu, sub-menu, action) triples.
///
/// JSON shape:
///
/// ```json
/// { "dashboard": { "account": { "view_account": ["view_account"] } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuAuthorizationMap {
    menus: BTreeMap<String, SubMenuTable>,
}

impl MenuAuthorizationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(document: &str) -> Result<Self, MenuMapError> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MenuMapError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| MenuMapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&document)
    }

    /// Builder-style registration of one action entry.
    pub fn with_action<P>(
        mut self,
        menu: impl Into<String>,
        sub_menu: impl Into<String>,
        action: impl Into<String>,
        permissions: impl IntoIterator<Item = P>,
    ) -> Self
    where
        P: Into<Permission>,
    {
        self.menus
            .entry(menu.into())
            .or_default()
            .entry(sub_menu.into())
            .or_default()
            .entry(action.into())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn menus(&self) -> impl Iterator<Item = &str> {
        self.menus.keys().map(String::as_str)
    }

    pub fn sub_menus<'a>(&'a self, menu: &str) -> impl Iterator<Item = &'a str> {
        self.menus
            .get(menu)
            .into_iter()
            .flat_map(|subs| subs.keys().map(String::as_str))
    }

    pub fn actions<'a>(&'a self, menu: &str, sub_menu: &str) -> impl Iterator<Item = &'a str> {
        self.menus
            .get(menu)
            .and_then(|subs| subs.get(sub_menu))
            .into_iter()
            .flat_map(|actions| actions.keys().map(String::as_str))
    }

    /// Permissions listed for an exact triple; `None` when any part is unknown.
    pub fn permissions_for(&self, menu: &str, sub_menu: &str, action: &str) -> Option<&[Permission]> {
        self.menus
            .get(menu)?
            .get(sub_menu)?
            .get(action)
            .map(Vec::as_slice)
    }

    /// Every permission listed anywhere under `menu`.
    pub fn menu_permissions<'a>(&'a self, menu: &str) -> impl Iterator<Item = &'a Permission> {
        self.menus
            .get(menu)
            .into_iter()
            .flat_map(|subs| subs.values())
            .flat_map(|actions| actions.values())
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }
}
