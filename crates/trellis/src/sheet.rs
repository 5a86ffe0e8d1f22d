//! Declarative binding sheets.
//!
//! A sheet is a TOML document listing bindings, dispatch states and an
//! optional instance map configuration:
//!
//! ```toml
//! [config]
//! delay_operations = true
//!
//! [[binding]]
//! query = "apple #fruit"
//! views = [{ identity = "label", factory = "text", binder = "name" }]
//!
//! [[state]]
//! name = "hover"
//! query = "button"
//! view = "background"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::InstanceMapConfig;
use crate::error::SheetError;
use crate::registry::ViewSpec;

/// One `[[binding]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEntry {
    /// The query path selecting nodes.
    pub query: String,
    /// The views created for each selected node, in order.
    #[serde(default)]
    pub views: Vec<ViewSpec>,
}

/// One `[[state]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// The state name.
    pub name: String,
    /// The query path the node must match. Empty matches any node.
    #[serde(default)]
    pub query: String,
    /// The identity the view must carry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

/// A parsed binding sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSheet {
    /// Instance map configuration, if the sheet sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<InstanceMapConfig>,
    /// Bindings, in registration order.
    #[serde(rename = "binding", default)]
    pub bindings: Vec<BindingEntry>,
    /// Dispatch state filters.
    #[serde(rename = "state", default)]
    pub states: Vec<StateEntry>,
}

impl BindingSheet {
    /// Parse a sheet from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SheetError> {
        let sheet: Self = toml::from_str(text)?;
        tracing::debug!(
            target: "trellis::registry",
            bindings = sheet.bindings.len(),
            states = sheet.states.len(),
            "parsed binding sheet"
        );
        Ok(sheet)
    }

    /// Read and parse a sheet file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SheetError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Render the sheet as TOML.
    pub fn to_toml(&self) -> Result<String, SheetError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The configuration set by the sheet, or the default.
    pub fn config_or_default(&self) -> InstanceMapConfig {
        self.config.unwrap_or_default()
    }
}
