//! Per-definition options.

use serde::{Deserialize, Serialize};

/// Backing field used when a definition names none.
pub const DEFAULT_COLUMN: &str = "state";

/// Options applied to a definition.
///
/// Every field has a default, so options can be loaded from a partial
/// configuration document.
///
/// # Example
///
/// ```rust
/// use statekeeper::definition::MachineOptions;
///
/// let options: MachineOptions =
///     serde_json::from_str(r#"{ "column": "status" }"#).unwrap();
///
/// assert_eq!(options.column, "status");
/// assert!(options.whiny_transitions);
/// assert!(options.create_scopes);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    /// Name of the record field that stores the current state
    pub column: String,

    /// Report a missing transition as an error on the persisted firing path
    pub whiny_transitions: bool,

    /// Install one named scope per declared state
    pub create_scopes: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMN.to_string(),
            whiny_transitions: true,
            create_scopes: true,
        }
    }
}
