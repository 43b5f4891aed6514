//! Resolution configuration.

use std::collections::BTreeMap;

use kinforge_ir::{JointKind, OccurrenceId};
use serde::{Deserialize, Serialize};

/// How to treat mates that map to multi-DOF joint geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Fail the resolution with `UnsupportedJointKind`.
    #[default]
    Strict,
    /// Record a warning and exclude the mate from the tree.
    Warn,
}

/// User-supplied configuration for one resolution run.
///
/// Everything here is optional; the zero value resolves an assembly with
/// default root selection and geometry-driven mate classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Forced joint kind by mate name. An override always wins over the
    /// mate's geometric kind.
    pub mate_overrides: BTreeMap<String, JointKind>,

    /// Instance id of the occurrence whose link becomes the tree root.
    /// When unset, the link containing the first top-level occurrence is
    /// chosen.
    pub root_occurrence: Option<OccurrenceId>,

    /// Policy for multi-DOF mates (e.g. cylindrical).
    pub on_unsupported: UnsupportedPolicy,
}

impl ResolveConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
