//! The artifact's declared descriptor, consumed as a plain struct.
//!
//! Parsing the descriptor out of whatever manifest format carries it is a
//! collaborator concern; the engine only reads the declared dependencies to
//! derive the exemption policy.

use serde::{Deserialize, Serialize};

/// Declared facts about the checked artifact.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PluginDescriptor {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<PluginDependency>,
    #[serde(default)]
    pub since_build: Option<String>,
    #[serde(default)]
    pub until_build: Option<String>,
}

/// One declared dependency; optional dependencies may be absent from the
/// checked platform without that being an incompatibility.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PluginDependency {
    pub id: String,
    #[serde(default)]
    pub optional: bool,
}

impl PluginDependency {
    /// Package prefix covered by this dependency, in binary-name form.
    pub(crate) fn package_prefix(&self) -> String {
        self.id.replace('.', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_deserializes_with_defaults() {
        let descriptor: PluginDescriptor = serde_json::from_str(
            r#"{
                "id": "com.example.plugin",
                "version": "1.2.0",
                "dependencies": [
                    {"id": "com.example.optlib", "optional": true},
                    {"id": "com.example.core"}
                ]
            }"#,
        )
        .expect("deserialize descriptor");

        assert_eq!(descriptor.id, "com.example.plugin");
        assert_eq!(descriptor.dependencies.len(), 2);
        assert!(descriptor.dependencies[0].optional);
        assert!(!descriptor.dependencies[1].optional);
        assert_eq!(
            descriptor.dependencies[0].package_prefix(),
            "com/example/optlib"
        );
        assert!(descriptor.since_build.is_none());
    }
}
