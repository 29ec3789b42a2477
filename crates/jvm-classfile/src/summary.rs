//! Serializable class overview.

use serde::{Deserialize, Serialize};

/// Header-level facts about a parsed class, as printed by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub major_version: u16,
    pub minor_version: u16,
    /// `constant_pool_count` as stored in the file
    pub constant_pool_count: usize,
    pub fields: usize,
    pub methods: usize,
    pub has_marker: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let summary = ClassSummary {
            name: "p/A".to_string(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: vec![],
            major_version: 52,
            minor_version: 0,
            constant_pool_count: 9,
            fields: 1,
            methods: 0,
            has_marker: true,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "p/A");
        assert_eq!(json["super_name"], "java/lang/Object");
        assert_eq!(json["has_marker"], true);

        let back: ClassSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);
    }
}
