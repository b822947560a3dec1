//! Anatomy hints produced by the vision-analysis call.
//!
//! The analyzer steers prompt construction (where a face or arms should
//! sit on the product), but it is advisory only: malformed or missing
//! model output falls back to [`AnatomyHints::default`] rather than
//! failing the job.

use serde::{Deserialize, Serialize};

/// Structured description of a product's shape and where character
/// features should be placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnatomyHints {
    pub object_name: String,
    pub shape_category: String,
    pub face_placement: String,
    pub arm_placement: String,
}

impl Default for AnatomyHints {
    /// Generic placement used when vision analysis fails or returns
    /// something unparseable.
    fn default() -> Self {
        Self {
            object_name: "product".to_string(),
            shape_category: "generic".to_string(),
            face_placement: "face centered on the front of the product".to_string(),
            arm_placement: "small arms attached at the sides".to_string(),
        }
    }
}

/// Parse anatomy hints from raw vision-model JSON output.
///
/// Accepts the expected object shape and tolerates missing fields by
/// filling them from the default. Anything non-object (arrays, strings,
/// null, prose the model wrapped around the JSON) yields the default
/// outright.
pub fn parse_hints(raw: &serde_json::Value) -> AnatomyHints {
    let Some(obj) = raw.as_object() else {
        tracing::warn!("Vision output was not a JSON object, using default anatomy hints");
        return AnatomyHints::default();
    };

    let defaults = AnatomyHints::default();
    let field = |key: &str, fallback: &str| -> String {
        obj.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    AnatomyHints {
        object_name: field("objectName", &defaults.object_name),
        shape_category: field("shapeCategory", &defaults.shape_category),
        face_placement: field("facePlacement", &defaults.face_placement),
        arm_placement: field("armPlacement", &defaults.arm_placement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_complete_output() {
        let hints = parse_hints(&json!({
            "objectName": "soda can",
            "shapeCategory": "cylinder",
            "facePlacement": "upper third of the can",
            "armPlacement": "mid-body, left and right",
        }));
        assert_eq!(hints.object_name, "soda can");
        assert_eq!(hints.shape_category, "cylinder");
        assert_eq!(hints.face_placement, "upper third of the can");
        assert_eq!(hints.arm_placement, "mid-body, left and right");
    }

    #[test]
    fn missing_fields_fall_back_individually() {
        let hints = parse_hints(&json!({ "objectName": "sneaker" }));
        assert_eq!(hints.object_name, "sneaker");
        assert_eq!(hints.shape_category, "generic");
        assert_eq!(
            hints.face_placement,
            AnatomyHints::default().face_placement
        );
    }

    #[test]
    fn non_object_output_yields_default() {
        assert_eq!(parse_hints(&json!("no json here")), AnatomyHints::default());
        assert_eq!(parse_hints(&json!([1, 2, 3])), AnatomyHints::default());
        assert_eq!(parse_hints(&serde_json::Value::Null), AnatomyHints::default());
    }

    #[test]
    fn empty_strings_fall_back() {
        let hints = parse_hints(&json!({ "objectName": "  " }));
        assert_eq!(hints.object_name, "product");
    }
}
