//! Asset key construction.

use mascotly_core::types::DbId;
use std::fmt;

/// Hierarchical object key for a persona asset.
///
/// Keys follow `tenants/{tenant}/personas/{persona}/{kind}/{file}` so
/// that listing by prefix groups a persona's assets together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetKey {
    tenant_id: DbId,
    persona_id: DbId,
    kind: &'static str,
    file_name: String,
}

impl AssetKey {
    /// Key for a candidate still at a variation slot.
    pub fn variation(tenant_id: DbId, persona_id: DbId, variation_index: i32, ext: &str) -> Self {
        Self {
            tenant_id,
            persona_id,
            kind: "variations",
            file_name: format!("variation-{variation_index}.{ext}"),
        }
    }

    /// Key for an animation state clip.
    pub fn animation(tenant_id: DbId, persona_id: DbId, state_name: &str, ext: &str) -> Self {
        Self {
            tenant_id,
            persona_id,
            kind: "states",
            file_name: format!("{state_name}.{ext}"),
        }
    }

    pub fn as_string(&self) -> String {
        format!(
            "tenants/{}/personas/{}/{}/{}",
            self.tenant_id, self.persona_id, self.kind, self.file_name
        )
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// File extension for a MIME type, defaulting to `bin` when unknown.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variation_key_layout() {
        let key = AssetKey::variation(7, 42, 2, "png");
        assert_eq!(key.as_string(), "tenants/7/personas/42/variations/variation-2.png");
    }

    #[test]
    fn animation_key_layout() {
        let key = AssetKey::animation(7, 42, "waving", "mp4");
        assert_eq!(key.as_string(), "tenants/7/personas/42/states/waving.mp4");
    }

    #[test]
    fn extension_falls_back_to_bin() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("video/mp4"), "mp4");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
