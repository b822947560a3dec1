//! Generation constants, deterministic seeds, and phase step plans.

use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Generation defaults
// ---------------------------------------------------------------------------

/// Number of candidate stills produced per image-phase request.
pub const DEFAULT_VARIATION_COUNT: u32 = 3;
/// Hard ceiling on variations per request.
pub const MAX_VARIATION_COUNT: u32 = 8;
/// How many image/video calls may be in flight at once within one job.
pub const STAGE_CONCURRENCY: usize = 2;

// ---------------------------------------------------------------------------
// Unit costs (cents) recorded in the ledger per billable call
// ---------------------------------------------------------------------------

pub const COST_ANATOMY_CENTS: i64 = 1;
pub const COST_IMAGE_CENTS: i64 = 8;
pub const COST_VIDEO_CENTS: i64 = 40;

// ---------------------------------------------------------------------------
// Deterministic seeds
// ---------------------------------------------------------------------------

/// Derive the generation seed for one variation slot.
///
/// The seed is a pure function of the persona and the variation index, so
/// regenerating the same slot reproduces the same image. The first eight
/// bytes of a SHA-256 digest are folded into a non-negative i64 (image
/// providers reject negative seeds).
pub fn derive_seed(persona_id: DbId, variation_index: u32) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(persona_id.to_be_bytes());
    hasher.update(variation_index.to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (i64::from_be_bytes(bytes)).unsigned_abs() as i64 & i64::MAX
}

// ---------------------------------------------------------------------------
// Step plans for the progress tracker
// ---------------------------------------------------------------------------

/// Total progress steps for the image phase:
/// anatomy, prompt, one per variation, finalize.
pub fn image_phase_steps(variation_count: u32) -> i32 {
    2 + variation_count as i32 + 1
}

/// Total progress steps for the video phase: one per state, finalize.
pub fn video_phase_steps(state_count: u32) -> i32 {
    state_count as i32 + 1
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate a requested variation count.
pub fn validate_variation_count(count: u32) -> Result<(), CoreError> {
    if count == 0 || count > MAX_VARIATION_COUNT {
        return Err(CoreError::Validation(format!(
            "variation count must be between 1 and {MAX_VARIATION_COUNT}, got {count}"
        )));
    }
    Ok(())
}

/// Validate pre-conditions for the image phase.
///
/// - The product name must be non-empty (it feeds the prompt).
/// - An input image must be provided (the product photo).
pub fn validate_image_phase(product_name: &str, has_input_image: bool) -> Result<(), CoreError> {
    if product_name.trim().is_empty() {
        return Err(CoreError::Validation(
            "product name must not be empty".to_string(),
        ));
    }
    if !has_input_image {
        return Err(CoreError::Validation(
            "image phase requires an input product image".to_string(),
        ));
    }
    Ok(())
}

/// Validate pre-conditions for the video phase.
///
/// - An approved still must be referenced (the seed frame).
/// - At least one animation state must be requested.
pub fn validate_video_phase(
    has_approved_still: bool,
    requested_state_count: usize,
) -> Result<(), CoreError> {
    if !has_approved_still {
        return Err(CoreError::Validation(
            "video phase requires an approved still as the seed frame".to_string(),
        ));
    }
    if requested_state_count == 0 {
        return Err(CoreError::Validation(
            "video phase requires at least one requested animation state".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_deterministic() {
        assert_eq!(derive_seed(42, 1), derive_seed(42, 1));
    }

    #[test]
    fn seed_differs_per_index_and_persona() {
        assert_ne!(derive_seed(42, 1), derive_seed(42, 2));
        assert_ne!(derive_seed(42, 1), derive_seed(43, 1));
    }

    #[test]
    fn seed_is_non_negative() {
        for persona in 0..50 {
            for index in 0..8 {
                assert!(derive_seed(persona, index) >= 0);
            }
        }
    }

    #[test]
    fn image_phase_step_count() {
        // anatomy + prompt + 3 variations + finalize
        assert_eq!(image_phase_steps(3), 6);
    }

    #[test]
    fn video_phase_step_count() {
        assert_eq!(video_phase_steps(2), 3);
    }

    #[test]
    fn variation_count_bounds() {
        assert!(validate_variation_count(0).is_err());
        assert!(validate_variation_count(3).is_ok());
        assert!(validate_variation_count(MAX_VARIATION_COUNT + 1).is_err());
    }

    #[test]
    fn image_phase_requires_name_and_image() {
        assert!(validate_image_phase("Fizzy Cola", true).is_ok());
        assert!(validate_image_phase("  ", true).is_err());
        assert!(validate_image_phase("Fizzy Cola", false).is_err());
    }

    #[test]
    fn video_phase_requires_still_and_states() {
        assert!(validate_video_phase(true, 2).is_ok());
        assert!(validate_video_phase(false, 2).is_err());
        assert!(validate_video_phase(true, 0).is_err());
    }
}
