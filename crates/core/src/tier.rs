//! Subscription tiers and the static tier → animation-state table.
//!
//! The set of animation states present for a persona must always be a
//! subset of what its tier allows. Upgrading a tier does not backfill
//! missing states; regeneration must be requested explicitly.

use serde::{Deserialize, Serialize};

/// Merchant subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Starter,
    Growth,
    Studio,
}

impl SubscriptionTier {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Growth => "growth",
            SubscriptionTier::Studio => "studio",
        }
    }

    /// Parse from a string, defaulting to `Starter` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "studio" => SubscriptionTier::Studio,
            "growth" => SubscriptionTier::Growth,
            _ => SubscriptionTier::Starter,
        }
    }
}

/// A named behavioral state a character can be animated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationState {
    Idle,
    Talking,
    Thinking,
    Waving,
    Confused,
    Celebrating,
}

impl AnimationState {
    /// String representation for database storage and provider prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Talking => "talking",
            AnimationState::Thinking => "thinking",
            AnimationState::Waving => "waving",
            AnimationState::Confused => "confused",
            AnimationState::Celebrating => "celebrating",
        }
    }

    /// Parse a state name. Unknown names are an error: an invalid state
    /// in a request must fail validation rather than reach a provider.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(AnimationState::Idle),
            "talking" => Some(AnimationState::Talking),
            "thinking" => Some(AnimationState::Thinking),
            "waving" => Some(AnimationState::Waving),
            "confused" => Some(AnimationState::Confused),
            "celebrating" => Some(AnimationState::Celebrating),
            _ => None,
        }
    }

    /// Motion description fed to the video provider for this state.
    pub fn motion_intent(&self) -> &'static str {
        match self {
            AnimationState::Idle => "gentle breathing motion, occasional blink, subtle sway",
            AnimationState::Talking => "mouth moving as if speaking, expressive head bobs",
            AnimationState::Thinking => "eyes glancing up, hand or limb near chin, pondering",
            AnimationState::Waving => "one arm raised, friendly waving at the viewer",
            AnimationState::Confused => "head tilt, raised eyebrow, small shrug",
            AnimationState::Celebrating => "arms up, bouncing with confetti-like energy",
        }
    }
}

/// Ordered list of states the Starter tier is entitled to.
const STARTER_STATES: &[AnimationState] = &[AnimationState::Idle, AnimationState::Talking];

/// Ordered list of states the Growth tier is entitled to.
const GROWTH_STATES: &[AnimationState] = &[
    AnimationState::Idle,
    AnimationState::Talking,
    AnimationState::Thinking,
    AnimationState::Waving,
];

/// Ordered list of states the Studio tier is entitled to.
const STUDIO_STATES: &[AnimationState] = &[
    AnimationState::Idle,
    AnimationState::Talking,
    AnimationState::Thinking,
    AnimationState::Waving,
    AnimationState::Confused,
    AnimationState::Celebrating,
];

/// The ordered list of animation states a tier is entitled to.
pub fn states_for_tier(tier: SubscriptionTier) -> &'static [AnimationState] {
    match tier {
        SubscriptionTier::Starter => STARTER_STATES,
        SubscriptionTier::Growth => GROWTH_STATES,
        SubscriptionTier::Studio => STUDIO_STATES,
    }
}

/// Intersect a requested state list with a tier's allowance, preserving
/// the tier's order. Returns `(allowed, skipped)`; `skipped` states are
/// reported in the manifest but never requested from the provider.
pub fn filter_requested(
    tier: SubscriptionTier,
    requested: &[AnimationState],
) -> (Vec<AnimationState>, Vec<AnimationState>) {
    let allowance = states_for_tier(tier);
    let allowed: Vec<AnimationState> = allowance
        .iter()
        .copied()
        .filter(|s| requested.contains(s))
        .collect();
    let skipped: Vec<AnimationState> = requested
        .iter()
        .copied()
        .filter(|s| !allowance.contains(s))
        .collect();
    (allowed, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_allowances_are_nested() {
        let starter = states_for_tier(SubscriptionTier::Starter);
        let growth = states_for_tier(SubscriptionTier::Growth);
        let studio = states_for_tier(SubscriptionTier::Studio);

        assert!(starter.iter().all(|s| growth.contains(s)));
        assert!(growth.iter().all(|s| studio.contains(s)));
        assert_eq!(starter.len(), 2);
        assert_eq!(studio.len(), 6);
    }

    #[test]
    fn filter_drops_disallowed_states() {
        let requested = [
            AnimationState::Idle,
            AnimationState::Talking,
            AnimationState::Confused,
        ];
        let (allowed, skipped) = filter_requested(SubscriptionTier::Starter, &requested);
        assert_eq!(allowed, vec![AnimationState::Idle, AnimationState::Talking]);
        assert_eq!(skipped, vec![AnimationState::Confused]);
    }

    #[test]
    fn filter_preserves_tier_order() {
        let requested = [AnimationState::Waving, AnimationState::Idle];
        let (allowed, skipped) = filter_requested(SubscriptionTier::Growth, &requested);
        assert_eq!(allowed, vec![AnimationState::Idle, AnimationState::Waving]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn unknown_state_name_fails_parse() {
        assert!(AnimationState::parse("sleeping").is_none());
        assert_eq!(AnimationState::parse("idle"), Some(AnimationState::Idle));
    }
}
