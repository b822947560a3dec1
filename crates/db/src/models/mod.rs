pub mod animation_state;
pub mod cost_ledger;
pub mod image_variation;
pub mod job;
pub mod persona;
pub mod progress;
pub mod status;
pub mod template;
