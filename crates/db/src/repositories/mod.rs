//! Repository layer for database access.
//!
//! Each repository is a stateless unit struct whose methods take the pool
//! (or a transaction) explicitly. All SQL lives here; callers never build
//! queries themselves.

pub mod animation_state_repo;
pub mod cost_ledger_repo;
pub mod image_variation_repo;
pub mod job_repo;
pub mod persona_repo;
pub mod progress_repo;
pub mod template_repo;

pub use animation_state_repo::AnimationStateRepo;
pub use cost_ledger_repo::CostLedgerRepo;
pub use image_variation_repo::ImageVariationRepo;
pub use job_repo::JobRepo;
pub use persona_repo::PersonaRepo;
pub use progress_repo::ProgressRepo;
pub use template_repo::PromptTemplateRepo;
