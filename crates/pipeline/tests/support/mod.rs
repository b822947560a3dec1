//! In-memory store and scriptable provider fakes for orchestrator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mascotly_core::failure::FailureKind;
use mascotly_core::prompt::PromptTemplate;
use mascotly_core::types::{DbId, JobId};
use mascotly_db::models::animation_state::CreateAnimationState;
use mascotly_db::models::image_variation::{CreateImageVariation, ImageVariation};
use mascotly_db::models::job::{GenerationJob, NewGenerationJob};
use mascotly_db::models::persona::Persona;
use mascotly_db::models::status::JobStatus;
use mascotly_pipeline::error::StoreError;
use mascotly_pipeline::store::PipelineStore;
use mascotly_providers::{
    AnatomyRequest, GeneratedImage, GeneratedVideo, ImageGenerationRequest, ImageProvider,
    ProviderError, VideoGenerationRequest, VideoProvider, VisionProvider,
};
use mascotly_storage::{AssetKey, ObjectStore, StorageError};

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemState {
    jobs: HashMap<JobId, GenerationJob>,
    personas: HashMap<DbId, Persona>,
    variations: HashMap<(DbId, i32), ImageVariation>,
    animation_states: HashMap<(DbId, String), CreateAnimationState>,
    ledger: Vec<LedgerRow>,
    progress: HashMap<JobId, ProgressState>,
    templates: HashMap<String, PromptTemplate>,
    next_id: DbId,
}

#[derive(Clone)]
pub struct LedgerRow {
    pub tenant_id: DbId,
    pub job_id: JobId,
    pub call_type: String,
    pub unit_cost_cents: i64,
}

#[derive(Default, Clone)]
pub struct ProgressState {
    pub steps_total: i32,
    pub steps_completed: i32,
    pub current_step: String,
    /// Every completed-step value in advance order, for monotonicity
    /// assertions.
    pub history: Vec<i32>,
}

pub struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    pub fn new() -> Self {
        let mut state = MemState::default();
        state.next_id = 1;
        state.templates.insert(
            "default".to_string(),
            PromptTemplate {
                body: "A {{vibe}} {{character_type}} mascot of {{product_name}} \
                       ({{object_name}}), {{face_placement}}, {{arm_placement}}"
                    .to_string(),
                negative_body: "blurry, distorted".to_string(),
            },
        );
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn insert_persona(
        &self,
        tenant_id: DbId,
        tier: &str,
        last_generation_at: Option<chrono::DateTime<Utc>>,
    ) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.personas.insert(
            id,
            Persona {
                id,
                tenant_id,
                name: "Fizzy".to_string(),
                product_name: "Fizzy Cola".to_string(),
                archetype: "mascot".to_string(),
                tier: tier.to_string(),
                last_generation_at,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
        id
    }

    pub fn insert_approved_variation(&self, persona_id: DbId) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.variations.insert(
            (persona_id, 1),
            ImageVariation {
                id,
                persona_id,
                variation_index: 1,
                seed: 7,
                delivery_url: "https://cdn.test/approved.png".to_string(),
                approved: true,
                generated_at: Utc::now(),
            },
        );
    }

    /// Pre-seed a job row in a given status, as if another worker or an
    /// earlier run put it there.
    pub fn seed_job(&self, job_id: &str, status: JobStatus, result: Option<serde_json::Value>) {
        let mut state = self.state.lock().unwrap();
        state.jobs.insert(
            job_id.to_string(),
            GenerationJob {
                job_id: job_id.to_string(),
                tenant_id: 1,
                persona_id: 1,
                phase: "image".to_string(),
                status_id: status.id(),
                current_step: None,
                error_kind: None,
                error_detail: None,
                parameters: serde_json::Value::Null,
                result,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn job(&self, job_id: &str) -> Option<GenerationJob> {
        self.state.lock().unwrap().jobs.get(job_id).cloned()
    }

    pub fn ledger_rows(&self, call_type: &str) -> Vec<LedgerRow> {
        self.state
            .lock()
            .unwrap()
            .ledger
            .iter()
            .filter(|row| row.call_type == call_type)
            .cloned()
            .collect()
    }

    pub fn ledger_len(&self) -> usize {
        self.state.lock().unwrap().ledger.len()
    }

    pub fn variation_count(&self, persona_id: DbId) -> usize {
        self.state
            .lock()
            .unwrap()
            .variations
            .keys()
            .filter(|(p, _)| *p == persona_id)
            .count()
    }

    pub fn animation_state_names(&self, persona_id: DbId) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .animation_states
            .keys()
            .filter(|(p, _)| *p == persona_id)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn progress(&self, job_id: &str) -> Option<ProgressState> {
        self.state.lock().unwrap().progress.get(job_id).cloned()
    }
}

#[async_trait]
impl PipelineStore for MemStore {
    async fn insert_job_if_absent(
        &self,
        job: &NewGenerationJob,
    ) -> Result<GenerationJob, StoreError> {
        let mut state = self.state.lock().unwrap();
        let row = state
            .jobs
            .entry(job.job_id.clone())
            .or_insert_with(|| GenerationJob {
                job_id: job.job_id.clone(),
                tenant_id: job.tenant_id,
                persona_id: job.persona_id,
                phase: job.phase.clone(),
                status_id: JobStatus::Queued.id(),
                current_step: None,
                error_kind: None,
                error_detail: None,
                parameters: job.parameters.clone(),
                result: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        Ok(row.clone())
    }

    async fn find_job(&self, job_id: &JobId) -> Result<Option<GenerationJob>, StoreError> {
        Ok(self.state.lock().unwrap().jobs.get(job_id).cloned())
    }

    async fn try_claim_job(&self, job_id: &JobId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        match state.jobs.get_mut(job_id) {
            Some(job) if job.status_id == JobStatus::Queued.id() => {
                job.status_id = JobStatus::Processing.id();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_job(
        &self,
        job_id: &JobId,
        result: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(job_id) {
            if job.status_id == JobStatus::Processing.id() {
                job.status_id = JobStatus::Completed.id();
                job.result = Some(result.clone());
            }
        }
        Ok(())
    }

    async fn fail_job(
        &self,
        job_id: &JobId,
        kind: FailureKind,
        detail: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(job_id) {
            if job.status_id == JobStatus::Processing.id() {
                job.status_id = JobStatus::Failed.id();
                job.error_kind = Some(kind.as_str().to_string());
                job.error_detail = Some(detail.to_string());
            }
        }
        Ok(())
    }

    async fn set_job_step(&self, job_id: &JobId, step: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(job_id) {
            job.current_step = Some(step.to_string());
        }
        Ok(())
    }

    async fn count_processing_jobs(&self) -> Result<i64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .jobs
            .values()
            .filter(|j| j.status_id == JobStatus::Processing.id())
            .count() as i64)
    }

    async fn find_persona(&self, id: DbId) -> Result<Option<Persona>, StoreError> {
        Ok(self.state.lock().unwrap().personas.get(&id).cloned())
    }

    async fn touch_persona_generation(&self, id: DbId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(persona) = state.personas.get_mut(&id) {
            persona.last_generation_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn upsert_variation(
        &self,
        variation: &CreateImageVariation,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.variations.insert(
            (variation.persona_id, variation.variation_index),
            ImageVariation {
                id,
                persona_id: variation.persona_id,
                variation_index: variation.variation_index,
                seed: variation.seed,
                delivery_url: variation.delivery_url.clone(),
                approved: false,
                generated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_approved_variation(
        &self,
        persona_id: DbId,
    ) -> Result<Option<ImageVariation>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .variations
            .values()
            .find(|v| v.persona_id == persona_id && v.approved)
            .cloned())
    }

    async fn upsert_animation_state(
        &self,
        animation: &CreateAnimationState,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.animation_states.insert(
            (animation.persona_id, animation.state_name.clone()),
            animation.clone(),
        );
        Ok(())
    }

    async fn try_charge(
        &self,
        tenant_id: DbId,
        job_id: &JobId,
        call_type: &str,
        unit_cost_cents: i64,
        _window_secs: i64,
        ceiling_cents: i64,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        let spent: i64 = state
            .ledger
            .iter()
            .filter(|row| row.tenant_id == tenant_id)
            .map(|row| row.unit_cost_cents)
            .sum();
        if spent + unit_cost_cents > ceiling_cents {
            return Ok(false);
        }
        state.ledger.push(LedgerRow {
            tenant_id,
            job_id: job_id.clone(),
            call_type: call_type.to_string(),
            unit_cost_cents,
        });
        Ok(true)
    }

    async fn init_progress(&self, job_id: &JobId, steps_total: i32) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.progress.entry(job_id.clone()).or_insert(ProgressState {
            steps_total,
            steps_completed: 0,
            current_step: "queued".to_string(),
            history: Vec::new(),
        });
        Ok(())
    }

    async fn advance_progress(
        &self,
        job_id: &JobId,
        step: &str,
        _estimated_remaining_secs: Option<f64>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(progress) = state.progress.get_mut(job_id) {
            progress.steps_completed = (progress.steps_completed + 1).min(progress.steps_total);
            progress.current_step = step.to_string();
            let completed = progress.steps_completed;
            progress.history.push(completed);
        }
        Ok(())
    }

    async fn find_template(
        &self,
        archetype: &str,
    ) -> Result<Option<PromptTemplate>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .get(archetype)
            .or_else(|| state.templates.get("default"))
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Provider fakes
// ---------------------------------------------------------------------------

pub struct FakeVision {
    pub calls: AtomicU32,
}

impl FakeVision {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl VisionProvider for FakeVision {
    async fn analyze_product(
        &self,
        _request: &AnatomyRequest,
    ) -> Result<serde_json::Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({
            "objectName": "soda can",
            "shapeCategory": "cylinder",
            "facePlacement": "upper third of the can",
            "armPlacement": "mid-body, left and right",
        }))
    }
}

pub struct FakeImage {
    pub calls: AtomicU32,
    /// Number of leading calls that fail with a retryable 503.
    pub transient_failures: AtomicU32,
    /// When set, every call fails permanently (content-policy style).
    pub always_reject: bool,
    /// When set, every call sleeps this long before responding.
    pub delay: Option<Duration>,
}

impl FakeImage {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            transient_failures: AtomicU32::new(0),
            always_reject: false,
            delay: None,
        }
    }

    pub fn failing_transiently(times: u32) -> Self {
        let fake = Self::new();
        fake.transient_failures.store(times, Ordering::SeqCst);
        fake
    }

    pub fn rejecting() -> Self {
        Self {
            always_reject: true,
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }
}

#[async_trait]
impl ImageProvider for FakeImage {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<GeneratedImage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.always_reject {
            return Err(ProviderError::Rejected {
                status: 422,
                body: "content policy violation".to_string(),
            });
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Upstream {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        Ok(GeneratedImage {
            bytes: format!("png:{}", request.seed).into_bytes(),
            content_type: "image/png".to_string(),
        })
    }
}

pub struct FakeVideo {
    pub requested_states: Mutex<Vec<String>>,
}

impl FakeVideo {
    pub fn new() -> Self {
        Self {
            requested_states: Mutex::new(Vec::new()),
        }
    }

    pub fn states_seen(&self) -> Vec<String> {
        let mut seen = self.requested_states.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

#[async_trait]
impl VideoProvider for FakeVideo {
    async fn generate_clip(
        &self,
        request: &VideoGenerationRequest,
    ) -> Result<GeneratedVideo, ProviderError> {
        self.requested_states
            .lock()
            .unwrap()
            .push(request.state_name.clone());
        Ok(GeneratedVideo {
            bytes: format!("mp4:{}", request.state_name).into_bytes(),
            content_type: "video/mp4".to_string(),
        })
    }
}

pub struct MemObjects {
    /// Every put attempt, including failed ones.
    pub puts: AtomicU32,
    /// Number of leading puts that fail with a retryable upload error.
    pub transient_failures: AtomicU32,
}

impl MemObjects {
    pub fn new() -> Self {
        Self {
            puts: AtomicU32::new(0),
            transient_failures: AtomicU32::new(0),
        }
    }

    pub fn failing_transiently(times: u32) -> Self {
        let fake = Self::new();
        fake.transient_failures.store(times, Ordering::SeqCst);
        fake
    }
}

#[async_trait]
impl ObjectStore for MemObjects {
    async fn put(
        &self,
        key: &AssetKey,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Upload {
                key: key.as_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(format!("https://cdn.test/{key}"))
    }
}
