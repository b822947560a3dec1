//! Anatomy analysis stage.
//!
//! Asks a vision model where a face and arms belong on the product. The
//! stage is advisory: provider failure or unparseable output falls back
//! to generic placement instead of failing the job. The billable call is
//! still admitted through the ledger first; a rejected charge stops the
//! job before anything is spent.

use std::time::Duration;

use mascotly_core::anatomy::{parse_hints, AnatomyHints};
use mascotly_core::generation::COST_ANATOMY_CENTS;
use mascotly_core::retry::RetryConfig;
use mascotly_core::types::{DbId, JobId};
use mascotly_db::models::cost_ledger::CALL_TYPE_ANATOMY;
use mascotly_providers::{AnatomyRequest, ImagePayload, VisionProvider};

use crate::error::JobFailure;
use crate::limiter::{Charge, Limiter};
use crate::request::InputImage;
use crate::stages::call_with_retry;

pub async fn analyze(
    vision: &dyn VisionProvider,
    limiter: &Limiter<'_>,
    retry_config: &RetryConfig,
    call_timeout: Duration,
    tenant_id: DbId,
    job_id: &JobId,
    image: &InputImage,
    product_name: &str,
) -> Result<AnatomyHints, JobFailure> {
    match limiter
        .charge(tenant_id, job_id, CALL_TYPE_ANATOMY, COST_ANATOMY_CENTS)
        .await?
    {
        Charge::Accepted => {}
        Charge::Rejected(failure) => return Err(failure),
    }

    let request = AnatomyRequest {
        image: ImagePayload {
            bytes: image.bytes.clone(),
            content_type: image.content_type.clone(),
        },
        product_name: product_name.to_string(),
    };

    match call_with_retry(retry_config, call_timeout, || vision.analyze_product(&request)).await
    {
        Ok(raw) => Ok(parse_hints(&raw)),
        Err(e) => {
            tracing::warn!(
                job_id = %job_id,
                error = %e,
                "Vision analysis failed, using default anatomy hints"
            );
            Ok(AnatomyHints::default())
        }
    }
}
