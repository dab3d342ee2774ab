//! Request orchestration: validation → authorization → data.
//!
//! Admission runs earlier, in the router's rate-limit middleware, before the
//! request is parsed. Every operation here takes the caller's `ClientKey`,
//! validates its input, authorizes against the target resource and only then
//! reads or writes storage. Any rejection returns before storage is written.

pub mod annotations;
pub mod images;
pub mod messages;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AccessPolicy, Authorizer, ClientKey};
use crate::database::AnnotationStore;
use crate::error::ApiError;
use crate::rate_limit::{LimiterCategory, RateDecision, RateLimiter};
use crate::storage::ObjectStore;

pub use annotations::{CreateAnnotationRequest, ListAnnotationsResponse};
pub use images::{
    DirectUploadRequest, DirectUploadResponse, ImageView, ListUserImagesResponse, ShareLinkResponse,
    UploadImageRequest, UploadImageResponse, UserImage,
};
pub use messages::{AddChatMessageRequest, ListChatMessagesResponse, MAX_MESSAGE_CHARS};

/// Image viewing reports a wrong share token as not-found.
pub const IMAGE_VIEW_POLICY: AccessPolicy = AccessPolicy::EditRestricted;
/// Annotation and chat endpoints treat a valid share token as full access.
pub const COLLABORATION_POLICY: AccessPolicy = AccessPolicy::Strict;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Base URL of the web frontend, used for share links
    pub frontend_url: String,
    pub upload_url_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            upload_url_ttl: Duration::from_secs(3600),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct AnnotationService {
    store: Arc<dyn AnnotationStore>,
    bucket: Arc<dyn ObjectStore>,
    limiter: Arc<RateLimiter>,
    authorizer: Authorizer,
    settings: ServiceSettings,
}

impl AnnotationService {
    pub fn new(
        store: Arc<dyn AnnotationStore>,
        bucket: Arc<dyn ObjectStore>,
        limiter: Arc<RateLimiter>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            authorizer: Authorizer::new(store.clone()),
            store,
            bucket,
            limiter,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn AnnotationStore> {
        &self.store
    }

    pub fn bucket(&self) -> &Arc<dyn ObjectStore> {
        &self.bucket
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Count the request against `category`, failing with a retry hint when
    /// the caller's window is exhausted.
    pub fn admit(&self, category: LimiterCategory, client: &ClientKey) -> Result<RateDecision, ApiError> {
        let decision = self.limiter.check(category, client);
        if decision.allowed {
            return Ok(decision);
        }

        let now = self.limiter.clock().now();
        let retry_after = decision.retry_after_secs(now);
        tracing::warn!(client = %client, %category, retry_after, "Rate limit exceeded");
        Err(ApiError::too_many_requests(retry_after, decision.reset_time_millis()))
    }
}

/// Treat `?shareToken=` with an empty value as no token.
pub(crate) fn normalize_token(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}
