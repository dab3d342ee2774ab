//! Ownership and share-token authorization for images and everything under them.
//!
//! An annotation inherits its image's owner and share token, and a chat
//! message inherits its annotation's. Missing resources are reported as
//! `NotFound` before any ownership comparison happens.

use std::sync::Arc;

use crate::auth::ClientKey;
use crate::database::models::Annotation;
use crate::database::{AnnotationStore, DatabaseError};
use crate::error::ApiError;

/// How a denial is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any denial is `Forbidden`. A valid share token gives the same
    /// read/write/comment rights as the owner.
    Strict,
    /// A supplied but non-matching share token is `NotFound`, so a guesser
    /// cannot tell a wrong token from a missing image. No token at all is
    /// `Forbidden`.
    EditRestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// Not the owner and no share token supplied
    NotOwner,
    /// A share token was supplied but does not match the image's token
    InvalidShareToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Owner,
    SharedGuest,
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_owner(&self) -> bool {
        matches!(self, AccessDecision::Owner)
    }

    /// Owners and share-token holders may annotate and comment
    pub fn can_edit(&self) -> bool {
        !matches!(self, AccessDecision::Denied(_))
    }
}

/// Compare the caller against the recorded owner, consulting the share token
/// only for non-owners.
pub struct Authorizer {
    store: Arc<dyn AnnotationStore>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn AnnotationStore>) -> Self {
        Self { store }
    }

    /// Decide access to `image_id`, whose recorded owner is `owner_key`.
    ///
    /// Empty tokens count as absent.
    pub async fn authorize(
        &self,
        owner_key: &str,
        share_token: Option<&str>,
        image_id: i64,
        client: &ClientKey,
    ) -> Result<AccessDecision, DatabaseError> {
        if client.as_str() == owner_key {
            return Ok(AccessDecision::Owner);
        }

        let token = match share_token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return Ok(AccessDecision::Denied(DenialReason::NotOwner)),
        };

        match self.store.find_share(image_id, token).await? {
            Some(_) => Ok(AccessDecision::SharedGuest),
            None => Ok(AccessDecision::Denied(DenialReason::InvalidShareToken)),
        }
    }

    /// Resolve the image's owner, decide, and enforce `policy`.
    pub async fn authorize_image(
        &self,
        policy: AccessPolicy,
        image_id: i64,
        share_token: Option<&str>,
        client: &ClientKey,
    ) -> Result<AccessDecision, ApiError> {
        let owner_key = self
            .store
            .image_owner(image_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Image not found"))?;

        let decision = self.authorize(&owner_key, share_token, image_id, client).await?;
        enforce(policy, decision).inspect_err(|_| {
            tracing::debug!(client = %client, image_id, ?decision, "Image access denied");
        })?;
        Ok(decision)
    }

    /// Resolve the annotation, then authorize against its parent image.
    pub async fn authorize_annotation(
        &self,
        policy: AccessPolicy,
        annotation_id: i64,
        share_token: Option<&str>,
        client: &ClientKey,
    ) -> Result<(Annotation, AccessDecision), ApiError> {
        let annotation = self
            .store
            .get_annotation(annotation_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Annotation not found"))?;

        let decision = self
            .authorize_image(policy, annotation.image_id, share_token, client)
            .await?;
        Ok((annotation, decision))
    }
}

/// Map a denial onto the failure `policy` reports for it.
pub fn enforce(policy: AccessPolicy, decision: AccessDecision) -> Result<(), ApiError> {
    match (policy, decision) {
        (_, AccessDecision::Owner) | (_, AccessDecision::SharedGuest) => Ok(()),
        (AccessPolicy::EditRestricted, AccessDecision::Denied(DenialReason::InvalidShareToken)) => {
            Err(ApiError::not_found("Invalid or expired share token"))
        }
        (_, AccessDecision::Denied(_)) => Err(ApiError::forbidden("You do not have access to this image")),
    }
}

/// Share-link creation and other owner-only operations
pub fn require_owner(decision: AccessDecision, action: &str) -> Result<(), ApiError> {
    if decision.is_owner() {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("Only the image owner can {}", action)))
    }
}
