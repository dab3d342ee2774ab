use serde::{Deserialize, Serialize};

use super::{normalize_token, AnnotationService, COLLABORATION_POLICY};
use crate::auth::ClientKey;
use crate::database::models::{Annotation, NewAnnotation};
use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnotationRequest {
    pub image_id: i64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    #[serde(default)]
    pub share_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAnnotationsResponse {
    pub annotations: Vec<Annotation>,
}

impl AnnotationService {
    /// POST /annotations
    pub async fn create_annotation(
        &self,
        client: &ClientKey,
        req: CreateAnnotationRequest,
    ) -> Result<Annotation, ApiError> {
        validate_circle(req.x, req.y, req.radius)?;

        self.authorizer
            .authorize_image(
                COLLABORATION_POLICY,
                req.image_id,
                normalize_token(req.share_token.as_deref()),
                client,
            )
            .await?;

        let annotation = self
            .store
            .insert_annotation(NewAnnotation {
                image_id: req.image_id,
                x: req.x,
                y: req.y,
                radius: req.radius,
            })
            .await?;

        tracing::debug!(client = %client, image_id = req.image_id, annotation_id = annotation.id, "Created annotation");
        Ok(annotation)
    }

    /// GET /images/:imageId/annotations
    pub async fn list_annotations(
        &self,
        client: &ClientKey,
        image_id: i64,
        share_token: Option<&str>,
    ) -> Result<ListAnnotationsResponse, ApiError> {
        self.authorizer
            .authorize_image(COLLABORATION_POLICY, image_id, normalize_token(share_token), client)
            .await?;

        let annotations = self.store.list_annotations(image_id).await?;
        Ok(ListAnnotationsResponse { annotations })
    }
}

fn validate_circle(x: f64, y: f64, radius: f64) -> Result<(), ApiError> {
    for (field, value) in [("x", x), ("y", y), ("radius", radius)] {
        if !value.is_finite() {
            return Err(ApiError::invalid_field(field, format!("{} must be a finite number", field)));
        }
    }
    if radius <= 0.0 {
        return Err(ApiError::invalid_field("radius", "radius must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circles_need_positive_radius() {
        assert!(validate_circle(10.0, 20.0, 5.0).is_ok());
        assert!(validate_circle(-10.0, 0.0, 0.5).is_ok());
        assert!(validate_circle(10.0, 20.0, 0.0).is_err());
        assert!(validate_circle(10.0, 20.0, -1.0).is_err());
        assert!(validate_circle(f64::NAN, 20.0, 1.0).is_err());
        assert!(validate_circle(1.0, f64::INFINITY, 1.0).is_err());
    }
}
