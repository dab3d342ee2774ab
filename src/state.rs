use std::sync::Arc;

use crate::services::AnnotationService;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnnotationService>,
}

impl AppState {
    pub fn new(service: AnnotationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
