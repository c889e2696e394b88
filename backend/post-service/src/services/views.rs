/// View recorder - append-only view events
use crate::db::ViewStore;
use crate::error::Result;
use crate::metrics::{outcome, POST_VIEWS_RECORDED};
use crate::models::View;
use std::sync::Arc;

#[derive(Clone)]
pub struct ViewRecorder {
    views: Arc<dyn ViewStore>,
}

impl ViewRecorder {
    pub fn new(views: Arc<dyn ViewStore>) -> Self {
        Self { views }
    }

    /// Append one view of `post_id` by `viewer_id`, timestamped at insertion.
    pub async fn record(&self, post_id: i64, viewer_id: i64) -> Result<View> {
        let result = self.views.insert_view(post_id, viewer_id).await;
        POST_VIEWS_RECORDED
            .with_label_values(&[outcome(&result)])
            .inc();
        result
    }
}
