//! Public category listing used by search filters and posting forms.

use axum::{Json, extract::State};
use tracing::warn;

use jx_core::db::list_active_categories;
use jx_core::domain::Category;

use crate::SharedState;
use crate::error::ApiError;

pub async fn list_categories(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    match list_active_categories(&state.pool).await {
        Ok(categories) => Ok(Json(categories)),
        Err(err) => {
            warn!(error = %err, "category listing failed, serving an empty list");
            Ok(Json(Vec::new()))
        }
    }
}
