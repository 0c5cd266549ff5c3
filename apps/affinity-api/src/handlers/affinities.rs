//! Affinity catalog endpoints.

use actix_web::{HttpResponse, web};
use affinity_core::DomainError;
use affinity_core::domain::AffinityId;
use affinity_shared::{Page, PageQuery};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/affinities?page=&limit=
pub async fn list_affinities(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let (data, total) = state
        .affinities
        .find_page(query.offset(), query.limit() as usize)
        .await?;

    tracing::debug!(page = query.page(), returned = data.len(), total, "Listed affinities");

    Ok(HttpResponse::Ok().json(Page::new(data, &query, total as u64)))
}

/// GET /api/affinities/{id}
///
/// Bare ids are accepted: `/affinities/3` resolves `aff3`.
pub async fn get_affinity(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = AffinityId::new(path.into_inner());

    let affinity = state
        .affinities
        .find_by_id(&id)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            entity_type: "Affinity",
            id: id.to_string(),
        })?;

    Ok(HttpResponse::Ok().json(affinity))
}
