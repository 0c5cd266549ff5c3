//! Per-user recently viewed endpoints.
//!
//! Writes take the state's list lock so concurrent adds and merges for the
//! same user never lose each other's updates.

use actix_web::{HttpResponse, web};
use affinity_core::DomainError;
use affinity_core::domain::{AffinityId, RecentlyViewedEntry, UserId, merge_lists, record_view};
use affinity_shared::ItemList;

use crate::middleware::error::AppResult;
use crate::state::AppState;

fn validate(entry: &RecentlyViewedEntry) -> Result<(), DomainError> {
    if entry.id.as_str() == AffinityId::PREFIX {
        return Err(DomainError::Validation(
            "entry id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/users/{userId}/recently-viewed
pub async fn list_recently_viewed(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = UserId::new(path.into_inner());
    let items = state.recently_viewed.find_by_user(&user).await?;
    Ok(HttpResponse::Ok().json(ItemList::new(items)))
}

/// POST /api/users/{userId}/recently-viewed
pub async fn add_recently_viewed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<RecentlyViewedEntry>,
) -> AppResult<HttpResponse> {
    let user = UserId::new(path.into_inner());
    let entry = body.into_inner();
    validate(&entry)?;

    let _guard = state.list_writes.lock().await;
    let mut items = state.recently_viewed.find_by_user(&user).await?;
    record_view(&mut items, entry);
    state.recently_viewed.save(&user, items.clone()).await?;

    tracing::debug!(user = %user, len = items.len(), "Recorded view");
    Ok(HttpResponse::Ok().json(ItemList::new(items)))
}

/// POST /api/users/{userId}/recently-viewed/merge
pub async fn merge_recently_viewed(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ItemList<RecentlyViewedEntry>>,
) -> AppResult<HttpResponse> {
    let user = UserId::new(path.into_inner());
    let local = body.into_inner().items;
    for entry in &local {
        validate(entry)?;
    }

    let _guard = state.list_writes.lock().await;
    let remote = state.recently_viewed.find_by_user(&user).await?;
    let merged = merge_lists(local, remote);
    state.recently_viewed.save(&user, merged.clone()).await?;

    tracing::info!(user = %user, len = merged.len(), "Merged recently viewed list");
    Ok(HttpResponse::Ok().json(ItemList::new(merged)))
}
