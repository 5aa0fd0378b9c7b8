//! `GET /audit`: one page of the audit trail, grouped by calendar day.

use axum::{
  Json,
  extract::{Query, State},
};
use hub_core::audit::{self, DayGroup};
use serde::{Deserialize, Serialize};

use crate::{ApiState, HubStore, actor::CurrentActor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PageParams {
  /// 1-based. Defaults to 1.
  pub page:      Option<i64>,
  /// Defaults to the configured audit page size.
  pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditView {
  pub page:        i64,
  pub page_size:   i64,
  pub total_count: u64,
  pub total_pages: u64,
  /// Days in newest-first order; consecutive entries sharing a day are merged.
  pub days:        Vec<DayGroup>,
}

/// `GET /audit?page=<n>&page_size=<m>`
pub async fn list<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(_actor): CurrentActor,
  Query(params): Query<PageParams>,
) -> Result<Json<AuditView>, ApiError> {
  let page = params.page.unwrap_or(1);
  let page_size = params
    .page_size
    .unwrap_or_else(|| i64::from(state.settings.audit_page_size));

  let result = audit::list_page(&*state.store, page, page_size)
    .await
    .map_err(ApiError::from_store)?;

  // `list_page` has already rejected non-positive sizes.
  let total_pages = result.total_pages(u32::try_from(page_size).unwrap_or(u32::MAX));
  let days = audit::group_by_day(&result.entries, state.settings.audit_offset);

  Ok(Json(AuditView {
    page,
    page_size,
    total_count: result.total_count,
    total_pages,
    days,
  }))
}
