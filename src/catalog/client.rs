use std::time::Duration;

use axum::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};

use crate::{
    catalog::dto::{CatalogDetail, CatalogHit, MediaKind},
    config::TmdbConfig,
    error::{ApiError, ApiResult},
};

/// External media catalog, behind a trait so handlers can be exercised with
/// a fake in tests.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(&self, query: &str) -> ApiResult<Vec<CatalogHit>>;
    async fn details(&self, kind: MediaKind, tmdb_id: i64) -> ApiResult<CatalogDetail>;
}

/// TMDB client. No caching, no retry: a failed upstream call surfaces
/// immediately to the caller.
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchResponse {
    pub results: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHit {
    pub id: Option<i64>,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGenre {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDetail {
    pub id: i64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub genres: Option<Vec<RawGenre>>,
    pub vote_average: Option<f64>,
}

/// Keep only movie/series hits, in upstream order. People, collections and
/// any future upstream kinds are dropped here.
pub(crate) fn normalize_hits(raw: RawSearchResponse) -> Vec<CatalogHit> {
    raw.results
        .into_iter()
        .filter_map(|hit| {
            let kind = match hit.media_type.as_deref() {
                Some("movie") => MediaKind::Movie,
                Some("tv") => MediaKind::Series,
                _ => return None,
            };
            let id = hit.id?;
            let title = match kind {
                MediaKind::Movie => hit.title,
                MediaKind::Series => hit.name,
            }?;
            let release_date = match kind {
                MediaKind::Movie => hit.release_date,
                MediaKind::Series => hit.first_air_date,
            };
            Some(CatalogHit {
                tmdb_id: id,
                media_kind: kind,
                title,
                poster: hit.poster_path.unwrap_or_default(),
                release_date: release_date.unwrap_or_default(),
                overview: hit.overview.unwrap_or_default(),
                vote_average: hit.vote_average.unwrap_or(0.0),
            })
        })
        .collect()
}

pub(crate) fn normalize_detail(kind: MediaKind, raw: RawDetail) -> CatalogDetail {
    let (title, release_date) = match kind {
        MediaKind::Movie => (raw.title, raw.release_date),
        MediaKind::Series => (raw.name, raw.first_air_date),
    };
    CatalogDetail {
        tmdb_id: raw.id,
        media_kind: kind,
        title: title.unwrap_or_default(),
        poster: raw.poster_path.unwrap_or_default(),
        release_date: release_date.unwrap_or_default(),
        overview: raw.overview.unwrap_or_default(),
        genres: raw
            .genres
            .unwrap_or_default()
            .into_iter()
            .map(|g| g.name)
            .collect(),
        vote_average: raw.vote_average.unwrap_or(0.0),
    }
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn upstream(e: reqwest::Error) -> ApiError {
        error!(error = %e, "catalog request failed");
        ApiError::Upstream("Catalog unreachable".into())
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn search(&self, query: &str) -> ApiResult<Vec<CatalogHit>> {
        let url = format!("{}/search/multi", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("include_adult", "false"),
                ("language", "en-US"),
                ("page", "1"),
            ])
            .send()
            .await
            .map_err(Self::upstream)?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "catalog search returned non-success");
            return Err(ApiError::Upstream(format!(
                "Catalog request failed with status {status}"
            )));
        }

        let raw: RawSearchResponse = response.json().await.map_err(Self::upstream)?;
        let hits = normalize_hits(raw);
        debug!(count = hits.len(), "catalog search");
        Ok(hits)
    }

    async fn details(&self, kind: MediaKind, tmdb_id: i64) -> ApiResult<CatalogDetail> {
        let segment = match kind {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        };
        let url = format!("{}/{}/{}", self.base_url, segment, tmdb_id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
            ])
            .send()
            .await
            .map_err(Self::upstream)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound("Title not found in catalog".into()));
        }
        if !status.is_success() {
            error!(%status, %tmdb_id, "catalog details returned non-success");
            return Err(ApiError::Upstream(format!(
                "Catalog request failed with status {status}"
            )));
        }

        let raw: RawDetail = response.json().await.map_err(Self::upstream)?;
        Ok(normalize_detail(kind, raw))
    }
}
