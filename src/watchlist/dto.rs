use serde::{Deserialize, Serialize};

use crate::catalog::dto::MediaKind;
use crate::error::{ApiError, ApiResult};

pub const MAX_THOUGHTS_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Body for adding a title to the watchlist. tmdbId, mediaKind and title are
/// required; everything else defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub tmdb_id: Option<i64>,
    pub media_kind: Option<MediaKind>,
    pub title: Option<String>,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub streaming_providers: Vec<String>,
    pub priority: Option<Priority>,
}

/// Validated create payload.
#[derive(Debug)]
pub struct NewEntry {
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster: String,
    pub release_date: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub streaming_providers: Vec<String>,
    pub priority: Priority,
}

impl CreateEntryRequest {
    pub fn validate(self) -> ApiResult<NewEntry> {
        let (Some(tmdb_id), Some(media_kind), Some(title)) =
            (self.tmdb_id, self.media_kind, self.title)
        else {
            return Err(ApiError::Validation(
                "Please provide tmdbId, mediaKind, and title".into(),
            ));
        };
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title must not be empty".into()));
        }
        Ok(NewEntry {
            tmdb_id,
            media_kind,
            title,
            poster: self.poster,
            release_date: self.release_date,
            overview: self.overview,
            genres: self.genres,
            streaming_providers: self.streaming_providers,
            priority: self.priority.unwrap_or(Priority::Medium),
        })
    }
}

/// Partial update: only fields present in the body are overwritten.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub rating: Option<f64>,
    pub watched: Option<bool>,
    pub thoughts: Option<String>,
    pub priority: Option<Priority>,
    pub genres: Option<Vec<String>>,
    pub streaming_providers: Option<Vec<String>>,
}

impl UpdateEntryRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(rating) = self.rating {
            if !(0.0..=10.0).contains(&rating) {
                return Err(ApiError::Validation(
                    "Rating must be between 0 and 10".into(),
                ));
            }
        }
        if let Some(thoughts) = &self.thoughts {
            if thoughts.chars().count() > MAX_THOUGHTS_LEN {
                return Err(ApiError::Validation(
                    "Thoughts must be at most 1000 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Optional list filters; combined filters intersect.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub watched: Option<bool>,
    pub media_kind: Option<MediaKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_body(json: &str) -> CreateEntryRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn create_requires_id_kind_and_title() {
        let missing = create_body(r#"{"mediaKind": "movie", "title": "Fight Club"}"#);
        assert!(matches!(
            missing.validate(),
            Err(ApiError::Validation(_))
        ));

        let full = create_body(r#"{"tmdbId": 550, "mediaKind": "movie", "title": "Fight Club"}"#);
        let entry = full.validate().expect("valid create");
        assert_eq!(entry.tmdb_id, 550);
        assert_eq!(entry.media_kind, MediaKind::Movie);
        assert_eq!(entry.priority, Priority::Medium);
        assert!(entry.genres.is_empty());
    }

    #[test]
    fn create_rejects_blank_title() {
        let blank = create_body(r#"{"tmdbId": 1, "mediaKind": "movie", "title": "   "}"#);
        assert!(matches!(blank.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn update_rejects_out_of_range_rating() {
        for bad in [-0.5, 10.5, 42.0] {
            let body = UpdateEntryRequest {
                rating: Some(bad),
                ..Default::default()
            };
            assert!(matches!(body.validate(), Err(ApiError::Validation(_))));
        }
        let ok = UpdateEntryRequest {
            rating: Some(10.0),
            ..Default::default()
        };
        ok.validate().expect("10 is allowed");
    }

    #[test]
    fn update_rejects_long_thoughts() {
        let body = UpdateEntryRequest {
            thoughts: Some("x".repeat(MAX_THOUGHTS_LEN + 1)),
            ..Default::default()
        };
        assert!(matches!(body.validate(), Err(ApiError::Validation(_))));

        let ok = UpdateEntryRequest {
            thoughts: Some("x".repeat(MAX_THOUGHTS_LEN)),
            ..Default::default()
        };
        ok.validate().expect("exactly 1000 chars is allowed");
    }

    #[test]
    fn priority_parses_known_values_only() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
