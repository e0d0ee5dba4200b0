use serde::{Deserialize, Serialize};

/// Kind of catalog title. The upstream calls series "tv"; everything else it
/// may return (people, collections) is discarded at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "series" => Ok(MediaKind::Series),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

impl TryFrom<String> for MediaKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One search result from the external catalog, normalized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogHit {
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster: String,
    pub release_date: String,
    pub overview: String,
    pub vote_average: f64,
}

/// Full detail for one title, normalized across the upstream's movie and tv
/// response shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDetail {
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster: String,
    pub release_date: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub vote_average: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub count: usize,
    pub results: Vec<CatalogHit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_round_trips_through_serde() {
        assert_eq!(serde_json::to_string(&MediaKind::Movie).unwrap(), "\"movie\"");
        assert_eq!(
            serde_json::from_str::<MediaKind>("\"series\"").unwrap(),
            MediaKind::Series
        );
    }

    #[test]
    fn media_kind_rejects_unknown_values() {
        assert!("person".parse::<MediaKind>().is_err());
        assert!(serde_json::from_str::<MediaKind>("\"person\"").is_err());
    }
}
