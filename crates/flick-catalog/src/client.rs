use flick_types::catalog::{Credits, Genre, MediaDetails, MovieSummary, SearchResult};
use flick_types::models::MediaType;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::CatalogError;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub base_url: String,
    /// TMDB `language` parameter, e.g. `pt-BR`.
    pub language: String,
}

impl CatalogConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "pt-BR".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    http: Client,
    config: CatalogConfig,
}

// -- Upstream payloads --

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// A multi-search hit before kind filtering. People, collections and
/// anything else TMDB adds later land here too.
#[derive(Deserialize)]
struct RawSearchItem {
    id: u64,
    #[serde(default)]
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
}

impl RawSearchItem {
    fn into_result(self) -> Option<SearchResult> {
        let media_type = self.media_type.as_deref()?.parse::<MediaType>().ok()?;
        Some(SearchResult {
            id: self.id,
            media_type,
            title: self.title,
            name: self.name,
            poster_path: self.poster_path,
            overview: self.overview,
            release_date: self.release_date,
            first_air_date: self.first_air_date,
            vote_average: self.vote_average,
        })
    }
}

#[derive(Deserialize)]
struct RawDetails {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    runtime: Option<u32>,
    number_of_seasons: Option<u32>,
    number_of_episodes: Option<u32>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    #[serde(default)]
    genres: Vec<Genre>,
    credits: Option<Credits>,
}

impl TmdbClient {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Multi-type search, keeping only movies and shows.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        let page: Page<RawSearchItem> = self
            .get(
                "search/multi",
                &[("query", query), ("include_adult", "false")],
            )
            .await?;

        let total = page.results.len();
        let results: Vec<SearchResult> = page
            .results
            .into_iter()
            .filter_map(RawSearchItem::into_result)
            .collect();

        debug!(
            "Catalog search '{}': {} hits, {} movie/tv",
            query,
            total,
            results.len()
        );
        Ok(results)
    }

    pub async fn details(
        &self,
        media_type: MediaType,
        id: u64,
        include_credits: bool,
    ) -> Result<MediaDetails, CatalogError> {
        let path = format!("{}/{}", media_type.as_str(), id);
        let params: &[(&str, &str)] = if include_credits {
            &[("append_to_response", "credits")]
        } else {
            &[]
        };
        let raw: RawDetails = self.get(&path, params).await?;

        Ok(MediaDetails {
            id: raw.id,
            media_type,
            title: raw.title,
            name: raw.name,
            overview: raw.overview,
            tagline: raw.tagline,
            poster_path: raw.poster_path,
            backdrop_path: raw.backdrop_path,
            release_date: raw.release_date,
            first_air_date: raw.first_air_date,
            runtime: raw.runtime,
            number_of_seasons: raw.number_of_seasons,
            number_of_episodes: raw.number_of_episodes,
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
            genres: raw.genres,
            credits: raw.credits,
        })
    }

    /// First page of TMDB's popular movies.
    pub async fn popular_movies(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        let page: Page<MovieSummary> = self.get("movie/popular", &[("page", "1")]).await?;
        Ok(page.results)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Catalog request to /{} failed with {}", path, status);
            return Err(CatalogError::Status(status));
        }

        Ok(resp.json::<T>().await?)
    }
}
