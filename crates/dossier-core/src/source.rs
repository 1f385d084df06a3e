//! Data sources that fetch a collection as a JSON array of records.
//!
//! Two locations are supported:
//! - a directory holding `<collection>.json` files
//! - an HTTP base URL serving `<base>/<collection>.json`

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::record::Collection;

/// Where collections are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Directory(PathBuf),
    Http(Url),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Directory(path) => write!(f, "{}", path.display()),
            Location::Http(url) => write!(f, "{url}"),
        }
    }
}

/// Fetches collections from a [`Location`].
#[derive(Debug, Clone)]
pub struct DataSource {
    location: Location,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl DataSource {
    /// Source reading `<dir>/<collection>.json`.
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self::new(Location::Directory(dir.into()))
    }

    /// Source fetching `<base_url>/<collection>.json`.
    pub fn http(mut base_url: Url) -> Self {
        // Url::join replaces the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self::new(Location::Http(base_url))
    }

    /// Parses a location given on the command line or in config.
    ///
    /// Values starting with `http://` or `https://` are URLs, everything else
    /// is a directory path.
    pub fn parse(location: &str) -> Result<Self, url::ParseError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Ok(Self::http(Url::parse(location)?))
        } else {
            Ok(Self::directory(location))
        }
    }

    fn new(location: Location) -> Self {
        Self {
            location,
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Sets a per-fetch timeout. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Fetches and decodes one collection.
    ///
    /// # Errors
    /// Returns a [`LoadError`] when the data cannot be read, the request fails,
    /// the body is not a JSON array of `T`, or the timeout elapses.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, LoadError> {
        let body = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_body(collection))
                .await
                .map_err(|_elapsed| LoadError::new(collection, LoadErrorKind::Timeout(limit)))??,
            None => self.fetch_body(collection).await?,
        };

        serde_json::from_str(&body)
            .map_err(|e| LoadError::new(collection, LoadErrorKind::Parse(e.to_string())))
    }

    async fn fetch_body(&self, collection: Collection) -> Result<String, LoadError> {
        match &self.location {
            Location::Directory(dir) => {
                let path = dir.join(collection.file_name());
                tokio::fs::read_to_string(&path).await.map_err(|e| {
                    LoadError::new(
                        collection,
                        LoadErrorKind::Io(format!("{}: {}", path.display(), e)),
                    )
                })
            }
            Location::Http(base) => {
                let url = base
                    .join(&collection.file_name())
                    .map_err(|e| LoadError::new(collection, LoadErrorKind::Http(e.to_string())))?;
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| LoadError::new(collection, LoadErrorKind::Http(e.to_string())))?;
                response
                    .text()
                    .await
                    .map_err(|e| LoadError::new(collection, LoadErrorKind::Http(e.to_string())))
            }
        }
    }
}

/// Categories of load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// Reading the collection file failed.
    Io(String),
    /// The HTTP request failed or returned an error status.
    Http(String),
    /// The body was not a JSON array of the expected records.
    Parse(String),
    /// The fetch did not finish within the configured timeout.
    Timeout(Duration),
    /// The fetch was abandoned before completing.
    Cancelled,
}

/// A collection failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub collection: Collection,
    pub kind: LoadErrorKind,
}

impl LoadError {
    pub fn new(collection: Collection, kind: LoadErrorKind) -> Self {
        Self { collection, kind }
    }

    pub fn cancelled(collection: Collection) -> Self {
        Self::new(collection, LoadErrorKind::Cancelled)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LoadErrorKind::Io(msg) => write!(f, "failed to read {}: {}", self.collection, msg),
            LoadErrorKind::Http(msg) => write!(f, "failed to fetch {}: {}", self.collection, msg),
            LoadErrorKind::Parse(msg) => write!(f, "malformed {} data: {}", self.collection, msg),
            LoadErrorKind::Timeout(limit) => write!(
                f,
                "timed out loading {} after {}s",
                self.collection,
                limit.as_secs()
            ),
            LoadErrorKind::Cancelled => write!(f, "loading {} was cancelled", self.collection),
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::record::Skill;

    #[tokio::test]
    async fn test_directory_source_reads_collection_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("skills.json"),
            r#"[{"id": 1, "name": "Athletics", "characteristic": "Brawn"}]"#,
        )
        .unwrap();

        let source = DataSource::directory(dir.path());
        let skills: Vec<Skill> = source.fetch(Collection::Skills).await.unwrap();

        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].characteristic, "Brawn");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let source = DataSource::directory(dir.path());

        let err = source.fetch::<Skill>(Collection::Skills).await.unwrap_err();
        assert_eq!(err.collection, Collection::Skills);
        assert!(matches!(err.kind, LoadErrorKind::Io(_)));
    }

    #[tokio::test]
    async fn test_non_array_body_is_parse_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("skills.json"), r#"{"id": 1}"#).unwrap();
        let source = DataSource::directory(dir.path());

        let err = source.fetch::<Skill>(Collection::Skills).await.unwrap_err();
        assert!(matches!(err.kind, LoadErrorKind::Parse(_)));
        assert!(err.to_string().starts_with("malformed skills data"));
    }

    #[tokio::test]
    async fn test_http_source_joins_collection_onto_base_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/data/skills.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"id": "cool", "name": "Cool", "characteristic": "Presence"}]"#,
            ))
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/media/data", server.uri())).unwrap();
        let skills: Vec<Skill> = DataSource::http(base)
            .fetch(Collection::Skills)
            .await
            .unwrap();

        assert_eq!(skills[0].name, "Cool");
    }

    #[tokio::test]
    async fn test_http_error_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/skills.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = DataSource::parse(&server.uri()).unwrap();
        let err = source.fetch::<Skill>(Collection::Skills).await.unwrap_err();
        assert!(matches!(err.kind, LoadErrorKind::Http(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/skills.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let source = DataSource::parse(&server.uri())
            .unwrap()
            .with_timeout(Some(Duration::from_millis(50)));
        let err = source.fetch::<Skill>(Collection::Skills).await.unwrap_err();
        assert!(matches!(err.kind, LoadErrorKind::Timeout(_)));
    }

    #[test]
    fn test_parse_distinguishes_urls_from_paths() {
        let source = DataSource::parse("https://example.com/data").unwrap();
        assert_eq!(
            source.location(),
            &Location::Http(Url::parse("https://example.com/data/").unwrap())
        );

        let source = DataSource::parse("media/data").unwrap();
        assert_eq!(
            source.location(),
            &Location::Directory(PathBuf::from("media/data"))
        );
    }
}
