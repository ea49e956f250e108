//! Récupération des ressources : HTTP(S) ou répertoire local

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::trace;

/// Erreurs de récupération d'une ressource
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source de ressources adressées par chemin relatif
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Récupère le contenu complet d'une ressource
    async fn get(&self, path: &str) -> Result<Bytes, FetchError>;

    /// Adresse complète d'une ressource, pour les logs
    fn locate(&self, path: &str) -> String;
}

/// Joint une base et un chemin avec exactement un `/` entre les deux
pub fn join(base: &str, path: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Récupération HTTP(S) sous une URL de base
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, path: &str) -> Result<Bytes, FetchError> {
        let url = self.locate(path);
        trace!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|source| FetchError::Http { url, source })
    }

    fn locate(&self, path: &str) -> String {
        join(&self.base_url, path)
    }
}

/// Lecture dans un répertoire local
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Fetch for FsFetcher {
    async fn get(&self, path: &str) -> Result<Bytes, FetchError> {
        let full = self.resolve(path);
        trace!(path = %full.display(), "read");

        tokio::fs::read(&full)
            .await
            .map(Bytes::from)
            .map_err(|source| FetchError::Io { path: full, source })
    }

    fn locate(&self, path: &str) -> String {
        self.resolve(path).display().to_string()
    }
}

/// Choisit HTTP ou fichiers locaux selon la forme de la base
#[derive(Debug, Clone)]
pub enum SmartFetcher {
    Http(HttpFetcher),
    Fs(FsFetcher),
}

impl SmartFetcher {
    /// `http://` ou `https://` donnent un client HTTP, tout le reste un répertoire
    pub fn from_base(base: &str) -> Result<Self, FetchError> {
        if base.starts_with("http://") || base.starts_with("https://") {
            Ok(Self::Http(HttpFetcher::new(base)?))
        } else {
            Ok(Self::Fs(FsFetcher::new(base)))
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Fs(_) => "filesystem",
        }
    }
}

#[async_trait]
impl Fetch for SmartFetcher {
    async fn get(&self, path: &str) -> Result<Bytes, FetchError> {
        match self {
            Self::Http(http) => http.get(path).await,
            Self::Fs(fs) => fs.get(path).await,
        }
    }

    fn locate(&self, path: &str) -> String {
        match self {
            Self::Http(http) => http.locate(path),
            Self::Fs(fs) => fs.locate(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("/", "colombia-departments.json"), "/colombia-departments.json");
        assert_eq!(
            join("/OrquideaProyectWeb/", "departamentos/departamentos.shp"),
            "/OrquideaProyectWeb/departamentos/departamentos.shp"
        );
        assert_eq!(join("https://host/base", "/x.json"), "https://host/base/x.json");
        assert_eq!(join("base/", "/x.json"), "base/x.json");
    }

    #[test]
    fn test_smart_fetcher() {
        assert!(matches!(
            SmartFetcher::from_base("https://example.org/"),
            Ok(SmartFetcher::Http(_))
        ));
        assert!(matches!(
            SmartFetcher::from_base("./public"),
            Ok(SmartFetcher::Fs(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_fetcher() {
        let dir = std::env::temp_dir().join(format!("orquidea-fetch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("data.json"), b"{}").unwrap();

        let fetcher = FsFetcher::new(&dir);
        assert_eq!(fetcher.get("/data.json").await.unwrap(), Bytes::from_static(b"{}"));
        assert!(matches!(
            fetcher.get("missing.json").await,
            Err(FetchError::Io { .. })
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
