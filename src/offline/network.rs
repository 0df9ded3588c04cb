//! Network access for the offline cache.

use std::future::Future;
use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::types::AssetResponse;
use crate::error::NetworkError;

/// Source of fresh asset responses.
pub trait Network: Send + Sync {
  fn fetch(&self, url: &Url) -> impl Future<Output = Result<AssetResponse, NetworkError>> + Send;
}

/// Fetches `http(s)://` URLs with reqwest and `file://` URLs from disk.
#[derive(Clone)]
pub struct HttpNetwork {
  client: reqwest::Client,
}

impl HttpNetwork {
  pub fn new() -> Result<Self, NetworkError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("invtab/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| NetworkError::Request {
        url: String::new(),
        message: format!("failed to build http client: {}", e),
      })?;

    Ok(Self { client })
  }

  async fn fetch_http(client: reqwest::Client, url: Url) -> Result<AssetResponse, NetworkError> {
    let request_err = |e: reqwest::Error| NetworkError::Request {
      url: url.to_string(),
      message: e.to_string(),
    };

    let response = client.get(url.clone()).send().await.map_err(request_err)?;

    let status = response.status();
    if !status.is_success() {
      return Err(NetworkError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);

    let body = response.bytes().await.map_err(request_err)?;

    Ok(AssetResponse {
      url,
      content_type,
      body: body.to_vec(),
    })
  }

  async fn fetch_file(url: Url) -> Result<AssetResponse, NetworkError> {
    let path = url.to_file_path().map_err(|_| NetworkError::Request {
      url: url.to_string(),
      message: "not a local file path".to_string(),
    })?;

    let body = tokio::fs::read(&path)
      .await
      .map_err(|e| NetworkError::Request {
        url: url.to_string(),
        message: e.to_string(),
      })?;

    Ok(AssetResponse {
      content_type: guess_content_type(&path),
      url,
      body,
    })
  }
}

impl Network for HttpNetwork {
  fn fetch(&self, url: &Url) -> impl Future<Output = Result<AssetResponse, NetworkError>> + Send {
    let client = self.client.clone();
    let url = url.clone();

    async move {
      match url.scheme() {
        "http" | "https" => Self::fetch_http(client, url).await,
        "file" => Self::fetch_file(url).await,
        other => Err(NetworkError::Request {
          message: format!("unsupported scheme '{}'", other),
          url: url.to_string(),
        }),
      }
    }
  }
}

fn guess_content_type(path: &Path) -> Option<String> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  let mime = match ext.as_str() {
    "json" => "application/json",
    "html" | "htm" => "text/html",
    "css" => "text/css",
    "js" => "text/javascript",
    "png" => "image/png",
    "svg" => "image/svg+xml",
    "txt" => "text/plain",
    _ => return None,
  };
  Some(mime.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_guess_content_type() {
    assert_eq!(
      guess_content_type(Path::new("/srv/data.JSON")).as_deref(),
      Some("application/json")
    );
    assert_eq!(guess_content_type(Path::new("/srv/blob.bin")), None);
    assert_eq!(guess_content_type(Path::new("/srv/README")), None);
  }

  #[tokio::test]
  async fn test_fetch_file() {
    let dir = std::env::temp_dir().join(format!("invtab-net-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("data.json");
    std::fs::write(&path, br#"{"rows":[]}"#).unwrap();

    let network = HttpNetwork::new().unwrap();
    let url = Url::from_file_path(&path).unwrap();
    let response = network.fetch(&url).await.unwrap();

    assert_eq!(response.body, br#"{"rows":[]}"#);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(response.url, url);

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[tokio::test]
  async fn test_fetch_missing_file_is_request_error() {
    let network = HttpNetwork::new().unwrap();
    let url = Url::parse("file:///nonexistent/invtab/data.json").unwrap();
    assert!(matches!(
      network.fetch(&url).await,
      Err(NetworkError::Request { .. })
    ));
  }

  #[tokio::test]
  async fn test_unsupported_scheme() {
    let network = HttpNetwork::new().unwrap();
    let url = Url::parse("ftp://localhost/data.json").unwrap();
    assert!(network.fetch(&url).await.is_err());
  }
}
