use crate::config::ArtifactSource;
use crate::error::InferenceError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Makes sure `source.path` exists, downloading it when absent.
///
/// Returns `true` when a download happened. An existing file is trusted as is
/// and costs no network call.
pub async fn ensure_artifact(
    client: &Client,
    source: &ArtifactSource,
) -> Result<bool, InferenceError> {
    let path = &source.path;
    if path.exists() {
        tracing::debug!(path = %path.display(), "Artifact already present, skipping download");
        return Ok(false);
    }

    download_file(client, &source.url, path).await?;
    Ok(true)
}

/// Streams `url` into `path`. The body lands in a `.part` sibling first and is
/// renamed into place only once complete, so `path` never holds a partial file.
pub async fn download_file(
    client: &Client,
    url: &str,
    path: &Path,
) -> Result<u64, InferenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InferenceError::io(parent, e))?;
    }

    tracing::info!(url, path = %path.display(), "Downloading artifact");

    let partial = partial_path(path);
    match fetch_into(client, url, &partial, path).await {
        Ok(bytes) => {
            tracing::info!(path = %path.display(), bytes, "Download complete");
            Ok(bytes)
        }
        Err(err) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %partial.display(),
                        error = %cleanup,
                        "Could not remove partial download"
                    );
                }
            }
            tracing::error!(url, error = %err, "Download failed");
            Err(err)
        }
    }
}

async fn fetch_into(
    client: &Client,
    url: &str,
    partial: &Path,
    path: &Path,
) -> Result<u64, InferenceError> {
    let download_error = |source: reqwest::Error| InferenceError::Download {
        url: url.to_string(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(download_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(InferenceError::DownloadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let expected = response.content_length();

    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| InferenceError::io(partial, e))?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await.map_err(download_error)? {
        file.write_all(&chunk)
            .await
            .map_err(|e| InferenceError::io(partial, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| InferenceError::io(partial, e))?;
    file.sync_all()
        .await
        .map_err(|e| InferenceError::io(partial, e))?;
    drop(file);

    if let Some(expected) = expected {
        if expected != written {
            return Err(InferenceError::DownloadTruncated {
                url: url.to_string(),
                expected,
                got: written,
            });
        }
    }

    tokio::fs::rename(partial, path)
        .await
        .map_err(|e| InferenceError::io(path, e))?;
    Ok(written)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const PAYLOAD: &[u8] = b"{\"config\": {\"word_index\": {\"good\": 1}}}";

    /// Serves `/artifact` (200) and `/missing` (404), counting every request.
    async fn spawn_artifact_server() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));

        async fn artifact(State(hits): State<Arc<AtomicUsize>>) -> &'static [u8] {
            hits.fetch_add(1, Ordering::SeqCst);
            PAYLOAD
        }

        async fn missing(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::NOT_FOUND
        }

        let app = Router::new()
            .route("/artifact", get(artifact))
            .route("/missing", get(missing))
            .with_state(hits.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), hits)
    }

    fn source(url: String, path: PathBuf) -> ArtifactSource {
        ArtifactSource {
            env_var: "TOKENIZER_URL",
            url,
            path,
        }
    }

    #[tokio::test]
    async fn test_downloads_missing_artifact_into_new_directory() {
        let (base, hits) = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model/tokenizer.json");

        let downloaded = ensure_artifact(
            &Client::new(),
            &source(format!("{}/artifact", base), path.clone()),
        )
        .await
        .unwrap();

        assert!(downloaded);
        assert_eq!(std::fs::read(&path).unwrap(), PAYLOAD);
        assert!(!partial_path(&path).exists());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_artifact_makes_no_network_call() {
        let (base, hits) = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, b"local copy").unwrap();

        let downloaded = ensure_artifact(
            &Client::new(),
            &source(format!("{}/artifact", base), path.clone()),
        )
        .await
        .unwrap();

        assert!(!downloaded);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&path).unwrap(), b"local copy");
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_file_behind() {
        let (base, _hits) = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment.onnx");

        let err = ensure_artifact(
            &Client::new(),
            &source(format!("{}/missing", base), path.clone()),
        )
        .await
        .unwrap_err();

        match err {
            InferenceError::DownloadStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("Expected DownloadStatus, got {other:?}"),
        }
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment.onnx.data");
        let err = download_file(&Client::new(), &format!("http://{}/w", addr), &path)
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::Download { .. }));
        assert!(!path.exists());
    }

    /// Answers one request with a `Content-Length` larger than the body it sends.
    async fn spawn_truncating_server(declared: usize, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\n\r\n");
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/artifact", addr)
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_file_behind() {
        let url = spawn_truncating_server(100, b"0123456789").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment.onnx.data");

        let err = ensure_artifact(&Client::new(), &source(url, path.clone()))
            .await
            .unwrap_err();

        // hyper may notice the early close before the length check does
        assert!(
            matches!(
                err,
                InferenceError::DownloadTruncated { expected: 100, got: 10, .. }
                    | InferenceError::Download { .. }
            ),
            "unexpected error: {err:?}"
        );
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let path = Path::new("model/sentiment.onnx");
        assert_eq!(partial_path(path), PathBuf::from("model/sentiment.onnx.part"));
    }
}
