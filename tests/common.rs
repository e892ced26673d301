// tests/common.rs

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get as route_get,
    Router,
};
use flate2::read::GzDecoder;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use zip::write::FileOptions;
use zip::ZipWriter;

// Helper function to get the binary command
#[allow(dead_code)] // This is used by many integration tests, but not all.
pub fn repotar_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("repotar"))
}

/// Builds an in-memory zip. `(name, Some(content), mode)` is a file, `(name, None, _)` a directory.
#[allow(dead_code)]
pub fn zip_bytes(entries: &[(&str, Option<&str>, u32)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content, mode) in entries {
        let options = FileOptions::default().unix_permissions(*mode);
        match content {
            Some(content) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            None => writer.add_directory(*name, options).unwrap(),
        }
    }
    writer.finish().unwrap().into_inner()
}

/// The snapshot of `acme/widgets` at `main` used across tests.
#[allow(dead_code)]
pub fn widgets_snapshot() -> Vec<u8> {
    zip_bytes(&[
        ("widgets-main/", None, 0o755),
        ("widgets-main/README.md", Some("# widgets"), 0o644),
        ("widgets-main/docs/", None, 0o755),
        ("widgets-main/docs/guide.md", Some("guide"), 0o644),
        ("widgets-main/docs/api/", None, 0o755),
        ("widgets-main/docs/api/index.md", Some("api"), 0o644),
        ("widgets-main/src/", None, 0o755),
        ("widgets-main/src/lib.rs", Some("pub fn f() {}"), 0o644),
        ("widgets-main/scripts/run.sh", Some("#!/bin/sh\n"), 0o755),
    ])
}

struct SnapshotHost {
    snapshots: HashMap<String, Vec<u8>>,
    delay: Duration,
}

/// Starts a fake hosting provider serving `/{owner}/{repo}/archive/{ref}.zip`.
///
/// `snapshots` maps a ref to its zip bytes; unknown refs get `404`. Every
/// response is held back by `delay`.
#[allow(dead_code)]
pub async fn spawn_snapshot_host(
    snapshots: HashMap<String, Vec<u8>>,
    delay: Duration,
) -> SocketAddr {
    async fn serve_snapshot(
        State(host): State<Arc<SnapshotHost>>,
        AxumPath((_owner, _repo, file)): AxumPath<(String, String, String)>,
    ) -> Response {
        tokio::time::sleep(host.delay).await;
        let git_ref = file.strip_suffix(".zip").unwrap_or(&file);
        match host.snapshots.get(git_ref) {
            Some(bytes) => bytes.clone().into_response(),
            None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        }
    }

    let app = Router::new()
        .route("/:owner/:repo/archive/:file", route_get(serve_snapshot))
        .with_state(Arc::new(SnapshotHost { snapshots, delay }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A snapshot host serving only the `main` widgets snapshot, with no delay.
#[allow(dead_code)]
pub async fn spawn_widgets_host() -> SocketAddr {
    let mut snapshots = HashMap::new();
    snapshots.insert("main".to_string(), widgets_snapshot());
    spawn_snapshot_host(snapshots, Duration::ZERO).await
}

/// Starts a server on `127.0.0.1` answering every path with a redirect to `target`.
#[allow(dead_code)]
pub async fn spawn_redirector(target: String) -> SocketAddr {
    let app = Router::new().route(
        "/*rest",
        route_get(move || {
            let target = target.clone();
            async move { Redirect::temporary(&target) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Sends `request` through `app` and returns status, headers and the full body.
#[allow(dead_code)]
pub async fn send(
    app: Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Lists `(name, content)` for every entry of a `.tar.gz`, directory names without trailing `/`.
#[allow(dead_code)]
pub fn tar_entries(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut out = Vec::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry
            .path()
            .unwrap()
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        out.push((name, content));
    }
    out
}

/// Names of every entry of a `.tar.gz`.
#[allow(dead_code)]
pub fn tar_names(bytes: &[u8]) -> Vec<String> {
    tar_entries(bytes).into_iter().map(|(name, _)| name).collect()
}

/// Waits until `dir` has no entries left, failing after a few seconds.
#[allow(dead_code)]
pub async fn assert_eventually_empty(dir: &Path) {
    for _ in 0..100 {
        if std::fs::read_dir(dir).unwrap().next().is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let left: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    panic!("Workspace root still holds {:?}", left);
}
