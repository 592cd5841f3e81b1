//! HTTP routes for driver status and installation.
//!
//! Unknown paths, including extra segments such as `/driver/x`, get `404`
//! and unsupported methods get `405` from the router itself.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Form, State, rejection::FormRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;

use super::AppState;
use crate::libs::progress::{ChannelSink, LogSink, TeeSink};
use crate::libs::version_probe::{self, VersionReport};
use crate::{log_debug, log_error, log_warn};

/// Creates the router with the driver routes.
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver", get(driver))
        .route("/installdriver", get(install_driver).post(install_driver))
}

/// GET /driver - Installed and required driver versions as JSON.
///
/// Probe failures are reported in the `error` field with a `200`; a missing
/// driver is an empty `currentVersion` with no error.
async fn driver(State(state): State<Arc<AppState>>) -> Result<Json<VersionReport>, (StatusCode, String)> {
    let report = tokio::task::spawn_blocking(move || {
        let settings = state.installer.settings();
        version_probe::report(&settings.install_dir, &settings.version, state.runner.as_ref())
    })
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(Json(report))
}

/// Form accepted by `/installdriver`, from the query string on GET or an
/// urlencoded body on POST.
#[derive(Debug, Default, Deserialize)]
pub struct InstallForm {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
}

/// GET|POST /installdriver - Runs an install and streams its progress.
///
/// Each progress event becomes one `<category>: <message>` line of a
/// `text/plain` body. The install runs on the blocking pool; if the client
/// goes away the install is cancelled at its next checkpoint.
///
/// # Status codes
///
/// - `400` when the form cannot be parsed
/// - `500` when the install directory cannot be created
/// - `200` otherwise, including installs that fail after streaming started
async fn install_driver(
    State(state): State<Arc<AppState>>,
    form: Result<Form<InstallForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            log_warn!("[Server] Rejected /installdriver form: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };
    let event_id = form.event_id;

    // A missing id is reported in the stream itself and must not touch the disk.
    if !event_id.trim().is_empty() {
        let dir_state = state.clone();
        match tokio::task::spawn_blocking(move || dir_state.installer.ensure_install_dir()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log_error!("[Server] {}", err);
                return (StatusCode::INTERNAL_SERVER_ERROR, format!("error: {err}\n")).into_response();
            }
            Err(err) => {
                log_error!("[Server] Install directory task failed: {}", err);
                return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
            }
        }
    }

    let (tx, mut rx) = unbounded_channel();
    let cancel = CancellationToken::new();
    let sink = TeeSink::new(ChannelSink::new(tx).cancel_on_disconnect(cancel.clone()), LogSink);
    log_debug!("[Server] Starting install for event '{}'", event_id);
    tokio::task::spawn_blocking(move || {
        // The failure has already been streamed as the run's error line.
        let _ = state.installer.install(&event_id, &sink, &cancel);
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            yield Ok::<_, Infallible>(event.to_line());
        }
    };
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::driver_installer::DriverInstaller;
    use crate::libs::errors::RunError;
    use crate::libs::mirrors::default_mirrors;
    use crate::libs::utilities::assets::testing::ScriptedClient;
    use crate::libs::utilities::compression::testing::{dir, file, write_zip};
    use crate::libs::utilities::platform::PlatformTag;
    use crate::libs::version_probe::{CommandRunner, marker_path};
    use crate::schemas::driver::{DriverSettings, ToolVersion};
    use crate::server::build_router;
    use std::path::Path;
    use std::time::Duration;
    use tokio::net::TcpListener;

    struct FixedRunner(&'static str);

    impl CommandRunner for FixedRunner {
        fn output(&self, _program: &Path, _args: &[&str]) -> Result<String, RunError> {
            Ok(self.0.to_string())
        }
    }

    fn state_for(install_dir: &Path) -> AppState {
        let settings = DriverSettings {
            version: ToolVersion::new("1.49.1"),
            install_dir: install_dir.to_path_buf(),
            platform: PlatformTag::Linux,
            download_host: None,
            mirrors: default_mirrors(),
            timeout: Duration::from_secs(5),
        };
        AppState::new(
            DriverInstaller::with_client(settings, Arc::new(ScriptedClient::new())),
            Arc::new(FixedRunner("Version 1.49.1\n")),
        )
    }

    async fn spawn_server(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(Arc::new(state))).await.unwrap();
        });
        format!("http://{addr}")
    }

    struct Reply {
        status: u16,
        content_type: String,
        body: String,
    }

    /// Issues a blocking request from the blocking pool; error statuses are returned, not raised.
    async fn call(method: &'static str, url: String, body: Option<(&'static str, &'static str)>) -> Reply {
        tokio::task::spawn_blocking(move || {
            let request = ureq::request(method, &url);
            let result = match body {
                Some((content_type, body)) => request.set("Content-Type", content_type).send_string(body),
                None => request.call(),
            };
            let response = match result {
                Ok(response) => response,
                Err(ureq::Error::Status(_, response)) => response,
                Err(err) => panic!("request failed: {err}"),
            };
            Reply {
                status: response.status(),
                content_type: response.content_type().to_string(),
                body: response.into_string().unwrap(),
            }
        })
        .await
        .unwrap()
    }

    fn retain_archive(install_dir: &Path) {
        std::fs::create_dir_all(install_dir).unwrap();
        write_zip(
            &install_dir.join("playwright-1.49.1-linux.zip"),
            &[dir("package/"), file("package/cli.js", b"//", 0o644), file("node", b"#!", 0o755)],
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_driver_reports_absence_without_error() {
        let temp = tempfile::tempdir().unwrap();
        let base = spawn_server(state_for(temp.path())).await;

        let reply = call("GET", format!("{base}/driver"), None).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "application/json");
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"currentVersion": "", "requiredVersion": "1.49.1", "error": ""})
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_driver_reports_installed_version() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("package")).unwrap();
        std::fs::write(marker_path(temp.path()), b"//").unwrap();
        let base = spawn_server(state_for(temp.path())).await;

        let reply = call("GET", format!("{base}/driver"), None).await;

        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(json["currentVersion"], "Version 1.49.1");
        assert_eq!(json["error"], "");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wrong_method_and_unknown_paths() {
        let temp = tempfile::tempdir().unwrap();
        let base = spawn_server(state_for(temp.path())).await;

        assert_eq!(call("POST", format!("{base}/driver"), None).await.status, 405);
        assert_eq!(call("GET", format!("{base}/driver/extra"), None).await.status, 404);
        assert_eq!(call("GET", format!("{base}/installdriver/extra"), None).await.status, 404);
        assert_eq!(call("GET", format!("{base}/hello"), None).await.status, 404);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_event_id_streams_error_line() {
        let temp = tempfile::tempdir().unwrap();
        let install_dir = temp.path().join("driver");
        let base = spawn_server(state_for(&install_dir)).await;

        let reply = call("GET", format!("{base}/installdriver"), None).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, "error: missing eventID\n");
        assert!(!install_dir.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_install_streams_progress_lines() {
        let temp = tempfile::tempdir().unwrap();
        retain_archive(temp.path());
        let base = spawn_server(state_for(temp.path())).await;

        let reply = call("GET", format!("{base}/installdriver?eventID=abc"), None).await;

        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/plain"), "{}", reply.content_type);
        let lines: Vec<&str> = reply.body.lines().collect();
        assert!(lines[0].starts_with("info: using existing archive "), "{lines:?}");
        assert_eq!(lines.iter().filter(|line| line.starts_with("unzipping: ")).count(), 3);
        assert!(lines.last().unwrap().starts_with("success: unzipped "), "{lines:?}");
        assert!(marker_path(temp.path()).is_file());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_install_accepts_urlencoded_post() {
        let temp = tempfile::tempdir().unwrap();
        retain_archive(temp.path());
        let base = spawn_server(state_for(temp.path())).await;

        let reply = call(
            "POST",
            format!("{base}/installdriver"),
            Some(("application/x-www-form-urlencoded", "eventID=from-form")),
        )
        .await;

        assert_eq!(reply.status, 200);
        assert!(reply.body.ends_with('\n'));
        assert!(reply.body.lines().last().unwrap().starts_with("success: "));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_form_is_bad_request() {
        let temp = tempfile::tempdir().unwrap();
        let base = spawn_server(state_for(temp.path())).await;

        let reply = call(
            "POST",
            format!("{base}/installdriver"),
            Some(("application/json", "{\"eventID\":\"x\"}")),
        )
        .await;

        assert_eq!(reply.status, 400);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_uncreatable_install_dir_is_server_error() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let base = spawn_server(state_for(&blocker.join("driver"))).await;

        let reply = call("GET", format!("{base}/installdriver?eventID=abc"), None).await;

        assert_eq!(reply.status, 500);
        assert!(reply.body.starts_with("error: creating directory "), "{}", reply.body);
    }
}
