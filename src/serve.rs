//! HTTP server for the report upload form
//!
//! `egg-report serve` → upload a report (or a zip of reports), get back the
//! normalized table plus Excel/CSV downloads.

use crate::batch;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::export;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Payload returned for a successful upload.
#[derive(Serialize)]
struct UploadResult {
    /// Rendered display table (source-file column excluded).
    table_html: String,
    rows: usize,
    /// True when the report header had no date token and the week labels
    /// are placeholders; the date column is then not trustworthy.
    fallback_window: bool,
    excel_path: String,
    csv_path: String,
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
}

// Embedded upload page
const UPLOAD_PAGE_HTML: &str = include_str!("index.html");

/// Start the upload server. Blocks forever serving requests; each request
/// runs the full pipeline to completion before the next is handled.
pub fn start(config: &Config) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.server.upload_dir)?;

    let addr = format!("127.0.0.1:{}", config.server.port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    eprintln!("\nEgg report parser");
    eprintln!("   Upload form: http://localhost:{}", config.server.port);
    eprintln!("   Press Ctrl+C to stop\n");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config) {
            tracing::error!(error = %e, "request handling failed");
        }
    }

    Ok(())
}

fn handle_request(request: Request, config: &Config) -> std::io::Result<()> {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url.as_str(), ""),
    };
    let method = request.method().clone();

    match (&method, path) {
        // Serve the upload form
        (&Method::Get, "/") => {
            let response = Response::from_string(UPLOAD_PAGE_HTML).with_header(
                Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]).unwrap(),
            );
            request.respond(response)
        }

        // API: Upload one report file or archive
        (&Method::Post, "/api/upload") => {
            let query = query.to_string();
            handle_upload(request, &query, config)
        }

        // Download the export artifacts
        (&Method::Get, "/download/xlsx") => send_artifact(
            request,
            &config.xlsx_artifact(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        (&Method::Get, "/download/csv") => {
            send_artifact(request, &config.csv_artifact(), "text/csv; charset=utf-8")
        }

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn handle_upload(mut request: Request, query: &str, config: &Config) -> std::io::Result<()> {
    // The file arrives as the raw request body; the name travels in the
    // query string.
    let upload: UploadQuery = match serde_urlencoded::from_str(query) {
        Ok(q) => q,
        Err(_) => return respond_json(request, 400, &ApiResponse::<()>::failure("no file name")),
    };

    // Keep only the final path component; uploads land in one flat dir.
    let Some(file_name) = Path::new(&upload.filename)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
    else {
        return respond_json(request, 400, &ApiResponse::<()>::failure("no file selected"));
    };

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        let response = ApiResponse::<()>::failure(format!("failed to read upload: {e}"));
        return respond_json(request, 400, &response);
    }
    if body.is_empty() {
        return respond_json(request, 400, &ApiResponse::<()>::failure("empty upload"));
    }

    let saved_path = config.server.upload_dir.join(&file_name);
    if let Err(e) = std::fs::write(&saved_path, &body) {
        let response = ApiResponse::<()>::failure(format!("failed to store upload: {e}"));
        return respond_json(request, 500, &response);
    }

    tracing::info!(file = %file_name, bytes = body.len(), "processing upload");
    let dataset = match batch::process_upload(&saved_path) {
        Ok(dataset) => dataset,
        Err(e) => return respond_json(request, 400, &ApiResponse::<()>::failure(e.to_string())),
    };
    if dataset.is_empty() {
        let response = ApiResponse::<()>::failure("no valid table data found");
        return respond_json(request, 400, &response);
    }

    match write_artifacts(&dataset, config) {
        Ok(result) => respond_json(request, 200, &ApiResponse::success(result)),
        Err(e) => {
            let response = ApiResponse::<()>::failure(format!("export failed: {e}"));
            respond_json(request, 500, &response)
        }
    }
}

/// Write both downloadable artifacts (last-writer-wins, no locking) and
/// build the upload response.
fn write_artifacts(
    dataset: &Dataset,
    config: &Config,
) -> Result<UploadResult, crate::error::PipelineError> {
    let include_source = config.export.include_source;
    export::write_xlsx(dataset, &config.xlsx_artifact(), include_source)?;
    export::write_csv(dataset, &config.csv_artifact(), include_source)?;

    Ok(UploadResult {
        table_html: export::render_html_table(dataset),
        rows: dataset.len(),
        fallback_window: dataset.fallback_window,
        excel_path: "/download/xlsx".to_string(),
        csv_path: "/download/csv".to_string(),
    })
}

fn send_artifact(request: Request, path: &Path, content_type: &str) -> std::io::Result<()> {
    let Ok(bytes) = std::fs::read(path) else {
        let response = Response::from_string("No export artifact yet").with_status_code(404);
        return request.respond(response);
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export");
    let response = Response::from_data(bytes)
        .with_header(Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap())
        .with_header(
            Header::from_bytes(
                &b"Content-Disposition"[..],
                format!("attachment; filename=\"{file_name}\"").as_bytes(),
            )
            .unwrap(),
        );
    request.respond(response)
}

fn respond_json<T: Serialize>(
    request: Request,
    status: u16,
    payload: &ApiResponse<T>,
) -> std::io::Result<()> {
    let json = serde_json::to_string(payload)?;
    let response = Response::from_string(json)
        .with_status_code(status)
        .with_header(
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        );
    request.respond(response)
}
