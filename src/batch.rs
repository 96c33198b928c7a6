//! Batch driver
//!
//! One upload is either a single HTML report or a zip archive of them.
//! Archives are unpacked into a scoped temp directory and every HTML-like
//! file inside runs through the single-file pipeline independently; one bad
//! file is logged and skipped, never aborting the batch.

use crate::aggregate::split_record;
use crate::dataset::Dataset;
use crate::encoding;
use crate::error::PipelineError;
use crate::extract;
use std::fs::File;
use std::path::Path;
use walkdir::WalkDir;
use zip::ZipArchive;

/// Run the pipeline for one uploaded file, dispatching on its extension.
/// Anything that is not `.zip`, `.html` or `.htm` (case-insensitive) is
/// rejected before any parsing is attempted.
pub fn process_upload(path: &Path) -> Result<Dataset, PipelineError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("zip") => process_zip_file(path),
        Some("html") | Some("htm") => process_html_file(path),
        _ => Err(PipelineError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Decode, extract, aggregate and assemble a single HTML report. Every
/// output row is tagged with the source file name.
pub fn process_html_file(path: &Path) -> Result<Dataset, PipelineError> {
    let bytes = std::fs::read(path)?;
    let text = encoding::resolve(&bytes)?;

    let Some(extraction) = extract::extract_table(&text) else {
        return Err(PipelineError::NoData(
            "no grading table in the document".to_string(),
        ));
    };

    let source_file = file_name(path);
    let mut rows = Vec::new();
    for record in &extraction.records {
        if let Some(week_rows) = split_record(record, &extraction.window, &source_file) {
            rows.extend(week_rows);
        }
    }

    if rows.is_empty() {
        return Err(PipelineError::NoData(
            "table is missing or has no rows for the whitelisted sites".to_string(),
        ));
    }

    tracing::info!(file = %source_file, rows = rows.len(), "parsed report file");
    Ok(Dataset::assemble(rows, extraction.window.fallback))
}

/// Unpack an archive and run every contained HTML report through the
/// single-file pipeline. Per-file failures are logged and excluded from the
/// merge; an archive where nothing parses yields an empty dataset, not an
/// error. The extraction directory is removed on every exit path.
pub fn process_zip_file(path: &Path) -> Result<Dataset, PipelineError> {
    let temp_dir = tempfile::tempdir()?;
    let mut archive = ZipArchive::new(File::open(path)?)?;
    archive.extract(temp_dir.path())?;

    let mut parts = Vec::new();
    for entry in WalkDir::new(temp_dir.path())
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || !is_html_file(entry.path()) {
            continue;
        }
        match process_html_file(entry.path()) {
            Ok(dataset) => parts.push(dataset),
            Err(err) => {
                tracing::warn!(
                    file = %file_name(entry.path()),
                    error = %err,
                    "skipping archive member"
                );
            }
        }
    }

    Ok(Dataset::merge(parts))
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_report() -> String {
        let mut cells = vec![
            "富源洗選廠".to_string(),
            "富源畜牧場一場(本A棟)".to_string(),
        ];
        for i in 2..35 {
            cells.push(format!("{i}.0%"));
        }
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!(
            "<html><body><table class=\"list\">\
             <tr><td>20250407~20250420 雙周比較</td></tr>\
             <tr><td>sub</td></tr>\
             <tr>{tds}</tr>\
             </table></body></html>"
        )
    }

    fn write_big5(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let (bytes, _, _) = encoding_rs::BIG5.encode(content);
        let path = dir.join(name);
        std::fs::write(&path, &bytes).unwrap();
        path
    }

    #[test]
    fn test_single_file_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_big5(dir.path(), "week15.html", &sample_report());

        let dataset = process_upload(&path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0].unit, "本A");
        assert_eq!(dataset.rows[0].source_file, "week15.html");
        assert_eq!(dataset.rows[0].date_label, "0407-0413");
        assert_eq!(dataset.rows[1].date_label, "0414-0420");
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"junk").unwrap();

        let err = process_upload(&path).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_undecodable_single_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.html");
        std::fs::write(&path, [0xFF, 0xFF, 0xFE, 0x80]).unwrap();

        let err = process_upload(&path).unwrap_err();
        assert!(matches!(err, PipelineError::NoValidEncoding));
    }

    #[test]
    fn test_file_without_table_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.html");
        std::fs::write(&path, b"<html><body>nothing here</body></html>").unwrap();

        let err = process_upload(&path).unwrap_err();
        assert!(matches!(err, PipelineError::NoData(_)));
    }

    #[test]
    fn test_archive_isolates_bad_members() {
        use zip::write::SimpleFileOptions;
        use zip::CompressionMethod;

        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("reports.zip");

        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let report = sample_report();
        let (good_bytes, _, _) = encoding_rs::BIG5.encode(&report);
        writer.start_file("good.html", options).unwrap();
        writer.write_all(&good_bytes).unwrap();
        writer.start_file("corrupt.html", options).unwrap();
        writer.write_all(&[0xFF, 0xFF, 0xFE, 0x80]).unwrap();
        writer.start_file("notes.txt", options).unwrap();
        writer.write_all(b"not a report").unwrap();
        writer.finish().unwrap();

        let dataset = process_upload(&zip_path).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.rows.iter().all(|r| r.source_file == "good.html"));
    }

    #[test]
    fn test_empty_archive_yields_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");

        let writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        writer.finish().unwrap();

        let dataset = process_upload(&zip_path).unwrap();
        assert!(dataset.is_empty());
    }
}
