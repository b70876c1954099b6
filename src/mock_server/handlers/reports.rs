//! Report endpoint handlers.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use super::{authorize, header_str, header_u64, message, not_found, not_ready, SharedState};
use crate::mock_server::state::MockReport;

fn report_key(id: u64) -> String {
    format!("report/{id}")
}

/// File name the server gives a report of `upload_name` in `format`.
fn report_name(format: &str, upload_name: &str) -> Option<String> {
    let name = match format {
        "dep5" => format!("DEP5_{upload_name}.txt"),
        "spdx2" => format!("SPDX2_{upload_name}.rdf"),
        "spdx2tv" => format!("SPDX2TV_{upload_name}.spdx"),
        "readmeoss" => format!("ReadMe_OSS_{upload_name}.txt"),
        "unifiedreport" => format!("FOSSology_Report_{upload_name}.docx"),
        "clixml" => format!("CLIXML_{upload_name}.xml"),
        _ => return None,
    };
    Some(name)
}

/// GET /report
///
/// Schedules generation; the message is the download URL of the report.
pub async fn generate_report(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let Some(upload_id) = header_u64(&headers, "uploadId") else {
        return message(StatusCode::BAD_REQUEST, "uploadId header is required");
    };
    let format = header_str(&headers, "reportFormat").unwrap_or("readmeoss");
    let Some(upload_name) = state.uploads.get(&upload_id).map(|u| u.upload_name.clone()) else {
        return not_found(format!("Upload {upload_id} does not exist"));
    };
    let Some(name) = report_name(format, &upload_name) else {
        return message(
            StatusCode::BAD_REQUEST,
            format!("reportFormat {format} is not supported"),
        );
    };

    let id = state.next_id();
    let content = format!("{format} report for {upload_name}\n").into_bytes();
    state.reports.insert(
        id,
        MockReport {
            upload_id,
            name,
            content,
        },
    );
    let delay = state.report_delay;
    state.not_ready.insert(report_key(id), delay);

    let host = header_str(&headers, "host").unwrap_or("localhost");
    message(
        StatusCode::CREATED,
        format!("http://{host}/repo/api/v1/report/{id}"),
    )
}

/// GET /report/{id}
///
/// Answers 503 while the report is still being generated.
pub async fn download_report(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    if !state.reports.contains_key(&id) {
        return not_found(format!("Report {id} does not exist"));
    }
    if state.take_not_ready(&report_key(id)) {
        return not_ready();
    }
    let Some(report) = state.reports.get(&id) else {
        return not_found(format!("Report {id} does not exist"));
    };

    let mut response = (StatusCode::OK, report.content.clone()).into_response();
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.name)) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_names() {
        assert_eq!(
            report_name("spdx2", "base.tar").as_deref(),
            Some("SPDX2_base.tar.rdf")
        );
        assert_eq!(
            report_name("unifiedreport", "a.zip").as_deref(),
            Some("FOSSology_Report_a.zip.docx")
        );
        assert!(report_name("pdf", "a.zip").is_none());
    }
}
