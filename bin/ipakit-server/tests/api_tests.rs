//! Integration tests for the conversion, inspection and utility routes.

mod common;

use std::io::Cursor;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use common::{Part, TestApp, body_bytes, body_json, multipart_request, upload, zip_fixture};

fn header_str(response: &axum::response::Response, name: header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

// =============================================================================
// /convert and /api/convert
// =============================================================================

#[tokio::test]
async fn zip_upload_downloads_identical_ipa() {
    let app = TestApp::new();
    let archive = zip_fixture(&[("app/readme.txt", b"hello")]);

    let response = app
        .router
        .clone()
        .oneshot(upload("/convert", "app.zip", "application/zip", &archive))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/octet-stream"
    );
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"app.ipa\""
    );
    assert_eq!(
        header_str(&response, header::CONTENT_LENGTH),
        archive.len().to_string()
    );
    assert!(response.headers().contains_key("x-trace-id"));

    let downloaded = body_bytes(response.into_body()).await;
    assert_eq!(downloaded, archive);
}

#[tokio::test]
async fn mime_type_alone_is_enough_to_accept() {
    let app = TestApp::new();
    let archive = zip_fixture(&[("a.txt", b"a")]);

    let response = app
        .router
        .clone()
        .oneshot(upload("/api/convert", "bundle", "application/x-zip-compressed", &archive))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"bundle.ipa\""
    );
    assert_eq!(body_bytes(response.into_body()).await, archive);
}

#[tokio::test]
async fn png_upload_is_rejected() {
    let app = TestApp::new();
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    let response = app
        .router
        .clone()
        .oneshot(upload("/api/convert", "photo.png", "image/png", png))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("Only ZIP files"));
}

#[tokio::test]
async fn renamed_text_file_fails_signature_check() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(upload("/convert", "notes.zip", "application/zip", b"just some text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        header_str(&response, header::CONTENT_TYPE).starts_with("text/plain"),
        "form endpoint answers in plain text"
    );
}

#[tokio::test]
async fn missing_file_field_is_400_in_both_flavours() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/convert", &[Part::text("note", "hi")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response.into_body()).await, b"No file uploaded");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/convert", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn non_multipart_request_is_no_file() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response.into_body()).await["error"], "No file uploaded");
}

#[tokio::test]
async fn empty_file_part_is_no_file() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(upload("/api/convert", "", "application/octet-stream", b""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.settled_leftovers().await, 0);
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let app = TestApp::with_env(&[("IPAKIT_MAX_UPLOAD_SIZE_MB", "1")]);
    let mut big = zip_fixture(&[("a.txt", b"a")]);
    big.resize(2 * 1024 * 1024, 0);

    let response = app
        .router
        .clone()
        .oneshot(upload("/api/convert", "big.zip", "application/zip", &big))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.settled_leftovers().await, 0);
}

#[tokio::test]
async fn payload_transform_reroots_entries() {
    let app = TestApp::with_env(&[("IPAKIT_TRANSFORM", "payload")]);
    let archive = zip_fixture(&[
        ("MyApp.app/", b""),
        ("MyApp.app/Info.plist", b"<plist/>"),
        ("__MACOSX/._Info.plist", b"junk"),
    ]);

    let response = app
        .router
        .clone()
        .oneshot(upload("/convert", "MyApp.zip", "application/zip", &archive))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let ipa = body_bytes(response.into_body()).await;
    let converted = zip::ZipArchive::new(Cursor::new(ipa)).unwrap();
    let names: Vec<&str> = converted.file_names().collect();
    assert!(names.contains(&"Payload/MyApp.app/Info.plist"));
    assert!(!names.iter().any(|n| n.contains("__MACOSX")));
}

#[tokio::test]
async fn concurrent_conversions_do_not_interfere() {
    let app = TestApp::new();
    let archives: Vec<Vec<u8>> = (0..8)
        .map(|i| zip_fixture(&[("data.bin", format!("payload-{i}").as_bytes())]))
        .collect();

    let requests = archives.iter().enumerate().map(|(i, archive)| {
        let router = app.router.clone();
        let name = format!("app{i}.zip");
        async move {
            let response = router
                .oneshot(upload("/api/convert", &name, "application/zip", archive))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let disposition = header_str(&response, header::CONTENT_DISPOSITION);
            assert!(disposition.contains(&format!("app{i}.ipa")));
            body_bytes(response.into_body()).await
        }
    });
    let results = futures::future::join_all(requests).await;

    for (archive, downloaded) in archives.iter().zip(results) {
        assert_eq!(&downloaded, archive);
    }
    assert_eq!(app.settled_leftovers().await, 0);
}

// =============================================================================
// /api/detect
// =============================================================================

#[tokio::test]
async fn detect_reports_xcode_project() {
    let app = TestApp::new();
    let archive = zip_fixture(&[
        ("MyApp/MyApp.xcodeproj/project.pbxproj", b"// pbx"),
        ("MyApp/Sources/main.swift", b"print(1)"),
    ]);

    let response = app
        .router
        .clone()
        .oneshot(upload("/api/detect", "MyApp.zip", "application/zip", &archive))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["files"].as_array().unwrap().len(), 2);
    assert!(
        body["directories"]
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d == "MyApp/Sources")
    );
    assert_eq!(body["xcode_detection"]["has_xcode_project"], true);
    assert_eq!(
        body["xcode_detection"]["xcode_files"][0]["type"],
        "Xcode Project Bundle"
    );
    assert_eq!(app.settled_leftovers().await, 0);
}

#[tokio::test]
async fn detect_rejects_unreadable_archive() {
    let app = TestApp::new();
    let mut broken = b"PK\x03\x04".to_vec();
    broken.extend_from_slice(&[0u8; 64]);

    let response = app
        .router
        .clone()
        .oneshot(upload("/api/detect", "broken.zip", "application/zip", &broken))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().starts_with("Error reading ZIP file"));
}

// =============================================================================
// Utility routes
// =============================================================================

#[tokio::test]
async fn index_serves_upload_form() {
    let app = TestApp::new();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
    assert!(html.contains("action=\"/convert\""));
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await["status"], "ok");

    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response.into_body()).await;
    assert!(doc["paths"]["/api/convert"].is_object());
}

#[tokio::test]
async fn trace_id_is_echoed() {
    let app = TestApp::new();
    let id = "6f1c1c9e-3a52-4d8e-9d6a-0d7c2b1e4a10";
    let request = Request::builder()
        .uri("/health")
        .header("x-trace-id", id)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(header_str(&response, "x-trace-id".parse().unwrap()), id);
}
