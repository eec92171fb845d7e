use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::{any, get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::net::error;
use crate::net::layer;
use crate::state::ArcShared;

mod handle;

async fn ping() -> (StatusCode, &'static str) {
    (StatusCode::OK, "pong")
}

async fn not_found() -> error::Error {
    error::Error::api(error::GeneralKind::NotFound)
}

async fn handle_error(elapsed: layer::Elapsed) -> error::Error {
    elapsed.into()
}

pub fn routes(state: &ArcShared) -> Router {
    Router::new()
        .route(
            "/",
            get(handle::get)
                .post(handle::post)
        )
        .route(
            "/files",
            get(handle::files::get)
        )
        .route(
            "/download",
            get(handle::download::get)
        )
        .route(
            "/download/zip",
            any(handle::download::bundle::handle)
        )
        .route("/ping", get(ping))
        .fallback(not_found)
        .layer(ServiceBuilder::new()
            .layer(layer::RIDLayer::new())
            .layer(TraceLayer::new_for_http()
                .make_span_with(layer::make_span_with)
                .on_request(layer::on_request)
                .on_response(layer::on_response)
                .on_failure(layer::on_failure))
            .layer(HandleErrorLayer::new(handle_error))
            .layer(layer::TimeoutLayer::new(state.request_timeout())))
        .with_state(state.clone())
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, Bytes};
    use axum::http::{header, HeaderMap, Request};
    use pubdisk_api::client::DiskClient;
    use tower::ServiceExt;
    use url::Url;
    use url::form_urlencoded::Serializer;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::ZipArchive;

    use crate::cache::MemoryCache;
    use crate::state::Shared;
    use crate::template::Templates;

    const LINK: &str = "https://disk.yandex.ru/d/routes";

    fn state_for(server: &MockServer) -> Shared {
        let disk = DiskClient::builder()
            .base(Url::parse(&format!("{}/resources", server.uri())).unwrap())
            .build()
            .unwrap();

        Shared::new(
            Templates::built_in().unwrap(),
            disk,
            Arc::new(MemoryCache::new(100))
        )
    }

    fn router_for(server: &MockServer) -> Router {
        routes(&Arc::new(state_for(server)))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, headers, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn form_request(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
        let mut serializer = Serializer::new(String::new());

        for (key, value) in pairs {
            serializer.append_pair(key, value);
        }

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(serializer.finish()))
            .unwrap()
    }

    fn query(pairs: &[(&str, &str)]) -> String {
        let mut serializer = Serializer::new(String::new());

        for (key, value) in pairs {
            serializer.append_pair(key, value);
        }

        serializer.finish()
    }

    async fn mount_file(server: &MockServer, file_path: &str, signed: &str, contents: &'static [u8]) {
        Mock::given(method("GET"))
            .and(path("/resources/download"))
            .and(query_param("public_key", LINK))
            .and(query_param("path", file_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "href": format!("{}/signed/{}", server.uri(), signed)
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/signed/{}", signed)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(contents))
            .mount(server)
            .await;
    }

    fn archive_entries(body: Bytes) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(body.to_vec())).unwrap();
        let mut rtn = Vec::new();

        for index in 0..archive.len() {
            let mut file = archive.by_index(index).unwrap();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();

            rtn.push((file.name().to_owned(), contents));
        }

        rtn
    }

    #[tokio::test]
    async fn ping_pong() {
        let server = MockServer::start().await;
        let (status, _, body) = send(router_for(&server), get_request("/ping")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"pong");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = MockServer::start().await;
        let (status, headers, body) = send(router_for(&server), get_request("/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["kind"], serde_json::json!({"General": "NotFound"}));
    }

    #[tokio::test]
    async fn landing_page() {
        let server = MockServer::start().await;
        let (status, headers, body) = send(router_for(&server), get_request("/")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(String::from_utf8_lossy(&body).contains("name=\"public_link\""));
    }

    #[tokio::test]
    async fn landing_post_redirects_to_listing() {
        let server = MockServer::start().await;
        let request = form_request("/", &[("public_link", "  https://disk.yandex.ru/d/abc  ")]);
        let (status, headers, _) = send(router_for(&server), request).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(
            headers[header::LOCATION],
            "/files?public_link=https%3A%2F%2Fdisk.yandex.ru%2Fd%2Fabc"
        );
    }

    #[tokio::test]
    async fn landing_post_rejects_invalid_link() {
        let server = MockServer::start().await;
        let long = "a".repeat(501);
        let cases = [
            vec![("public_link", "   ")],
            vec![("public_link", long.as_str())],
            vec![],
        ];

        for pairs in cases {
            let (status, _, body) = send(router_for(&server), form_request("/", &pairs)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "pairs {:?}", pairs);
            assert!(String::from_utf8_lossy(&body).contains("class=\"message\""));
        }
    }

    #[tokio::test]
    async fn listing_filters_by_file_type() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resources"))
            .and(query_param("public_key", LINK))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_embedded": {
                    "items": [
                        {"path": "/cat.png", "name": "cat.png", "type": "file", "media_type": "image", "mime_type": "image/png"},
                        {"path": "/report.pdf", "name": "report.pdf", "type": "file", "media_type": "document", "mime_type": "application/pdf"}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let router = router_for(&server);
        let uri = format!("/files?{}", query(&[("public_link", LINK), ("file_type", "image")]));
        let (status, _, body) = send(router.clone(), get_request(&uri)).await;
        let page = String::from_utf8_lossy(&body);

        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("cat.png"));
        assert!(!page.contains("report.pdf"));
        assert!(page.contains("filtered by image"));

        // served from the cache
        let (status, _, body) = send(router, get_request(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("cat.png"));
    }

    #[tokio::test]
    async fn listing_upstream_failure_renders_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resources"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let uri = format!("/files?{}", query(&[("public_link", LINK)]));
        let (status, headers, body) = send(router_for(&server), get_request(&uri)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(String::from_utf8_lossy(&body).contains("failed to list files for the public link"));
    }

    #[tokio::test]
    async fn listing_by_group() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_embedded": {
                    "items": [
                        {"path": "/cat.png", "type": "file", "media_type": "image", "mime_type": "image/png"},
                        {"path": "/report.pdf", "type": "file", "media_type": "document", "mime_type": "application/pdf"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let uri = format!("/files?{}", query(&[("public_link", LINK), ("group", "documents")]));
        let (status, _, body) = send(router_for(&server), get_request(&uri)).await;
        let page = String::from_utf8_lossy(&body);

        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("report.pdf"));
        assert!(!page.contains("cat.png"));
        assert!(page.contains("filtered by documents"));
    }

    #[tokio::test]
    async fn slow_request_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resources"))
            .respond_with(ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let state = state_for(&server)
            .with_request_timeout(Duration::from_millis(100));
        let router = routes(&Arc::new(state));

        let uri = format!("/files?{}", query(&[("public_link", LINK)]));
        let (status, _, body) = send(router, get_request(&uri)).await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["kind"], serde_json::json!({"General": "Timeout"}));
    }

    #[tokio::test]
    async fn single_download_is_attachment() {
        let server = MockServer::start().await;
        mount_file(&server, "docs/report.pdf", "report", b"%PDF-1.4 body").await;

        let uri = format!("/download?{}", query(&[("public_link", LINK), ("path", "docs/report.pdf")]));
        let (status, headers, body) = send(router_for(&server), get_request(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"report.pdf\"");
        assert_eq!(&body[..], b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn single_download_upstream_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resources/download"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let uri = format!("/download?{}", query(&[("public_link", LINK), ("path", "x.txt")]));
        let (status, _, body) = send(router_for(&server), get_request(&uri)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["kind"], serde_json::json!({"Disk": "DownloadFailed"}));
    }

    #[tokio::test]
    async fn bundle_download() {
        let server = MockServer::start().await;
        mount_file(&server, "a/x.txt", "x", b"xxx").await;
        mount_file(&server, "b/y.txt", "y", b"yyy").await;

        let request = form_request("/download/zip", &[
            ("public_link", LINK),
            ("path", "a/x.txt"),
            ("path", "b/y.txt"),
        ]);
        let (status, headers, body) = send(router_for(&server), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"files.zip\"");
        assert_eq!(headers[handle::download::bundle::SKIPPED_HEADER], "0");
        assert_eq!(archive_entries(body), vec![
            ("x.txt".to_owned(), b"xxx".to_vec()),
            ("y.txt".to_owned(), b"yyy".to_vec()),
        ]);
    }

    #[tokio::test]
    async fn bundle_skips_failed_files() {
        let server = MockServer::start().await;
        mount_file(&server, "a/x.txt", "x", b"xxx").await;

        Mock::given(method("GET"))
            .and(path("/resources/download"))
            .and(query_param("path", "missing.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let request = form_request("/download/zip", &[
            ("public_link", LINK),
            ("path", "missing.txt"),
            ("path", "a/x.txt"),
        ]);
        let (status, headers, body) = send(router_for(&server), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[handle::download::bundle::SKIPPED_HEADER], "1");
        assert_eq!(archive_entries(body), vec![("x.txt".to_owned(), b"xxx".to_vec())]);
    }

    #[tokio::test]
    async fn bundle_without_selection_is_bad_request() {
        let server = MockServer::start().await;

        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = form_request("/download/zip", &[("public_link", LINK)]);
        let (status, _, body) = send(router_for(&server), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["kind"], serde_json::json!({"Disk": "NoFilesSelected"}));
    }

    #[tokio::test]
    async fn bundle_wrong_method() {
        let server = MockServer::start().await;
        let uri = format!("/download/zip?{}", query(&[("public_link", LINK), ("path", "a/x.txt")]));

        for method in ["GET", "PUT", "DELETE"] {
            let request = Request::builder()
                .method(method)
                .uri(&uri)
                .body(Body::empty())
                .unwrap();
            let (status, _, _) = send(router_for(&server), request).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {}", method);
        }
    }
}
