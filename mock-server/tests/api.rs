use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, MockDevice, OPAQUE, REALM};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn rpc(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn rpc_with_auth(uri: &str, body: &str, authorization: &str) -> Request<String> {
    let mut req = rpc(uri, body);
    req.headers_mut()
        .insert(http::header::AUTHORIZATION, authorization.parse().unwrap());
    req
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

fn digest(code: &str, uri: &str, nonce: &str, cnonce: &str) -> String {
    let ha1 = md5_hex(&format!("user:{REALM}:{code}"));
    let ha2 = md5_hex(&format!("POST:{uri}"));
    let response = md5_hex(&format!("{ha1}:{nonce}:00000001:{cnonce}:auth:{ha2}"));
    format!(
        "Digest username=\"user\", realm=\"{REALM}\", nonce=\"{nonce}\", uri=\"{uri}\", \
         response=\"{response}\", qop=auth, nc=00000001, cnonce=\"{cnonce}\", opaque=\"{OPAQUE}\""
    )
}

/// Pull the nonce out of a 401's challenge.
async fn fetch_nonce(router: &Router, uri: &str) -> String {
    let resp = router.clone().oneshot(rpc(uri, "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers()[http::header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Digest "));
    assert!(challenge.contains("realm=\"slide\""));
    assert!(challenge.contains("qop=\"auth\""));
    let start = challenge.find("nonce=\"").unwrap() + "nonce=\"".len();
    let end = start + challenge[start..].find('"').unwrap();
    challenge[start..end].to_string()
}

// --- open device ---

#[tokio::test]
async fn get_info_reports_position() {
    let resp = app().oneshot(rpc("/rpc/Slide.GetInfo", "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let info = body_json(resp).await;
    assert_eq!(info["pos"], 0.0);
    assert!(info["slide_id"].is_string());
}

#[tokio::test]
async fn set_pos_updates_state() {
    let device = MockDevice::new();
    let resp = device
        .router()
        .oneshot(rpc("/rpc/Slide.SetPos", r#"{"pos":0.75}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["response"], "success");
    assert_eq!(device.position().await, 0.75);

    let resp = device.router().oneshot(rpc("/rpc/Slide.GetInfo", "{}")).await.unwrap();
    assert_eq!(body_json(resp).await["pos"], 0.75);
}

#[tokio::test]
async fn set_pos_out_of_range_is_rejected() {
    let device = MockDevice::new();
    let resp = device
        .router()
        .oneshot(rpc("/rpc/Slide.SetPos", r#"{"pos":1.5}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(device.position().await, 0.0);
}

#[tokio::test]
async fn stop_answers_with_empty_body() {
    let resp = app().oneshot(rpc("/rpc/Slide.Stop", "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn calibrate_is_counted() {
    let device = MockDevice::new();
    let resp = device.router().oneshot(rpc("/rpc/Slide.Calibrate", "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(device.calibrations(), 1);
}

#[tokio::test]
async fn get_is_not_allowed() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/rpc/Slide.GetInfo")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- digest-protected device ---

#[tokio::test]
async fn protected_device_challenges_unauthenticated_requests() {
    let device = MockDevice::with_code("rWU7G45S");
    let router = device.router();
    let first = fetch_nonce(&router, "/rpc/Slide.GetInfo").await;
    let second = fetch_nonce(&router, "/rpc/Slide.GetInfo").await;
    assert_ne!(first, second, "every challenge carries a fresh nonce");
    assert_eq!(device.requests(), 2);
}

#[tokio::test]
async fn valid_digest_is_accepted() {
    let device = MockDevice::with_code("rWU7G45S");
    let router = device.router();
    let nonce = fetch_nonce(&router, "/rpc/Slide.SetPos").await;

    let auth = digest("rWU7G45S", "/rpc/Slide.SetPos", &nonce, "0a4f113b");
    let resp = router
        .clone()
        .oneshot(rpc_with_auth("/rpc/Slide.SetPos", r#"{"pos":1}"#, &auth))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(device.position().await, 1.0);
}

#[tokio::test]
async fn nonce_is_single_use() {
    let device = MockDevice::with_code("rWU7G45S");
    let router = device.router();
    let nonce = fetch_nonce(&router, "/rpc/Slide.GetInfo").await;
    let auth = digest("rWU7G45S", "/rpc/Slide.GetInfo", &nonce, "c1");

    let resp = router
        .clone()
        .oneshot(rpc_with_auth("/rpc/Slide.GetInfo", "{}", &auth))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .clone()
        .oneshot(rpc_with_auth("/rpc/Slide.GetInfo", "{}", &auth))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_code_is_rejected() {
    let device = MockDevice::with_code("rWU7G45S");
    let router = device.router();
    let nonce = fetch_nonce(&router, "/rpc/Slide.Stop").await;
    let auth = digest("00000000", "/rpc/Slide.Stop", &nonce, "c1");
    let resp = router
        .clone()
        .oneshot(rpc_with_auth("/rpc/Slide.Stop", "{}", &auth))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn digest_for_another_path_is_rejected() {
    let device = MockDevice::with_code("rWU7G45S");
    let router = device.router();
    let nonce = fetch_nonce(&router, "/rpc/Slide.Stop").await;
    let auth = digest("rWU7G45S", "/rpc/Slide.Stop", &nonce, "c1");
    let resp = router
        .clone()
        .oneshot(rpc_with_auth("/rpc/Slide.Calibrate", "{}", &auth))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(device.calibrations(), 0);
}
