//! Edge case tests for lazyimg-net
//!
//! Request building, response handling and the in-memory fetcher.

use lazyimg_net::*;

// ============================================================================
// REQUEST BUILDER TESTS
// ============================================================================

#[test]
fn test_request_get() {
    let req = Request::get("https://img.example.com/fl_getinfo/cat");
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.url, "https://img.example.com/fl_getinfo/cat");
    assert!(req.headers.is_empty());
}

#[test]
fn test_request_header_overwrite() {
    let req = Request::get("https://img.example.com/")
        .with_header("Accept", "image/*")
        .with_header("Accept", "image/avif");
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.headers.len(), 1);
    assert_eq!(req.headers.get("Accept").unwrap(), "image/avif");
}

// ============================================================================
// RESPONSE TESTS
// ============================================================================

#[test]
fn test_response_text() {
    let response = FetchResponse::from(Response {
        status: 200,
        headers: Vec::new(),
        body: b"hello".to_vec(),
    });
    assert_eq!(response.text().unwrap(), "hello");
    assert_eq!(response.bytes(), b"hello");
}

#[test]
fn test_response_invalid_utf8() {
    let response = FetchResponse::from(Response {
        status: 200,
        headers: Vec::new(),
        body: vec![0xFF, 0xD8, 0xFF],
    });
    assert!(matches!(response.text(), Err(NetError::Decode(_))));
}

#[test]
fn test_redirect_status_is_not_ok() {
    let response = FetchResponse::from(Response { status: 301, ..Default::default() });
    assert!(!response.ok());
}

#[test]
fn test_error_display() {
    assert_eq!(NetError::HttpError { status: 404 }.to_string(), "HTTP error: 404");
    assert_eq!(NetError::InvalidUrl("x".into()).to_string(), "Invalid URL: x");
}

// ============================================================================
// MEMORY FETCHER TESTS
// ============================================================================

#[derive(serde::Deserialize)]
struct Info {
    input: Size,
}

#[derive(serde::Deserialize)]
struct Size {
    width: u32,
    height: u32,
}

#[test]
fn test_memory_fetcher_json_route() {
    let fetcher = MemoryFetcher::new().with_json(
        "https://img.example.com/fl_getinfo/cat",
        r#"{"input":{"width":1600,"height":900}}"#,
    );

    let info: Info = smol::block_on(fetcher.get("https://img.example.com/fl_getinfo/cat"))
        .unwrap()
        .json()
        .unwrap();
    assert_eq!((info.input.width, info.input.height), (1600, 900));
}

#[test]
fn test_memory_fetcher_counts_matching() {
    let fetcher = MemoryFetcher::new();
    smol::block_on(async {
        let _ = fetcher.get("https://img.example.com/w_400/cat").await;
        let _ = fetcher.get("https://img.example.com/w_800/cat").await;
        let _ = fetcher.get("https://img.example.com/fl_getinfo/cat").await;
    });
    assert_eq!(fetcher.count_matching("/w_"), 2);
    assert_eq!(fetcher.requests().len(), 3);
}
