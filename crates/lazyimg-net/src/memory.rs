//! In-Memory Fetcher
//!
//! Serves canned responses by exact URL and records every request in order.
//! Used for offline runs and tests.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::{FetchResponse, Fetcher, NetError, Request, Response};

#[derive(Debug, Clone)]
enum Route {
    Respond(Response),
    Fail(NetError),
}

/// Fetcher answering from a route table
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, Route>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200
    pub fn with_body(self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.with_response(
            url,
            Response {
                status: 200,
                headers: vec![("Content-Type".into(), content_type.into())],
                body: body.into(),
            },
        )
    }

    /// Serve a JSON document with status 200
    pub fn with_json(self, url: &str, json: &str) -> Self {
        self.with_body(url, "application/json", json.as_bytes().to_vec())
    }

    /// Serve an empty body with the given status
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, Response { status, ..Default::default() })
    }

    pub fn with_response(mut self, url: &str, response: Response) -> Self {
        self.routes.insert(url.to_string(), Route::Respond(response));
        self
    }

    /// Fail requests to `url` at the transport level
    pub fn with_error(mut self, url: &str, error: NetError) -> Self {
        self.routes.insert(url.to_string(), Route::Fail(error));
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// How many times `url` was requested
    pub fn count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }

    /// Requests whose URL contains `needle`
    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests.borrow().iter().filter(|u| u.contains(needle)).count()
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch(&self, request: Request) -> Result<FetchResponse, NetError> {
        self.requests.borrow_mut().push(request.url.clone());
        match self.routes.get(&request.url) {
            Some(Route::Respond(response)) => Ok(FetchResponse::from(response.clone())),
            Some(Route::Fail(error)) => Err(error.clone()),
            None => Ok(FetchResponse::from(Response {
                status: 404,
                ..Default::default()
            })),
        }
    }
}
