//! Scripted transport for tests and offline tooling.

use std::sync::Mutex;

use super::{ApiRequest, ApiResponse, ApiResult, Method, Transport};

struct Route {
    method: Method,
    path: String,
    /// Only match when the serialized body contains this text
    body_contains: Option<String>,
    response: ApiResponse,
}

/// Transport that answers from a fixed route table and records every request.
///
/// Routes are checked in registration order; the first match wins. Unmatched
/// requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a JSON body.
    pub fn on(self, method: Method, path: &str, status: u16, body: serde_json::Value) -> Self {
        self.on_raw(method, path, status, &body.to_string())
    }

    /// Answer `method path` with a raw body.
    pub fn on_raw(mut self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            body_contains: None,
            response: ApiResponse {
                status,
                body: body.to_string(),
            },
        });
        self
    }

    /// Answer `method path` only when the request body contains `needle`.
    pub fn on_body(
        mut self,
        method: Method,
        path: &str,
        needle: &str,
        status: u16,
        body: serde_json::Value,
    ) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            body_contains: Some(needle.to_string()),
            response: ApiResponse {
                status,
                body: body.to_string(),
            },
        });
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Requests received for `method path`.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        let body_text = request
            .body
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_default();

        let response = self
            .routes
            .iter()
            .find(|route| {
                route.method == request.method
                    && route.path == request.path
                    && route
                        .body_contains
                        .as_ref()
                        .map_or(true, |needle| body_text.contains(needle.as_str()))
            })
            .map(|route| route.response.clone())
            .unwrap_or_else(|| ApiResponse {
                status: 404,
                body: r#"{"message":"no mock route"}"#.to_string(),
            });

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(path: &str) -> ApiRequest {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    #[test]
    fn mock_returns_configured_response() {
        let mock = MockTransport::new().on(Method::Get, "/patients", 200, json!([]));
        let response = mock.send(&get("/patients")).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "[]");
    }

    #[test]
    fn mock_unmatched_is_404() {
        let mock = MockTransport::new();
        assert_eq!(mock.send(&get("/nowhere")).unwrap().status, 404);
    }

    #[test]
    fn mock_body_matching_precedes_fallback() {
        let mock = MockTransport::new()
            .on_body(Method::Post, "/medications", "Ibuprofen", 500, json!({}))
            .on(Method::Post, "/medications", 201, json!({}));

        let mut request = get("/medications");
        request.method = Method::Post;
        request.body = Some(json!({ "name": "Ibuprofen" }));
        assert_eq!(mock.send(&request).unwrap().status, 500);

        request.body = Some(json!({ "name": "Paracetamol" }));
        assert_eq!(mock.send(&request).unwrap().status, 201);
        assert_eq!(mock.requests_to(Method::Post, "/medications").len(), 2);
    }
}
