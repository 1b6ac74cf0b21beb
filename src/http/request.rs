//! Request and response values passed through the session client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// An outgoing API call. Immutable once built; replays are rebuilt from it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// A successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::patch("/widget/3")
            .with_query("lang", "en")
            .with_json(json!({"name": "Bay 3"}))
            .with_header(
                HeaderName::from_static("x-wash-id"),
                HeaderValue::from_static("12"),
            );

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.path(), "/widget/3");
        assert_eq!(request.query(), &[("lang".to_string(), "en".to_string())]);
        assert_eq!(request.body(), Some(&json!({"name": "Bay 3"})));
        assert_eq!(request.headers()["x-wash-id"], "12");
    }

    #[test]
    fn test_method_shortcuts() {
        assert_eq!(ApiRequest::get("/a").method(), &Method::GET);
        assert_eq!(ApiRequest::post("/a").method(), &Method::POST);
        assert_eq!(ApiRequest::put("/a").method(), &Method::PUT);
        assert_eq!(ApiRequest::delete("/a").method(), &Method::DELETE);
    }

    #[test]
    fn test_response_json_and_text() {
        let response = ApiResponse::new(
            StatusCode::CREATED,
            HeaderMap::new(),
            br#"{"id": 7}"#.to_vec(),
        );

        #[derive(serde::Deserialize)]
        struct Created {
            id: u32,
        }

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.text(), r#"{"id": 7}"#);
        assert_eq!(response.json::<Created>().unwrap().id, 7);
    }
}
