//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The client
//! builds `HttpRequest` values and parses `HttpResponse` values without ever
//! touching the network; a `Transport` (or a test) performs the actual I/O
//! in between.

use std::fmt;

pub const APPLICATION_XML: &str = "application/xml";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL including any query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A bodiless request that asks for XML.
    pub fn new(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            headers: vec![("accept".to_string(), APPLICATION_XML.to_string())],
            body: None,
        }
    }

    /// Attach an XML body and the matching content type.
    pub fn with_xml_body(mut self, body: String) -> Self {
        self.headers
            .push(("content-type".to_string(), APPLICATION_XML.to_string()));
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body may be read as XML. A missing content type counts,
    /// since scripted and empty responses carry none.
    pub fn is_xml(&self) -> bool {
        self.header("content-type")
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("xml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodiless_request_only_accepts_xml() {
        let req = HttpRequest::new(HttpMethod::Get, "http://h/bands/1".to_string());
        assert_eq!(req.headers, vec![("accept".to_string(), "application/xml".to_string())]);
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn xml_body_sets_content_type() {
        let req = HttpRequest::new(HttpMethod::Post, "http://h/bands".to_string())
            .with_xml_body("<a/>".to_string());
        assert_eq!(req.header("Content-Type"), Some("application/xml"));
        assert_eq!(req.header("accept"), Some("application/xml"));
        assert_eq!(req.body.as_deref(), Some("<a/>"));
    }

    #[test]
    fn xml_detection_follows_content_type() {
        assert!(HttpResponse::new(200, "").is_xml());
        assert!(HttpResponse::new(200, "")
            .with_header("Content-Type", "application/xml;charset=UTF-8")
            .is_xml());
        assert!(HttpResponse::new(200, "").with_header("content-type", "text/xml").is_xml());
        let html = HttpResponse::new(502, "<html/>").with_header("Content-Type", "text/html");
        assert_eq!(html.header("CONTENT-TYPE"), Some("text/html"));
        assert!(!html.is_xml());
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }
}
