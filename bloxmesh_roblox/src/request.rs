use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{HeaderName, HeaderValue},
    HeaderMap, Method, Request as HyperRequest,
};

/// Builder for requests to Roblox. Kept around un-built so a request can be
/// replayed, e.g. with a fresh CSRF token attached.
#[derive(Clone, Default)]
pub struct Request {
    uri: Option<String>,
    method: Option<Method>,
    headers: HeaderMap,
    body: Option<Full<Bytes>>,

    proxy_uri: Option<String>,
}

impl Request {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: Full<Bytes>) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn proxy_uri(mut self, proxy_uri: Option<String>) -> Self {
        self.proxy_uri = proxy_uri;
        self
    }

    /// Builds the hyper request. When a proxy is set the original uri is
    /// passed to it as the `url` query parameter.
    ///
    /// # Errors
    ///
    /// Returns Err if the uri or a header is invalid.
    pub fn build(self) -> Result<HyperRequest<Full<Bytes>>, hyper::http::Error> {
        let original_uri = self.uri.unwrap_or_default();
        let final_uri = match self.proxy_uri {
            Some(proxy_uri) => format!("{proxy_uri}?url={original_uri}"),
            None => original_uri,
        };

        let mut builder = HyperRequest::builder()
            .uri(final_uri)
            .method(self.method.unwrap_or(Method::GET));
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
        }
        builder.body(self.body.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_carried_into_the_request() {
        let request = Request::new()
            .uri("https://groups.roblox.com/v1/groups/1/users/2")
            .method(Method::PATCH)
            .header(
                HeaderName::from_static("x-csrf-token"),
                HeaderValue::from_static("abc"),
            )
            .build()
            .unwrap();
        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(request.headers()["x-csrf-token"], "abc");
    }

    #[test]
    fn proxy_wraps_the_original_uri() {
        let request = Request::new()
            .uri("https://groups.roblox.com/v1/groups/1/roles")
            .proxy_uri(Some("http://proxy.local/fetch".into()))
            .build()
            .unwrap();
        assert_eq!(
            request.uri().to_string(),
            "http://proxy.local/fetch?url=https://groups.roblox.com/v1/groups/1/roles"
        );
        assert_eq!(request.method(), Method::GET);
    }
}
