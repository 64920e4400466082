//! 请求路由状态

use preflight_core::Request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriState {
    path: String,
    query: Option<String>,
}

impl Default for UriState {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            query: None,
        }
    }
}

impl UriState {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let path = if path.is_empty() { "/" } else { path };
        Self {
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    pub fn from_request(request: &Request) -> Self {
        Self::new(request.uri().path(), request.uri().query())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    pub fn has_trailing_slash(&self) -> bool {
        !self.is_root() && self.path.ends_with('/')
    }

    /// 去掉末尾斜杠的路由，保留查询串
    pub fn canonical_route(&self) -> String {
        let trimmed = self.path.trim_end_matches('/');
        let route = if trimmed.is_empty() { "/" } else { trimmed };
        match &self.query {
            Some(query) => format!("{}?{}", route, query),
            None => route.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_core::Body;
    use proptest::prelude::*;

    #[test]
    fn test_from_request() {
        let mut request = Request::new(Body::empty());
        *request.uri_mut() = "/blog/?page=2".parse().unwrap();

        let uri = UriState::from_request(&request);
        assert_eq!(uri.path(), "/blog/");
        assert_eq!(uri.query(), Some("page=2"));
        assert!(uri.has_trailing_slash());
        assert_eq!(uri.canonical_route(), "/blog?page=2");
    }

    #[test]
    fn test_root_has_no_trailing_slash() {
        let uri = UriState::new("/", None);
        assert!(uri.is_root());
        assert!(!uri.has_trailing_slash());
        assert_eq!(uri.canonical_route(), "/");
    }

    #[test]
    fn test_multiple_trailing_slashes() {
        assert_eq!(UriState::new("/foo//", None).canonical_route(), "/foo");
        assert_eq!(UriState::new("//", None).canonical_route(), "/");
    }

    proptest! {
        #[test]
        fn prop_canonical_route_has_no_trailing_slash(
            segments in prop::collection::vec("[a-z0-9-]{1,8}", 1..5),
            slashes in 0usize..3,
        ) {
            let path = format!("/{}{}", segments.join("/"), "/".repeat(slashes));
            let uri = UriState::new(&path, None);
            let route = uri.canonical_route();

            prop_assert!(!route.ends_with('/'));
            prop_assert_eq!(uri.has_trailing_slash(), slashes > 0);
            // 规范化是幂等的
            prop_assert_eq!(UriState::new(&route, None).canonical_route(), route.clone());
        }
    }
}
