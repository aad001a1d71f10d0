use url::Url;

use crate::error::GopherError;

/// Port used when a gopher URL carries no explicit one.
pub const DEFAULT_PORT: u16 = 70;

/// A gopher URL resolved into a connection target and a raw path.
///
/// Resolution is purely syntactic; no name lookup or reachability check
/// happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopherUrl {
    pub host: String,
    pub port: u16,
    /// Raw URL path, empty when the URL has none. The wire selector is
    /// derived from it via [`normalize_selector`].
    pub path: String,
}

impl GopherUrl {
    pub fn resolve(input: &str) -> Result<Self, GopherError> {
        let parsed = Url::parse(input)?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(GopherError::Url(url::ParseError::EmptyHost))?
            .to_string();
        let port = parsed.port().unwrap_or(DEFAULT_PORT);

        Ok(GopherUrl {
            host,
            port,
            path: parsed.path().to_string(),
        })
    }

    /// The selector actually sent on the wire.
    pub fn selector(&self) -> &str {
        normalize_selector(&self.path)
    }
}

/// Strips the gopher item-type segment from a URL path.
///
/// Menu links encode the item type as a one-character leading path segment
/// (`/1/foo/bar`); it is not part of the request, so exactly one such prefix
/// is removed. Anything else, including longer first segments, passes through
/// verbatim. An empty path is the root selector.
pub fn normalize_selector(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphanumeric() && bytes[2] == b'/'
    {
        &path[3..]
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_applied_when_absent() {
        let url = GopherUrl::resolve("gopher://example.com/1/foo").unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, DEFAULT_PORT);
    }

    #[test]
    fn explicit_port_preserved() {
        let url = GopherUrl::resolve("gopher://example.com:7070/").unwrap();
        assert_eq!(url.port, 7070);
    }

    #[test]
    fn url_without_path_has_empty_selector() {
        let url = GopherUrl::resolve("gopher://example.com").unwrap();
        assert_eq!(url.path, "");
        assert_eq!(url.selector(), "");
    }

    #[test]
    fn missing_host_is_malformed() {
        assert!(matches!(
            GopherUrl::resolve("gopher:just-a-path"),
            Err(GopherError::Url(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            GopherUrl::resolve("not a url at all"),
            Err(GopherError::Url(_))
        ));
    }

    #[test]
    fn type_segment_stripped() {
        assert_eq!(normalize_selector("/1/foo/bar"), "foo/bar");
        assert_eq!(normalize_selector("/h/2009/article"), "2009/article");
        assert_eq!(normalize_selector("/0/"), "");
    }

    #[test]
    fn longer_first_segment_untouched() {
        assert_eq!(normalize_selector("/foo/bar"), "/foo/bar");
        assert_eq!(normalize_selector("/12/x"), "/12/x");
    }

    #[test]
    fn empty_and_bare_paths_untouched() {
        assert_eq!(normalize_selector(""), "");
        assert_eq!(normalize_selector("/"), "/");
        assert_eq!(normalize_selector("/1"), "/1");
    }

    #[test]
    fn only_one_prefix_stripped() {
        assert_eq!(normalize_selector("/1/1/article1"), "1/article1");
    }
}
