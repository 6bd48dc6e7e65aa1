//! Request placeholder substitution.
//!
//! Record values may embed `{...}` tokens that are filled in from the
//! request being served:
//!
//! | token          | value                                  |
//! |----------------|----------------------------------------|
//! | `{method}`     | HTTP method                            |
//! | `{?name}`      | query parameter `name` (empty if unset)|
//! | `{host}`       | request host without port              |
//! | `{labelN}`     | N-th label of the host, 1-based        |
//! | `{path}`       | URL path                               |
//! | `{query}`      | raw query string                       |
//! | `{uri}`        | path and query                         |
//! | `{>Header}`    | request header value                   |
//! | `{~cookie}`    | cookie value                           |

use axum::http::{header, Request};
use thiserror::Error;
use url::form_urlencoded;

use crate::http::request::{request_host, strip_port};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("unknown placeholder {{{0}}}")]
    Unknown(String),

    #[error("unterminated placeholder in `{0}`")]
    Unterminated(String),
}

/// Returns true if the value may still hold placeholder tokens.
pub fn has_placeholders(value: &str) -> bool {
    value.contains(['{', '}'])
}

/// Replace every `{...}` token in `value` with its request value.
pub fn substitute<B>(value: &str, request: &Request<B>) -> Result<String, PlaceholderError> {
    if !value.contains('{') {
        return Ok(value.to_string());
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| PlaceholderError::Unterminated(value.to_string()))?;
        out.push_str(&resolve(&after[..end], request)?);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

fn resolve<B>(token: &str, request: &Request<B>) -> Result<String, PlaceholderError> {
    if let Some(name) = token.strip_prefix('?') {
        return Ok(query_param(request, name).unwrap_or_default());
    }
    if let Some(name) = token.strip_prefix('>') {
        return Ok(request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string());
    }
    if let Some(name) = token.strip_prefix('~') {
        return Ok(cookie(request, name).unwrap_or_default());
    }
    if let Some(index) = token.strip_prefix("label") {
        let index: usize = index
            .parse()
            .map_err(|_| PlaceholderError::Unknown(token.to_string()))?;
        let host = request_host(request);
        return Ok(index
            .checked_sub(1)
            .and_then(|i| strip_port(&host).split('.').nth(i))
            .unwrap_or_default()
            .to_string());
    }

    match token {
        "method" => Ok(request.method().to_string()),
        "host" => Ok(strip_port(&request_host(request)).to_string()),
        "path" => Ok(request.uri().path().to_string()),
        "query" => Ok(request.uri().query().unwrap_or_default().to_string()),
        "uri" => Ok(request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string())),
        _ => Err(PlaceholderError::Unknown(token.to_string())),
    }
}

fn query_param<B>(request: &Request<B>, name: &str) -> Option<String> {
    let query = request.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn cookie<B>(request: &Request<B>, name: &str) -> Option<String> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request<()> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("host", "docs.example.com:8443")
            .header("x-team", "infra")
            .header("cookie", "lang=de; theme=dark")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_no_tokens_is_identity() {
        let req = request("/");
        for value in ["https://example.com/a?b=c", "", "plain}text"] {
            assert_eq!(substitute(value, &req).unwrap(), value);
        }
    }

    #[test]
    fn test_query_and_method() {
        let req = request("/x?url=https%3A%2F%2Fexample.com%2Ftesting");
        assert_eq!(substitute("{?url}", &req).unwrap(), "https://example.com/testing");
        assert_eq!(substitute("{method}", &req).unwrap(), "POST");
        assert_eq!(substitute("{?missing}", &req).unwrap(), "");
    }

    #[test]
    fn test_request_attributes() {
        let req = request("/guide/intro?v=2");
        assert_eq!(
            substitute("https://{label1}.example.org{uri}", &req).unwrap(),
            "https://docs.example.org/guide/intro?v=2"
        );
        assert_eq!(substitute("{host}|{path}|{query}", &req).unwrap(), "docs.example.com|/guide/intro|v=2");
        assert_eq!(substitute("{>X-Team}/{~theme}", &req).unwrap(), "infra/dark");
        assert_eq!(substitute("{label9}", &req).unwrap(), "");
    }

    #[test]
    fn test_unknown_token() {
        let req = request("/");
        assert_eq!(
            substitute("https://{nope}.example", &req),
            Err(PlaceholderError::Unknown("nope".into()))
        );
        assert!(substitute("{labelx}", &req).is_err());
    }

    #[test]
    fn test_unterminated() {
        let req = request("/");
        assert!(matches!(
            substitute("https://{method", &req),
            Err(PlaceholderError::Unterminated(_))
        ));
    }
}
