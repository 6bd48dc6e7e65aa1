//! Container registry redirects.
//!
//! # Responsibilities
//! - Answer the registry API version probe (`/v2/`)
//! - Redirect image requests to the registry named in the record
//! - Rewrite the image name when the record points at a repository
//! - Send requests outside the registry API to the record target as is
//!
//! `to=https://registry.example.com/team/app` sends
//! `/v2/app/manifests/latest` to
//! `https://registry.example.com/v2/team/app/manifests/latest`.

use axum::body::Body;
use axum::http::{header, HeaderName, Request, StatusCode};
use axum::response::Response;
use thiserror::Error;
use url::Url;

use crate::record::Record;
use crate::redirect::response;

/// User agent marker sent by container clients.
pub const DOCKER_CLIENT: &str = "Docker-Client";

const API_VERSION_HEADER: HeaderName = HeaderName::from_static("docker-distribution-api-version");
const API_VERSION: &str = "registry/2.0";
const API_ROOT: &str = "/v2/";

/// Endpoints that follow the image name in a registry path.
const ENDPOINTS: [&str; 3] = ["/manifests/", "/blobs/", "/tags/"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid registry target `{target}`: {source}")]
    Target {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("`{0}` does not name an image endpoint")]
    Path(String),

    #[error(transparent)]
    Response(#[from] crate::error::Error),
}

/// True when the request comes from a container client.
pub fn is_container_client<B>(request: &Request<B>) -> bool {
    request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .is_some_and(|ua| ua.contains(DOCKER_CLIENT))
}

/// Answer a registry request for `record`.
pub fn redirect_registry<B>(request: &Request<B>, record: &Record) -> Result<Response, RegistryError> {
    let path = request.uri().path();
    if path == API_ROOT || path == "/v2" {
        return Response::builder()
            .status(StatusCode::OK)
            .header(API_VERSION_HEADER, API_VERSION)
            .body(Body::empty())
            .map_err(|e| RegistryError::Response(e.into()));
    }

    let target = Url::parse(&record.to).map_err(|source| RegistryError::Target {
        target: record.to.clone(),
        source,
    })?;
    let location = registry_location(&target, path)?;

    tracing::info!(
        path = %path,
        target = %location,
        "Redirecting container client"
    );
    Ok(response::redirect(request.method(), location.as_str(), record.code)?)
}

fn registry_location(target: &Url, path: &str) -> Result<Url, RegistryError> {
    let Some(rest) = path.strip_prefix(API_ROOT) else {
        return Ok(target.clone());
    };

    let image = target.path().trim_matches('/');
    let rewritten = if image.is_empty() {
        format!("{API_ROOT}{rest}")
    } else {
        let endpoint = ENDPOINTS
            .iter()
            .filter_map(|e| rest.find(e))
            .min()
            .ok_or_else(|| RegistryError::Path(path.to_string()))?;
        format!("{API_ROOT}{image}{}", &rest[endpoint..])
    };

    let mut location = target.clone();
    location.set_path(&rewritten);
    location.set_query(None);
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(to: &str) -> Record {
        Record {
            to: to.into(),
            record_type: crate::record::RecordType::ContainerRegistry,
            ..Default::default()
        }
    }

    fn request(path: &str, user_agent: &str) -> Request<()> {
        Request::builder()
            .uri(path)
            .header("user-agent", user_agent)
            .body(())
            .unwrap()
    }

    #[test]
    fn test_container_client_detection() {
        assert!(is_container_client(&request("/", "docker/20.10 Docker-Client/20.10 (linux)")));
        assert!(!is_container_client(&request("/", "curl/8.0")));
    }

    #[test]
    fn test_api_probe() {
        let response =
            redirect_registry(&request("/v2/", DOCKER_CLIENT), &record("https://gcr.io")).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["docker-distribution-api-version"], "registry/2.0");
    }

    #[test]
    fn test_redirect_keeps_image_without_target_path() {
        let response = redirect_registry(
            &request("/v2/app/manifests/latest", DOCKER_CLIENT),
            &record("https://registry.example.com"),
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://registry.example.com/v2/app/manifests/latest"
        );
    }

    #[test]
    fn test_redirect_rewrites_image() {
        let response = redirect_registry(
            &request("/v2/app/blobs/sha256:abc", DOCKER_CLIENT),
            &record("https://registry.example.com/team/app"),
        )
        .unwrap();
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://registry.example.com/v2/team/app/blobs/sha256:abc"
        );
    }

    #[test]
    fn test_non_registry_path_goes_to_target() {
        let response = redirect_registry(
            &request("/correct", DOCKER_CLIENT),
            &record("https://gcr.io/"),
        )
        .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "https://gcr.io/");
    }

    #[test]
    fn test_rewrite_needs_endpoint() {
        let result = redirect_registry(
            &request("/v2/app", DOCKER_CLIENT),
            &record("https://registry.example.com/team/app"),
        );
        assert!(matches!(result, Err(RegistryError::Path(_))));
    }

    #[test]
    fn test_invalid_target_fails() {
        let result = redirect_registry(&request("/v2/app/tags/list", DOCKER_CLIENT), &record("::"));
        assert!(matches!(result, Err(RegistryError::Target { .. })));
    }
}
