//! `go-import` metadata pages.
//!
//! `go get example.com/pkg` fetches `https://example.com/pkg?go-get=1` and
//! reads the `go-import` meta tag to find the repository.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;

use crate::error::Error;
use crate::record::{GrammarError, Record, RecordType};
use crate::redirect::response::escape_html;

/// Version control system assumed when the record names none.
pub const DEFAULT_VCS: &str = "git";

/// Render the metadata page for `import_path`.
pub fn render(record: &Record, import_path: &str) -> Result<Response, Error> {
    if record.to.is_empty() {
        return Err(GrammarError::MissingTarget(RecordType::ModuleMetadata).into());
    }
    let vcs = if record.vcs.is_empty() {
        DEFAULT_VCS
    } else {
        record.vcs.as_str()
    };

    let import = escape_html(import_path);
    let repo = escape_html(&record.to);
    let mut head = format!(
        "<meta name=\"go-import\" content=\"{import} {vcs} {repo}\">\n",
        vcs = escape_html(vcs)
    );
    let link = if record.website.is_empty() {
        repo.clone()
    } else {
        let website = escape_html(&record.website);
        head.push_str(&format!(
            "<meta name=\"go-source\" content=\"{import} {website} {website}/tree/master{{/dir}} {website}/blob/master{{/dir}}/{{file}}#L{{line}}\">\n"
        ));
        head.push_str(&format!(
            "<meta http-equiv=\"refresh\" content=\"0; url={website}\">\n"
        ));
        website
    };

    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n{head}</head>\n<body>\nNothing to see here; <a href=\"{link}\">move along</a>.\n</body>\n</html>\n"
    );

    tracing::debug!(import_path = %import_path, repo = %record.to, "Rendering module metadata");
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(html))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_render_defaults_to_git() {
        let record = Record {
            to: "https://github.com/example/pkg".into(),
            record_type: RecordType::ModuleMetadata,
            ..Default::default()
        };
        let response = render(&record, "example.com/pkg").unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body(response).await;
        assert!(html.contains(
            "<meta name=\"go-import\" content=\"example.com/pkg git https://github.com/example/pkg\">"
        ));
        assert!(!html.contains("go-source"));
        assert!(html.contains("<a href=\"https://github.com/example/pkg\">"));
    }

    #[tokio::test]
    async fn test_render_with_website() {
        let record = Record {
            to: "https://hg.example.org/pkg".into(),
            vcs: "hg".into(),
            website: "https://docs.example.org".into(),
            record_type: RecordType::ModuleMetadata,
            ..Default::default()
        };
        let html = body(render(&record, "example.com").unwrap()).await;
        assert!(html.contains("content=\"example.com hg https://hg.example.org/pkg\""));
        assert!(html.contains("<meta name=\"go-source\" content=\"example.com https://docs.example.org "));
        assert!(html.contains("url=https://docs.example.org"));
    }

    #[test]
    fn test_missing_target() {
        let record = Record {
            record_type: RecordType::ModuleMetadata,
            ..Default::default()
        };
        assert!(matches!(
            render(&record, "example.com"),
            Err(Error::Grammar(GrammarError::MissingTarget(_)))
        ));
    }
}
