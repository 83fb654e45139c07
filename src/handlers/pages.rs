// handlers/pages.rs - HTML shells for the portal pages
//
// The presentation layer renders the dashboards from the JSON API. These
// handlers only exist so the page guard has something to protect and the
// sign-in redirect has somewhere to land.

use axum::{extract::Query, response::Html};
use serde::Deserialize;

use crate::auth::Session;
use crate::middleware::CurrentSession;

fn shell(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    ))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn dashboard_shell(title: &str, session: &Session, api_path: &str) -> Html<String> {
    let body = format!(
        "<main id=\"portal\" data-api=\"{}\" data-role=\"{}\">\n<h1>{}</h1>\n<p>Signed in as {}</p>\n</main>",
        api_path,
        session.role,
        escape(title),
        escape(&session.name)
    );
    shell(title, &body)
}

/// GET /dashboard/parent
pub async fn parent_dashboard_page(CurrentSession(session): CurrentSession) -> Html<String> {
    dashboard_shell("Parent Dashboard", &session, "/api/parent/dashboard")
}

/// GET /dashboard/student
pub async fn student_dashboard_page(CurrentSession(session): CurrentSession) -> Html<String> {
    dashboard_shell("Student Dashboard", &session, "/api/student/dashboard")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    pub callback_url: Option<String>,
}

/// GET /auth/signin - redirect target for the page guard
pub async fn signin_page(Query(query): Query<SignInQuery>) -> Html<String> {
    // Only same-site paths are accepted as a post sign-in destination
    let callback = query
        .callback_url
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| "/".to_string());

    let body = format!(
        "<main id=\"signin\" data-api=\"/api/auth/signin\" data-callback=\"{}\">\n<h1>Sign in</h1>\n</main>",
        escape(&callback)
    );
    shell("Sign in", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signin_page_rejects_offsite_callbacks() {
        let Html(page) = signin_page(Query(SignInQuery {
            callback_url: Some("//evil.example/steal".to_string()),
        }))
        .await;
        assert!(page.contains("data-callback=\"/\""));

        let Html(page) = signin_page(Query(SignInQuery {
            callback_url: Some("/dashboard/parent".to_string()),
        }))
        .await;
        assert!(page.contains("data-callback=\"/dashboard/parent\""));
    }

    #[test]
    fn names_are_escaped() {
        assert_eq!(escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
    }
}
