//! Authorization endpoint handlers.
//!
//! `GET /authorize` renders the credentials form with every OAuth
//! parameter carried as a hidden field; `POST /authorize` checks the
//! patient number against the date of birth and redirects back to the
//! client with a freshly bound authorization code.

use crate::error::IamError;
use crate::models::{AuthorizeForm, AuthorizeQuery};
use crate::router::IamState;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

/// Render the credentials form.
pub async fn authorize_page_handler(
    State(state): State<IamState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Html<String>, IamError> {
    state
        .authorization_service
        .validate_authorization_request(&query)?;
    Ok(Html(render_login_page(&query, None)))
}

/// Process the submitted credentials.
///
/// On a match the stored redirect URI receives `code` and the echoed
/// `state`; on a mismatch the form re-renders with an error so the
/// response never leaks whether the patient number or the date of birth
/// was wrong.
pub async fn authorize_submit_handler(
    State(state): State<IamState>,
    Form(form): Form<AuthorizeForm>,
) -> Result<Response, IamError> {
    let query = form.as_query();
    state
        .authorization_service
        .validate_authorization_request(&query)?;

    let patient = state
        .patients
        .get(form.patient_id.trim())?
        .filter(|p| p.date_of_birth == form.birth_date.trim());

    let Some(patient) = patient else {
        tracing::info!("Authorization attempt with mismatched credentials");
        return Ok(Html(render_login_page(
            &query,
            Some("Patientennummer oder Geburtsdatum unbekannt."),
        ))
        .into_response());
    };

    let code = state
        .authorization_service
        .issue_code(patient.id.as_str(), &query)?;

    let location = format!(
        "{}?code={}&state={}",
        query.redirect_uri,
        urlencoding::encode(&code),
        urlencoding::encode(&query.state),
    );
    Ok(Redirect::to(&location).into_response())
}

/// Render the minimal login page. All OAuth parameters travel as hidden
/// fields so the POST carries the full request tuple.
fn render_login_page(query: &AuthorizeQuery, error: Option<&str>) -> String {
    let error_html = match error {
        Some(msg) => format!(r#"<div class="error">{}</div>"#, html_escape(msg)),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
    <meta charset="utf-8">
    <title>Anmeldung</title>
    <style>
        body {{ font-family: sans-serif; max-width: 26rem; margin: 4rem auto; }}
        label {{ display: block; margin-top: 1rem; }}
        input {{ width: 100%; padding: 0.4rem; }}
        button {{ margin-top: 1.5rem; padding: 0.5rem 1.5rem; }}
        .error {{ color: #b00020; margin-bottom: 1rem; }}
    </style>
</head>
<body>
    <h1>Anmeldung</h1>
    {error_html}
    <form method="post" action="/authorize">
        <input type="hidden" name="response_type" value="{response_type}">
        <input type="hidden" name="client_id" value="{client_id}">
        <input type="hidden" name="redirect_uri" value="{redirect_uri}">
        <input type="hidden" name="scope" value="{scope}">
        <input type="hidden" name="state" value="{state}">
        <input type="hidden" name="code_challenge" value="{code_challenge}">
        <input type="hidden" name="code_challenge_method" value="{code_challenge_method}">
        <label for="patient_id">Patientennummer</label>
        <input type="text" id="patient_id" name="patient_id" required>
        <label for="birth_date">Geburtsdatum (JJJJ-MM-TT)</label>
        <input type="text" id="birth_date" name="birth_date" placeholder="1990-01-15" required>
        <button type="submit">Anmelden</button>
    </form>
</body>
</html>
"#,
        response_type = html_escape(&query.response_type),
        client_id = html_escape(&query.client_id),
        redirect_uri = html_escape(&query.redirect_uri),
        scope = html_escape(&query.scope),
        state = html_escape(&query.state),
        code_challenge = html_escape(&query.code_challenge),
        code_challenge_method = html_escape(&query.code_challenge_method),
    )
}

/// Escape text for HTML attribute and body contexts.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> AuthorizeQuery {
        AuthorizeQuery {
            response_type: "code".into(),
            client_id: "mobile-app".into(),
            redirect_uri: "app://callback".into(),
            scope: "openid".into(),
            state: "xyz".into(),
            code_challenge: "challenge".into(),
            code_challenge_method: "S256".into(),
        }
    }

    #[test]
    fn form_carries_all_oauth_parameters_hidden() {
        let html = render_login_page(&query(), None);
        for name in [
            "response_type",
            "client_id",
            "redirect_uri",
            "scope",
            "state",
            "code_challenge",
            "code_challenge_method",
        ] {
            assert!(
                html.contains(&format!(r#"name="{name}""#)),
                "missing hidden field {name}"
            );
        }
        assert!(html.contains(r#"name="patient_id""#));
        assert!(html.contains(r#"name="birth_date""#));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn error_message_renders_escaped() {
        let html = render_login_page(&query(), Some("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut q = query();
        q.state = r#""><script>x</script>"#.into();
        let html = render_login_page(&q, None);
        assert!(!html.contains("<script>x"));
    }
}
