//! Request handlers for the journal routes.

use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::{debug, info};

use crate::entry::EntryDraft;
use crate::error::{Error, Result};

use super::session;
use super::templates::{EditPage, EntryPage, EntryView, IndexPage, LoginPage};
use super::AppState;

/// Form payload for creating or editing an entry.
///
/// Fields default to empty so missing inputs reach draft validation
/// instead of failing extraction.
#[derive(Debug, Deserialize)]
pub(super) struct EntryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Form payload for the login page.
#[derive(Debug, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Liveness probe.
pub(super) async fn health() -> &'static str {
    "OK"
}

/// `GET /` — entry listing, newest first, with the new-entry form for a
/// logged-in session.
pub(super) async fn index(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response> {
    let (jar, flash) = session::take_flash(jar);
    let logged_in = session::is_logged_in(&jar);

    let page = index_page(&state, logged_in, flash, None, String::new(), String::new()).await?;
    Ok((jar, Html(page.render()?)).into_response())
}

/// `POST /add` — create a new entry.
pub(super) async fn create_entry(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<EntryForm>,
) -> Result<Response> {
    if !session::is_logged_in(&jar) {
        return Ok(Redirect::to("/login").into_response());
    }

    match EntryDraft::new(&form.title, &form.body) {
        Ok(draft) => {
            let entry = state.storage.lock().await.insert(&draft)?;
            info!(id = entry.id, "entry created");
            let jar = session::set_flash(jar, "Entry saved");
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(Error::InvalidEntry { message }) => {
            debug!("rejected entry draft: {message}");
            let page =
                index_page(&state, true, None, Some(message), form.title, form.body).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page.render()?)).into_response())
        }
        Err(err) => Err(err),
    }
}

/// `GET /entry/{id}` — a single entry with its rendered body.
pub(super) async fn show_entry(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
) -> Result<Response> {
    let (jar, flash) = session::take_flash(jar);

    let entry = state
        .storage
        .lock()
        .await
        .get(id)?
        .ok_or(Error::EntryNotFound { id })?;

    let page = EntryPage {
        entry: EntryView::new(&entry, &state.renderer),
        logged_in: session::is_logged_in(&jar),
        flash,
    };
    Ok((jar, Html(page.render()?)).into_response())
}

/// `GET /edit/{id}` — edit form pre-filled with the entry's Markdown.
pub(super) async fn edit_form(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
) -> Result<Response> {
    if !session::is_logged_in(&jar) {
        return Ok(Redirect::to("/login").into_response());
    }

    let entry = state
        .storage
        .lock()
        .await
        .get(id)?
        .ok_or(Error::EntryNotFound { id })?;

    let page = EditPage {
        id: entry.id,
        draft_title: entry.title,
        draft_body: entry.body,
        logged_in: true,
        flash: None,
        form_error: None,
    };
    Ok(Html(page.render()?).into_response())
}

/// `POST /edit/{id}` — apply an edit, preserving id and creation time.
pub(super) async fn update_entry(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
    Form(form): Form<EntryForm>,
) -> Result<Response> {
    if !session::is_logged_in(&jar) {
        return Ok(Redirect::to("/login").into_response());
    }

    match EntryDraft::new(&form.title, &form.body) {
        Ok(draft) => {
            let updated = state.storage.lock().await.update(id, &draft)?;
            if !updated {
                return Err(Error::EntryNotFound { id });
            }
            info!(id, "entry updated");
            let jar = session::set_flash(jar, "Entry updated");
            Ok((jar, Redirect::to(&format!("/entry/{id}"))).into_response())
        }
        Err(Error::InvalidEntry { message }) => {
            debug!("rejected entry draft: {message}");
            let page = EditPage {
                id,
                draft_title: form.title,
                draft_body: form.body,
                logged_in: true,
                flash: None,
                form_error: Some(message),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page.render()?)).into_response())
        }
        Err(err) => Err(err),
    }
}

/// `GET /login` — the login form.
pub(super) async fn login_form(jar: SignedCookieJar) -> Result<Response> {
    if session::is_logged_in(&jar) {
        return Ok(Redirect::to("/").into_response());
    }

    let page = LoginPage {
        logged_in: false,
        flash: None,
        form_error: None,
    };
    Ok(Html(page.render()?).into_response())
}

/// `POST /login` — check credentials and establish the session.
pub(super) async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = &state.config.auth;
    if form.username == auth.username && form.password == auth.password {
        info!("login succeeded");
        let jar = session::log_in(jar);
        Ok((jar, Redirect::to("/")).into_response())
    } else {
        info!("login failed");
        let page = LoginPage {
            logged_in: false,
            flash: None,
            form_error: Some("Login Failed".to_string()),
        };
        Ok((StatusCode::UNAUTHORIZED, Html(page.render()?)).into_response())
    }
}

/// `GET /logout` — clear the session.
pub(super) async fn logout(jar: SignedCookieJar) -> Response {
    let jar = session::log_out(jar);
    (jar, Redirect::to("/")).into_response()
}

/// Build the front page model from current storage contents.
async fn index_page(
    state: &AppState,
    logged_in: bool,
    flash: Option<String>,
    form_error: Option<String>,
    draft_title: String,
    draft_body: String,
) -> Result<IndexPage> {
    let entries = state.storage.lock().await.all()?;
    let views = entries
        .iter()
        .map(|entry| EntryView::new(entry, &state.renderer))
        .collect();

    Ok(IndexPage {
        entries: views,
        logged_in,
        flash,
        form_error,
        draft_title,
        draft_body,
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::storage::Storage;
    use crate::web::{router, AppState};

    const SHARE_BTN: &str = r#"<input type="submit" value="Share" name="Share"/>"#;

    fn test_app() -> (Router, AppState) {
        let storage = Storage::open_in_memory().expect("in-memory storage");
        let state = AppState::new(Config::default(), storage);
        (router(state.clone()), state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get(app: &Router, uri: &str, cookies: Option<&str>) -> axum::response::Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(
        app: &Router,
        uri: &str,
        body: &str,
        cookies: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        app.clone()
            .oneshot(builder.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap()
    }

    /// Collect Set-Cookie values into a Cookie header string.
    fn cookies_from(response: &axum::response::Response) -> String {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn login_cookie(app: &Router) -> String {
        let response = post_form(app, "/login", "username=admin&password=admin", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        cookies_from(&response)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let response = get(&app, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let (app, _) = test_app();
        let response = get(&app, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("No entries here so far"));
    }

    #[tokio::test]
    async fn test_start_as_anonymous_hides_share_form() {
        let (app, _) = test_app();
        let body = body_string(get(&app, "/", None).await).await;
        assert!(!body.contains(SHARE_BTN));
    }

    #[tokio::test]
    async fn test_login_success_shows_share_form() {
        let (app, _) = test_app();
        let cookie = login_cookie(&app).await;

        let body = body_string(get(&app, "/", Some(&cookie)).await).await;
        assert!(body.contains(SHARE_BTN));
    }

    #[tokio::test]
    async fn test_login_fails_with_bad_password() {
        let (app, _) = test_app();
        let response = post_form(&app, "/login", "username=admin&password=wrong", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_string(response).await;
        assert!(body.contains("Login Failed"));
    }

    #[tokio::test]
    async fn test_login_fails_with_bad_username() {
        let (app, _) = test_app();
        let response = post_form(&app, "/login", "username=wronguser&password=admin", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_hides_share_form() {
        let (app, _) = test_app();
        let cookie = login_cookie(&app).await;

        let response = get(&app, "/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        // The logout response clears the session cookie.
        let cleared = cookies_from(&response);
        let body = body_string(get(&app, "/", Some(&cleared)).await).await;
        assert!(!body.contains(SHARE_BTN));
    }

    #[tokio::test]
    async fn test_add_entry_requires_login() {
        let (app, state) = test_app();
        let response = post_form(&app, "/add", "title=Hello&body=This+is+a+post", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
        assert_eq!(state.storage.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_entry_appears_in_listing() {
        let (app, _) = test_app();
        let cookie = login_cookie(&app).await;

        let response = post_form(
            &app,
            "/add",
            "title=Hello&body=This+is+a+post",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let body = body_string(get(&app, "/", Some(&cookie)).await).await;
        assert!(!body.contains("No entries here so far"));
        assert!(body.contains("Hello"));
        assert!(body.contains("This is a post"));
    }

    #[tokio::test]
    async fn test_add_entry_flash_shown_once() {
        let (app, _) = test_app();
        let session = login_cookie(&app).await;

        let response =
            post_form(&app, "/add", "title=Hi&body=text", Some(&session)).await;
        let flash = cookies_from(&response);
        let cookie = format!("{session}; {flash}");

        let body = body_string(get(&app, "/", Some(&cookie)).await).await;
        assert!(body.contains("Entry saved"));
    }

    #[tokio::test]
    async fn test_add_entry_rejects_missing_title() {
        let (app, state) = test_app();
        let cookie = login_cookie(&app).await;

        let response = post_form(&app, "/add", "title=&body=some+text", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_string(response).await;
        assert!(body.contains("title must not be empty"));
        // The submitted body is preserved in the re-rendered form.
        assert!(body.contains("some text"));
        assert_eq!(state.storage.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_newest_first() {
        let (app, state) = test_app();
        {
            let storage = state.storage.lock().await;
            for title in ["first", "second", "third"] {
                storage
                    .insert(&crate::entry::EntryDraft::new(title, "text").unwrap())
                    .unwrap();
            }
        }

        let body = body_string(get(&app, "/", None).await).await;
        let first = body.find("third").unwrap();
        let second = body.find("second").unwrap();
        let third = body.find("first").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_show_entry_renders_markdown() {
        let (app, state) = test_app();
        let entry = {
            let storage = state.storage.lock().await;
            storage
                .insert(
                    &crate::entry::EntryDraft::new(
                        "Code notes",
                        "Some **bold** prose.\n\n    let x = 1;\n",
                    )
                    .unwrap(),
                )
                .unwrap()
        };

        let response = get(&app, &format!("/entry/{}", entry.id), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("Code notes"));
        assert!(body.contains("<strong>bold</strong>"));
        assert!(body.contains("<pre"));
    }

    #[tokio::test]
    async fn test_show_entry_not_found() {
        let (app, _) = test_app();
        let response = get(&app, "/entry/999", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_form_requires_login() {
        let (app, state) = test_app();
        let entry = {
            let storage = state.storage.lock().await;
            storage
                .insert(&crate::entry::EntryDraft::new("t", "b").unwrap())
                .unwrap()
        };

        let response = get(&app, &format!("/edit/{}", entry.id), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
    }

    #[tokio::test]
    async fn test_edit_form_prefills_raw_markdown() {
        let (app, state) = test_app();
        let entry = {
            let storage = state.storage.lock().await;
            storage
                .insert(&crate::entry::EntryDraft::new("Title", "raw *markdown*").unwrap())
                .unwrap()
        };
        let cookie = login_cookie(&app).await;

        let body = body_string(get(&app, &format!("/edit/{}", entry.id), Some(&cookie)).await).await;
        assert!(body.contains("raw *markdown*"));
        assert!(!body.contains("<em>markdown</em>"));
    }

    #[tokio::test]
    async fn test_edit_preserves_id_and_created_at() {
        let (app, state) = test_app();
        let entry = {
            let storage = state.storage.lock().await;
            storage
                .insert(&crate::entry::EntryDraft::new("Before", "old").unwrap())
                .unwrap()
        };
        let cookie = login_cookie(&app).await;

        let response = post_form(
            &app,
            &format!("/edit/{}", entry.id),
            "title=After&body=new",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            format!("/entry/{}", entry.id).as_str()
        );

        let stored = state.storage.lock().await.get(entry.id).unwrap().unwrap();
        assert_eq!(stored.id, entry.id);
        assert_eq!(stored.created_at, entry.created_at);
        assert_eq!(stored.title, "After");
        assert_eq!(stored.body, "new");
    }

    #[tokio::test]
    async fn test_edit_unknown_entry_is_404() {
        let (app, _) = test_app();
        let cookie = login_cookie(&app).await;

        let response = post_form(&app, "/edit/999", "title=t&body=b", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_rejects_empty_body() {
        let (app, state) = test_app();
        let entry = {
            let storage = state.storage.lock().await;
            storage
                .insert(&crate::entry::EntryDraft::new("Keep", "original").unwrap())
                .unwrap()
        };
        let cookie = login_cookie(&app).await;

        let response = post_form(
            &app,
            &format!("/edit/{}", entry.id),
            "title=Keep&body=",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // The stored entry is untouched.
        let stored = state.storage.lock().await.get(entry.id).unwrap().unwrap();
        assert_eq!(stored.body, "original");
    }

    #[tokio::test]
    async fn test_login_form_redirects_when_logged_in() {
        let (app, _) = test_app();
        let cookie = login_cookie(&app).await;

        let response = get(&app, "/login", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_four_space_indent_highlighted_in_listing() {
        let (app, state) = test_app();
        {
            let storage = state.storage.lock().await;
            storage
                .insert(
                    &crate::entry::EntryDraft::new("Snippet", "intro\n\n    print('hi')\n")
                        .unwrap(),
                )
                .unwrap();
        }

        let body = body_string(get(&app, "/", None).await).await;
        assert!(body.contains("<pre"));
    }
}
