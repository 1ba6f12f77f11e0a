//! Account pages: registration, login, logout, home, profile, and the
//! sensor monitor page.
//!
//! Sessions are opaque tokens in an `HttpOnly` cookie, resolved against
//! the sessions table on every request. Pages are minimal server-rendered
//! HTML; form errors travel back via a query parameter.

use crate::server::SharedState;
use crate::store::{NewUser, Profile, ProfileUpdate, StoreError, User};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

const SESSION_COOKIE: &str = "drivesense_session";

/// Optional flash message carried in the query string.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub notice: Option<String>,
}

/// Pull the session token out of the Cookie header.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolve the logged-in user, if any.
fn current_user(state: &SharedState, headers: &HeaderMap) -> Option<User> {
    let token = session_token(headers)?;
    match state.store.session_user(&token) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "session lookup failed");
            None
        }
    }
}

/// Redirect back to `path` with a flash message in the query string.
fn flash(path: &str, key: &str, message: &str) -> Redirect {
    // Messages are plain ASCII sentences; encoding spaces is enough.
    let encoded = message.replace(' ', "%20");
    Redirect::to(&format!("{path}?{key}={encoded}"))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Shared page chrome.
fn page(title: &str, query: &PageQuery, body: &str) -> Html<String> {
    let mut messages = String::new();
    if let Some(error) = &query.error {
        messages.push_str(&format!(
            "<p class=\"error\">{}</p>",
            escape_html(error)
        ));
    }
    if let Some(notice) = &query.notice {
        messages.push_str(&format!(
            "<p class=\"notice\">{}</p>",
            escape_html(notice)
        ));
    }

    Html(format!(
        "<!doctype html>\n<html><head><title>{title} - DriveSense</title></head>\n\
         <body><h1>{title}</h1>{messages}{body}</body></html>"
    ))
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// GET /register/
pub async fn register_page(Query(query): Query<PageQuery>) -> Html<String> {
    page(
        "Register",
        &query,
        "<form method=\"post\" action=\"/register/\">\
         <input name=\"first_name\" placeholder=\"First name\">\
         <input name=\"last_name\" placeholder=\"Last name\">\
         <input name=\"username\" placeholder=\"Username\" required>\
         <input name=\"email\" type=\"email\" placeholder=\"Email\" required>\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\
         <input name=\"confirm_password\" type=\"password\" placeholder=\"Confirm password\" required>\
         <button type=\"submit\">Create account</button></form>\
         <p><a href=\"/login/\">Already registered? Login</a></p>",
    )
}

/// POST /register/
pub async fn register_submit(
    State(state): State<SharedState>,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    let new_user = NewUser {
        username: form.username,
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match state.store.register(&new_user) {
        Ok(_) => flash(
            "/login/",
            "notice",
            "Account created successfully! Please login.",
        ),
        Err(e @ StoreError::PasswordMismatch)
        | Err(e @ StoreError::UsernameTaken)
        | Err(e @ StoreError::EmailTaken) => flash("/register/", "error", &e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "registration failed");
            flash("/register/", "error", "Registration failed")
        }
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /login/
pub async fn login_page(Query(query): Query<PageQuery>) -> Html<String> {
    page(
        "Login",
        &query,
        "<form method=\"post\" action=\"/login/\">\
         <input name=\"username\" placeholder=\"Username\" required>\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\
         <button type=\"submit\">Login</button></form>\
         <p><a href=\"/register/\">Need an account? Register</a></p>",
    )
}

/// POST /login/
pub async fn login_submit(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match state.store.verify_login(&form.username, &form.password) {
        Ok(user) => user,
        Err(StoreError::UnknownUsername) => {
            return flash("/login/", "error", "Invalid Username").into_response()
        }
        Err(StoreError::WrongPassword) => {
            return flash("/login/", "error", "Invalid Password").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            return flash("/login/", "error", "Login failed").into_response();
        }
    };

    let token = match state.store.create_session(user.id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return flash("/login/", "error", "Login failed").into_response();
        }
    };

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
        )],
        Redirect::to("/home/"),
    )
        .into_response()
}

/// GET /logout/
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = state.store.delete_session(&token) {
            tracing::warn!(error = %e, "session deletion failed");
        }
    }

    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0"),
        )],
        flash("/login/", "notice", "You have been logged out successfully!"),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Authenticated pages
// ---------------------------------------------------------------------------

/// GET /home/
pub async fn home(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = current_user(&state, &headers) else {
        return Redirect::to("/login/").into_response();
    };

    page(
        "Home",
        &query,
        &format!(
            "<p>Welcome, {}.</p>\
             <ul>\
             <li><a href=\"/profile/\">Profile</a></li>\
             <li><a href=\"/sensor-monitor/\">Sensor monitor</a></li>\
             <li><a href=\"/logout/\">Logout</a></li>\
             </ul>",
            escape_html(&user.username)
        ),
    )
    .into_response()
}

#[derive(Debug, Deserialize, Default)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub date_of_birth: String,
}

fn text_input(name: &str, value: &str) -> String {
    format!(
        "<input name=\"{name}\" value=\"{}\" placeholder=\"{name}\">",
        escape_html(value)
    )
}

/// GET /profile/
pub async fn profile_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = current_user(&state, &headers) else {
        return Redirect::to("/login/").into_response();
    };

    let profile = match state.store.profile(user.id) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "profile lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "profile unavailable").into_response();
        }
    };

    let body = format!(
        "<p>Logged in as {}.</p>\
         <form method=\"post\" action=\"/profile/\">\
         {}{}{}{}{}{}{}{}{}\
         <input name=\"date_of_birth\" type=\"date\" value=\"{}\">\
         <button type=\"submit\">Save</button></form>",
        escape_html(&user.username),
        text_input("first_name", &user.first_name),
        text_input("last_name", &user.last_name),
        text_input("email", &user.email),
        text_input("phone_number", &profile.phone_number),
        text_input("address", &profile.address),
        text_input("city", &profile.city),
        text_input("state", &profile.state),
        text_input("pincode", &profile.pincode),
        text_input("bio", &profile.bio),
        escape_html(&profile.date_of_birth),
    );

    page("Profile", &query, &body).into_response()
}

/// POST /profile/
pub async fn profile_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<ProfileForm>,
) -> Response {
    let Some(user) = current_user(&state, &headers) else {
        return Redirect::to("/login/").into_response();
    };

    let update = ProfileUpdate {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        profile: Profile {
            phone_number: form.phone_number,
            address: form.address,
            city: form.city,
            state: form.state,
            pincode: form.pincode,
            bio: form.bio,
            date_of_birth: form.date_of_birth,
        },
    };

    match state.store.update_profile(user.id, &update) {
        Ok(()) => flash("/profile/", "notice", "Profile updated successfully!").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "profile update failed");
            flash("/profile/", "error", "Profile update failed").into_response()
        }
    }
}

/// GET /sensor-monitor/
pub async fn sensor_monitor(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = current_user(&state, &headers) else {
        return Redirect::to("/login/").into_response();
    };

    page(
        "Sensor Monitor",
        &query,
        &format!(
            "<p>Streaming predictions for {}.</p>\
             <p>POST sensor readings as JSON to <code>/api/predict-behavior/</code>:\
             <code>accel_2, accel_3, accel_4, gyro_2, gyro_3, gyro_4, proximity</code>.\
             Absent fields default to 0.</p>",
            escape_html(&user.username)
        ),
    )
    .into_response()
}
