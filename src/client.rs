use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::user::RefreshResponse;
use crate::notify::{
    Notifier, GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
use crate::token_store::TokenStore;

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone)]
enum Body {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, Copy)]
enum AuthMode<'a> {
    /// Attach the stored bearer token when present; recover from 401 with a
    /// single refresh-and-retry.
    Bearer,
    /// Anonymous endpoints (login, signup, refresh itself); a 401 here is
    /// final and propagates untouched.
    Anonymous,
    /// HTTP Basic credentials, used by the admin surface only.
    Basic(&'a str, &'a str),
}

#[derive(Debug, Clone, Copy)]
struct SendOpts<'a> {
    auth: AuthMode<'a>,
    notify: bool,
}

/// Single point of outbound API communication. Attaches bearer tokens,
/// transparently refreshes an expired access token exactly once per request,
/// and surfaces non-auth errors as one user-visible notification each.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    notifier: Arc<dyn Notifier>,
    // Serializes refresh round-trips so two simultaneous 401s cannot race
    // each other into parallel refresh calls.
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            http: reqwest::Client::new(),
            base_url,
            tokens,
            notifier,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(
                Method::GET,
                path,
                &Body::Empty,
                SendOpts {
                    auth: AuthMode::Bearer,
                    notify: true,
                },
            )
            .await?;
        decode_json(resp).await
    }

    /// Like `get_json` but without the error toast, for fetches whose
    /// failure is an expected state rather than a user-facing problem.
    pub async fn get_json_quiet<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .send(
                Method::GET,
                path,
                &Body::Empty,
                SendOpts {
                    auth: AuthMode::Bearer,
                    notify: false,
                },
            )
            .await?;
        decode_json(resp).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .send(
                Method::GET,
                path,
                &Body::Empty,
                SendOpts {
                    auth: AuthMode::Bearer,
                    notify: true,
                },
            )
            .await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    pub async fn get_json_basic<T: DeserializeOwned>(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<T, ApiError> {
        let resp = self
            .send(
                Method::GET,
                path,
                &Body::Empty,
                SendOpts {
                    auth: AuthMode::Basic(username, password),
                    notify: true,
                },
            )
            .await?;
        decode_json(resp).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json_body(body)?;
        let resp = self
            .send(
                Method::POST,
                path,
                &body,
                SendOpts {
                    auth: AuthMode::Bearer,
                    notify: true,
                },
            )
            .await?;
        decode_json(resp).await
    }

    pub async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json_body(body)?;
        let resp = self
            .send(
                Method::PATCH,
                path,
                &body,
                SendOpts {
                    auth: AuthMode::Bearer,
                    notify: true,
                },
            )
            .await?;
        decode_json(resp).await
    }

    pub async fn post_json_noauth<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json_body(body)?;
        let resp = self
            .send(
                Method::POST,
                path,
                &body,
                SendOpts {
                    auth: AuthMode::Anonymous,
                    notify: true,
                },
            )
            .await?;
        decode_json(resp).await
    }

    pub async fn post_form_noauth<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let form = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resp = self
            .send(
                Method::POST,
                path,
                &Body::Form(form),
                SendOpts {
                    auth: AuthMode::Anonymous,
                    notify: true,
                },
            )
            .await?;
        decode_json(resp).await
    }

    /// Fire-and-forget authenticated POST. Transport and status errors are
    /// swallowed; the only caller is logout's server-side invalidation.
    pub async fn post_best_effort(&self, path: &str) {
        let token = self.tokens.access_token();
        match self
            .issue(Method::POST, path, &Body::Empty, AuthMode::Bearer, token.as_deref())
            .await
        {
            Ok(resp) => {
                if !resp.status().is_success() {
                    debug!(path, status = %resp.status(), "best-effort request rejected");
                }
            }
            Err(err) => debug!(path, error = %err, "best-effort request failed"),
        }
    }

    /// Explicit refresh, used by the session store. Forces a round-trip even
    /// if another caller refreshed moments ago.
    pub async fn force_refresh(&self) -> Result<String, ApiError> {
        let current = self.tokens.access_token();
        self.refresh_access_token(current.as_deref()).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: &Body,
        opts: SendOpts<'_>,
    ) -> Result<reqwest::Response, ApiError> {
        let token = match opts.auth {
            AuthMode::Bearer => self.tokens.access_token(),
            _ => None,
        };

        let resp = match self
            .issue(method.clone(), path, body, opts.auth, token.as_deref())
            .await
        {
            Ok(resp) => resp,
            Err(err) => return Err(self.network_error(err, opts.notify)),
        };

        if resp.status() == StatusCode::UNAUTHORIZED {
            if !matches!(opts.auth, AuthMode::Bearer) {
                return Err(ApiError::Unauthorized);
            }
            // No refresh token: propagate, caller treats as logged out.
            if self.tokens.refresh_token().is_none() {
                return Err(ApiError::Unauthorized);
            }
            let fresh = self.refresh_access_token(token.as_deref()).await?;
            debug!(path, "retrying request with refreshed access token");
            let retried = match self
                .issue(method, path, body, opts.auth, Some(fresh.as_str()))
                .await
            {
                Ok(resp) => resp,
                Err(err) => return Err(self.network_error(err, opts.notify)),
            };
            // The retried request is never itself retried.
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
            return self.check_status(retried, opts.notify).await;
        }

        self.check_status(resp, opts.notify).await
    }

    async fn issue(
        &self,
        method: Method,
        path: &str,
        body: &Body,
        auth: AuthMode<'_>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        match body {
            Body::Empty => {}
            Body::Json(value) => req = req.json(value),
            Body::Form(fields) => req = req.form(fields),
        }
        match auth {
            AuthMode::Bearer => {
                if let Some(token) = bearer {
                    req = req.bearer_auth(token);
                }
            }
            AuthMode::Anonymous => {}
            AuthMode::Basic(user, pass) => {
                let encoded = BASE64.encode(format!("{}:{}", user, pass));
                req = req.header(reqwest::header::AUTHORIZATION, format!("Basic {}", encoded));
            }
        }
        req.send().await
    }

    /// Exchanges the refresh token for a new access token, persisting both.
    /// `observed` is the access token the failed request went out with; when
    /// the stored token already differs, another caller has refreshed in the
    /// meantime and that token is reused instead of a second round-trip.
    async fn refresh_access_token(&self, observed: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_gate.lock().await;

        if let Some(current) = self.tokens.access_token() {
            if observed != Some(current.as_str()) {
                return Ok(current);
            }
        }

        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or(ApiError::Unauthorized)?;

        let result = self
            .issue(
                Method::POST,
                REFRESH_PATH,
                &Body::Json(json!({ "refresh_token": refresh_token })),
                AuthMode::Anonymous,
                None,
            )
            .await;

        let resp = match result {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "token refresh rejected, clearing session");
                self.tokens.clear();
                self.notifier.error(SESSION_EXPIRED_MESSAGE);
                return Err(ApiError::SessionExpired);
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing session");
                self.tokens.clear();
                self.notifier.error(SESSION_EXPIRED_MESSAGE);
                return Err(ApiError::SessionExpired);
            }
        };

        let refreshed: RefreshResponse = decode_json(resp).await?;
        self.tokens.set_access_token(&refreshed.access_token);
        if let Some(rotated) = refreshed.refresh_token.as_deref() {
            self.tokens.set_refresh_token(rotated);
        }
        Ok(refreshed.access_token)
    }

    async fn check_status(
        &self,
        resp: reqwest::Response,
        notify: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = extract_server_message(&text)
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        if notify {
            self.notifier.error(&message);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn network_error(&self, err: reqwest::Error, notify: bool) -> ApiError {
        if notify {
            self.notifier.error(NETWORK_ERROR_MESSAGE);
        }
        ApiError::Network(err.to_string())
    }
}

fn to_json_body<B: Serialize>(body: &B) -> Result<Body, ApiError> {
    let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(Body::Json(value))
}

async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// The backend reports errors as `{"detail": "..."}`; a few older endpoints
/// use `message`.
fn extract_server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .or_else(|| value.get("message").and_then(Value::as_str))
        .map(str::to_string)
}
