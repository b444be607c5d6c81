/*
    etsy-seo-rs | Rust CLI tool to audit and fix Etsy listing SEO.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::config::Config;
use crate::http::build_client;
use crate::token::{Token, TokenError, TokenStore};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use log::{debug, info, warn};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

/// Bytes of entropy behind the PKCE verifier (86 base64url characters).
const VERIFIER_BYTES: usize = 64;
const STATE_BYTES: usize = 16;
/// Upper bound on request header lines drained from the callback connection.
const MAX_CALLBACK_HEADER_LINES: usize = 100;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No authorization code received")]
    MissingCode,
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("State mismatch in OAuth callback (possible CSRF attempt)")]
    StateMismatch,
    #[error("Token endpoint returned HTTP {status}: {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("Token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("OAuth callback listener failed: {0}")]
    Listener(#[from] std::io::Error),
    #[error("OAuth callback listener is already closed")]
    ListenerClosed,
    #[error("No OAuth callback received within {0:?}")]
    CallbackTimeout(Duration),
    #[error("Token endpoint response is not a valid token: {0}")]
    MalformedToken(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] TokenError),
}

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// base64url(SHA-256(verifier)) without padding.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Random anti-CSRF value echoed back by the consent screen.
pub fn random_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Query parameters captured from the redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    AwaitingCallback,
    Received,
    Closed,
}

/// Short-lived local HTTP listener that serves exactly one redirect.
pub struct CallbackListener {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    state: CallbackState,
}

impl CallbackListener {
    /// Binds to the host and port of the redirect URI.
    pub async fn bind(redirect_uri: &Url) -> Result<Self, AuthError> {
        let host = redirect_uri
            .host_str()
            .ok_or_else(|| AuthError::InvalidUrl(format!("{redirect_uri} has no host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = redirect_uri
            .port_or_known_default()
            .ok_or_else(|| AuthError::InvalidUrl(format!("{redirect_uri} has no port")))?;

        let listener = TcpListener::bind((host.as_str(), port)).await?;
        let local_addr = listener.local_addr()?;
        debug!("OAuth callback listener bound to {local_addr}");

        Ok(Self {
            listener: Some(listener),
            local_addr,
            state: CallbackState::AwaitingCallback,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> CallbackState {
        self.state
    }

    /// Accepts one connection, answers it and shuts the listener down.
    ///
    /// The listener is closed afterwards whatever the outcome; a second call
    /// fails with [`AuthError::ListenerClosed`].
    pub async fn receive(&mut self) -> Result<CallbackParams, AuthError> {
        self.receive_within(None).await
    }

    /// Like [`receive`](Self::receive), giving up after `limit` when one is set.
    ///
    /// A timeout also closes the listener.
    pub async fn receive_within(
        &mut self,
        limit: Option<Duration>,
    ) -> Result<CallbackParams, AuthError> {
        let listener = self.listener.take().ok_or(AuthError::ListenerClosed)?;
        let serve = Self::serve_once(listener, &mut self.state);
        let result = match limit {
            Some(limit) => tokio::time::timeout(limit, serve)
                .await
                .unwrap_or(Err(AuthError::CallbackTimeout(limit))),
            None => serve.await,
        };
        self.state = CallbackState::Closed;
        result
    }

    async fn serve_once(
        listener: TcpListener,
        state: &mut CallbackState,
    ) -> Result<CallbackParams, AuthError> {
        let (mut stream, peer) = listener.accept().await?;
        drop(listener);
        debug!("OAuth callback connection from {peer}");

        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;

        for _ in 0..MAX_CALLBACK_HEADER_LINES {
            let mut line = String::new();
            let n = reader.read_line(&mut line).await?;
            if n == 0 || line.trim().is_empty() {
                break;
            }
        }

        let params = parse_callback_request(&request_line);
        *state = CallbackState::Received;

        let body = if params.code.is_some() {
            "<html><body><h2>Authentication successful!</h2>\
             <p>You can close this tab and return to the terminal.</p></body></html>"
        } else {
            "<html><body><h2>Authentication failed.</h2>\
             <p>No authorization code was received. Check the terminal.</p></body></html>"
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        write_half.write_all(response.as_bytes()).await?;
        write_half.shutdown().await?;

        Ok(params)
    }
}

/// Extracts `code`, `state` and `error` from an HTTP request line such as
/// `GET /callback?code=abc&state=xyz HTTP/1.1`. Empty values count as absent.
pub fn parse_callback_request(request_line: &str) -> CallbackParams {
    let mut params = CallbackParams::default();
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");

    let Some(url) = Url::parse("http://localhost/")
        .ok()
        .and_then(|base| base.join(target).ok())
    else {
        return params;
    };

    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "code" => params.code = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

/// Shows the consent URL to the user.
pub trait ConsentPrompt: Send + Sync {
    fn present(&self, url: &Url);
}

/// Prints the consent URL and tries to open it in the default browser.
pub struct BrowserPrompt;

impl ConsentPrompt for BrowserPrompt {
    fn present(&self, url: &Url) {
        println!("Opening browser for Etsy authorization...");
        println!("If the browser doesn't open, visit:\n  {url}\n");
        if let Err(e) = open::that(url.as_str()) {
            warn!("Could not open browser: {e}");
        }
    }
}

/// Runs the OAuth2 authorization code flow with PKCE against Etsy.
pub struct Authenticator {
    client_id: String,
    redirect_uri: Url,
    scopes: String,
    auth_url: String,
    token_url: String,
    callback_timeout: Option<Duration>,
    store: TokenStore,
    http: reqwest::Client,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.api_key.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            callback_timeout: config.callback_timeout,
            store: TokenStore::new(&config.token_file),
            http: build_client(),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn authorize_url(&self, code_challenge: &str, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scopes.as_str()),
                ("client_id", self.client_id.as_str()),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(format!("{}: {e}", self.auth_url)))
    }

    /// Returns the cached token, or runs the browser flow when none is stored.
    pub async fn load_or_authenticate(&self) -> Result<Token, AuthError> {
        if self.store.exists() {
            return Ok(self.store.load()?);
        }
        info!("No token found, starting authentication...");
        self.authenticate().await
    }

    pub async fn authenticate(&self) -> Result<Token, AuthError> {
        self.authenticate_with(&BrowserPrompt).await
    }

    /// Full PKCE flow:
    /// 1. Generates the verifier/challenge pair and an anti-CSRF state.
    /// 2. Binds the callback listener on the redirect URI.
    /// 3. Presents the consent URL and waits for exactly one redirect.
    /// 4. Exchanges the code for a token and persists the raw response.
    pub async fn authenticate_with(&self, prompt: &dyn ConsentPrompt) -> Result<Token, AuthError> {
        let pkce = PkcePair::generate();
        let state = random_state();
        let url = self.authorize_url(&pkce.challenge, &state)?;

        // Bind before presenting the URL so a fast redirect cannot be missed.
        let mut listener = CallbackListener::bind(&self.redirect_uri).await?;
        info!(
            "Waiting for authorization callback on {} ...",
            listener.local_addr()
        );
        prompt.present(&url);

        let params = listener.receive_within(self.callback_timeout).await?;

        let Some(code) = params.code else {
            return Err(match params.error {
                Some(reason) => AuthError::Denied(reason),
                None => AuthError::MissingCode,
            });
        };
        if params.state.as_deref() != Some(state.as_str()) {
            return Err(AuthError::StateMismatch);
        }

        let raw = self.exchange_code(&code, &pkce.verifier).await?;
        self.store.save_raw(&raw)?;
        info!("Token saved to {}", self.store.path().display());

        serde_json::from_value(raw).map_err(AuthError::MalformedToken)
    }

    /// Trades an authorization code and verifier for the token endpoint's JSON.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<serde_json::Value, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", verifier),
        ];

        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
