use etsy_seo_core::auth::{AuthError, ConsentPrompt};
use etsy_seo_core::{Authenticator, Config, Token};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use tempfile::tempdir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Plays the browser: follows the consent URL straight to the redirect URI
/// with a query built from the `state` it was given.
struct FakeBrowser {
    query: fn(&str) -> String,
}

impl ConsentPrompt for FakeBrowser {
    fn present(&self, url: &Url) {
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["code_challenge"].len(), 43);

        let redirect = Url::parse(&pairs["redirect_uri"]).unwrap();
        let addr = format!("127.0.0.1:{}", redirect.port().unwrap());
        let request = format!(
            "GET {}?{} HTTP/1.1\r\nHost: localhost\r\n\r\n",
            redirect.path(),
            (self.query)(&pairs["state"])
        );

        thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(request.as_bytes()).unwrap();
            let mut response = String::new();
            let _ = stream.read_to_string(&mut response);
        });
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn config(server: &MockServer, token_file: &Path) -> Config {
    let vars = HashMap::from([
        ("ETSY_API_KEY", "test-key".to_string()),
        (
            "REDIRECT_URI",
            format!("http://127.0.0.1:{}/callback", free_port()),
        ),
        ("TOKEN_FILE", token_file.display().to_string()),
        ("ETSY_TOKEN_URL", format!("{}/oauth/token", server.uri())),
        ("CALLBACK_TIMEOUT_SECS", "10".to_string()),
    ]);
    Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_id=test-key"))
        .and(body_string_contains("code=good-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "123.abc",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "123.refresh",
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_flow_saves_token() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token.json");

    let authenticator = Authenticator::new(&config(&mock_server, &token_file));
    let browser = FakeBrowser {
        query: |state| format!("code=good-code&state={state}"),
    };
    let token = authenticator
        .authenticate_with(&browser)
        .await
        .expect("flow should succeed");

    assert_eq!(token.access_token, "123.abc");
    assert_eq!(token.refresh_token.as_deref(), Some("123.refresh"));

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&token_file).unwrap()).unwrap();
    assert_eq!(saved["access_token"], "123.abc");
    assert_eq!(saved["expires_in"], 3600);
}

#[tokio::test]
async fn test_cached_token_skips_flow() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    std::fs::write(&token_file, r#"{"access_token": "cached", "expires_in": 10}"#).unwrap();

    let authenticator = Authenticator::new(&config(&mock_server, &token_file));
    let token = authenticator
        .load_or_authenticate()
        .await
        .expect("cached token should load");
    assert_eq!(
        token,
        Token {
            access_token: "cached".to_string(),
            token_type: None,
            expires_in: 10,
            refresh_token: None,
        }
    );
}

#[tokio::test]
async fn test_state_mismatch_is_rejected() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token.json");

    let authenticator = Authenticator::new(&config(&mock_server, &token_file));
    let browser = FakeBrowser {
        query: |_| "code=good-code&state=forged".to_string(),
    };
    let err = authenticator.authenticate_with(&browser).await.unwrap_err();

    assert!(matches!(err, AuthError::StateMismatch));
    assert!(!token_file.exists());
}

#[tokio::test]
async fn test_missing_code_is_rejected() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token.json");

    let authenticator = Authenticator::new(&config(&mock_server, &token_file));
    let browser = FakeBrowser {
        query: |state| format!("state={state}"),
    };
    let err = authenticator.authenticate_with(&browser).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingCode));
}

#[tokio::test]
async fn test_denied_consent_reports_reason() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token.json");

    let authenticator = Authenticator::new(&config(&mock_server, &token_file));
    let browser = FakeBrowser {
        query: |state| format!("error=access_denied&state={state}"),
    };
    let err = authenticator.authenticate_with(&browser).await.unwrap_err();
    assert!(matches!(err, AuthError::Denied(reason) if reason == "access_denied"));
}

#[tokio::test]
async fn test_token_endpoint_error_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&mock_server)
        .await;
    let dir = tempdir().unwrap();
    let token_file = dir.path().join("token.json");

    let authenticator = Authenticator::new(&config(&mock_server, &token_file));
    let browser = FakeBrowser {
        query: |state| format!("code=bad-code&state={state}"),
    };
    let err = authenticator.authenticate_with(&browser).await.unwrap_err();

    match err {
        AuthError::TokenEndpoint { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!token_file.exists());
}
