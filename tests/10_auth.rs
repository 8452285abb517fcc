mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_returns_token_pair_and_user() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("ghoulia");
    let res = client
        .post(format!("{}/register", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@monsterhigh.edu", username),
            "password": "brains-and-books-1",
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
    assert_eq!(body["user"]["username"], json!(username));
    assert_eq!(body["user"]["is_staff"], json!(false));

    Ok(())
}

#[tokio::test]
async fn register_duplicate_username_conflicts() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("clawdeen");
    let payload = json!({
        "username": username,
        "email": format!("{}@monsterhigh.edu", username),
        "password": "wolf-fashion-99",
    });

    let first = client.post(format!("{}/register", server.base_url)).json(&payload).send().await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client.post(format!("{}/register", server.base_url)).json(&payload).send().await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = second.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], json!("El usuario ya existe"));

    Ok(())
}

#[tokio::test]
async fn register_rejects_weak_password() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("shorty");
    let res = client
        .post(format!("{}/register", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "short",
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({
            "username": common::ADMIN_USERNAME,
            "email": "whoever@example.com",
            "password": "definitely-wrong",
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], json!("Credenciales incorrectas"));

    Ok(())
}

#[tokio::test]
async fn refresh_rotates_the_token_pair() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("rotator");
    let res = client
        .post(format!("{}/register", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "rotating-password-1",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let refresh = body["refresh"].as_str().unwrap().to_string();

    // First use: new pair comes back
    let res = client
        .post(format!("{}/token/refresh", server.base_url))
        .json(&json!({ "refresh": refresh }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rotated = res.json::<serde_json::Value>().await?;
    assert!(rotated["access"].is_string());
    assert!(rotated["refresh"].is_string());
    assert_ne!(rotated["refresh"].as_str(), Some(refresh.as_str()));

    // Second use of the spent token must fail
    let res = client
        .post(format!("{}/token/refresh", server.base_url))
        .json(&json!({ "refresh": refresh }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn logout_denylists_the_refresh_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let username = common::unique("leaver");
    let res = client
        .post(format!("{}/register", server.base_url))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "leaving-password-1",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let access = body["access"].as_str().unwrap().to_string();
    let refresh = body["refresh"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/logout", server.base_url))
        .bearer_auth(&access)
        .json(&json!({ "refresh": refresh }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], json!("Sesión cerrada correctamente"));

    // The denylisted token can no longer refresh or log out
    let res = client
        .post(format!("{}/token/refresh", server.base_url))
        .json(&json!({ "refresh": refresh }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/logout", server.base_url))
        .bearer_auth(&access)
        .json(&json!({ "refresh": refresh }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn logout_requires_authentication_and_a_valid_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // No bearer token at all
    let res = client
        .post(format!("{}/logout", server.base_url))
        .json(&json!({ "refresh": "garbage" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Authenticated but garbage refresh token
    let access = common::member_access_token(&server.base_url).await?;
    let res = client
        .post(format!("{}/logout", server.base_url))
        .bearer_auth(&access)
        .json(&json!({ "refresh": "garbage" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], json!("Token inválido o ya expirado"));

    Ok(())
}
