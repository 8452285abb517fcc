mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

fn skullector_payload(serie: &str) -> serde_json::Value {
    json!({
        "Serie": serie,
        "FechaDeLanzamiento": "2020-10",
        "Descripcion": "Edición coleccionista inspirada en el cine de terror",
        "EdicionLimitada": true,
        "Inspiracion": "Clásicos de terror",
        "Certificado": true,
        "PrecioOriginal": 90,
        "PrecioMercado": 450,
        // urls are the photo table's key, so keep them unique per skullector
        "Foto": [
            format!("https://example.com/{}-1.jpg", serie),
            format!("https://example.com/{}-2.jpg", serie),
        ],
    })
}

#[tokio::test]
async fn create_duplicate_and_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    let serie = common::unique("Pennywise");
    let payload = skullector_payload(&serie);

    let res = client
        .post(format!("{}/skullectors", server.base_url))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<serde_json::Value>().await?;
    assert_eq!(created["PrecioOriginal"], json!(90));
    assert_eq!(created["MunecaId"], json!(null));
    assert_eq!(created["Foto"].as_array().map(|a| a.len()), Some(2));

    // Same (Serie, Descripcion, FechaDeLanzamiento) -> conflict
    let res = client
        .post(format!("{}/skullectors", server.base_url))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], json!("Esta skullector ya existe"));

    let res = client
        .get(format!("{}/skullectors/999999999", server.base_url))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], json!("Esta Skullector no existe"));

    Ok(())
}

#[tokio::test]
async fn linked_character_is_embedded() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    let nombre = common::unique("Frankie");
    let res = client
        .post(format!("{}/personajes", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "Nombre": nombre,
            "TipoDeMonstruo": "Frankenstein",
            "FechaDeLanzamiento": "2010-07",
            "Edad": 15,
            "Sexo": "Femenino",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let character_id = res.json::<serde_json::Value>().await?["Id"].as_i64().unwrap();

    let mut payload = skullector_payload(&common::unique("Greta"));
    payload["MunecaId"] = json!(character_id);

    let res = client
        .post(format!("{}/skullectors", server.base_url))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<serde_json::Value>().await?;
    assert_eq!(created["MunecaId"]["Id"], json!(character_id));
    assert_eq!(created["MunecaId"]["Nombre"], json!(nombre));

    Ok(())
}

#[tokio::test]
async fn linking_a_missing_character_is_invalid() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    let mut payload = skullector_payload(&common::unique("Huerfana"));
    payload["MunecaId"] = json!(999999999);

    let res = client
        .post(format!("{}/skullectors", server.base_url))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn boolean_filters_match_exactly() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    let serie = common::unique("Certificada");
    let mut payload = skullector_payload(&serie);
    payload["Certificado"] = json!(false);

    let res = client
        .post(format!("{}/skullectors", server.base_url))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/skullectors?serie={}&certificado=false", server.base_url, serie))
        .bearer_auth(&admin)
        .send()
        .await?;
    let rows = res.json::<Vec<serde_json::Value>>().await?;
    assert_eq!(rows.len(), 1);

    let res = client
        .get(format!("{}/skullectors?serie={}&certificado=true", server.base_url, serie))
        .bearer_auth(&admin)
        .send()
        .await?;
    let rows = res.json::<Vec<serde_json::Value>>().await?;
    assert!(rows.is_empty());

    // Non-boolean filter value is a client error
    let res = client
        .get(format!("{}/skullectors?certificado=quizas", server.base_url))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
