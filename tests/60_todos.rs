mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn nested_view_resolves_pet_and_editions() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    // A pet and an edition to link against
    let pet_nombre = common::unique("Neptuna");
    let res = client
        .post(format!("{}/mascotas", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "Nombre": pet_nombre, "Tipo": "Piraña" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let pet_id = res.json::<serde_json::Value>().await?["Id"].as_i64().unwrap();

    let serie = common::unique("Swim Class");
    let res = client
        .post(format!("{}/ediciones", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "Serie": serie, "FechaDeLanzamiento": "2011-05", "TipoDeGeneracion": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let edition_id = res.json::<serde_json::Value>().await?["Id"].as_i64().unwrap();

    let nombre = common::unique("Lagoona");
    let res = client
        .post(format!("{}/todos", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "Nombre": nombre,
            "TipoDeMonstruo": "Monstruo marino",
            "FechaDeLanzamiento": "2010-07",
            "Edad": 15,
            "Sexo": "Femenino",
            "MascotaId": pet_id,
            "EdicionesId": [edition_id],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let character_id = res.json::<serde_json::Value>().await?["Id"].as_i64().unwrap();

    // The nested view embeds the pet object and the edition list
    let res = client
        .get(format!("{}/todos/{}", server.base_url, character_id))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let detail = res.json::<serde_json::Value>().await?;
    assert_eq!(detail["Nombre"], json!(nombre));
    assert_eq!(detail["MascotaId"]["Id"], json!(pet_id));
    assert_eq!(detail["MascotaId"]["Nombre"], json!(pet_nombre));
    assert_eq!(detail["EdicionesId"][0]["Id"], json!(edition_id));
    assert_eq!(detail["EdicionesId"][0]["Serie"], json!(serie));

    Ok(())
}

#[tokio::test]
async fn generation_filter_follows_the_edition_link() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    let serie = common::unique("Gen3 Wave");
    let res = client
        .post(format!("{}/ediciones", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "Serie": serie, "FechaDeLanzamiento": "2016-09", "TipoDeGeneracion": 3 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let edition_id = res.json::<serde_json::Value>().await?["Id"].as_i64().unwrap();

    let linked = common::unique("Moanica");
    let res = client
        .post(format!("{}/todos", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "Nombre": linked,
            "TipoDeMonstruo": "Zombi",
            "FechaDeLanzamiento": "2016-09",
            "Edad": 16,
            "Sexo": "Femenino",
            "EdicionesId": [edition_id],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let unlinked = common::unique("Sinedicion");
    let res = client
        .post(format!("{}/todos", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "Nombre": unlinked,
            "TipoDeMonstruo": "Zombi",
            "FechaDeLanzamiento": "2016-09",
            "Edad": 16,
            "Sexo": "Femenino",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Only the character linked to a generation-3 edition comes back
    let res = client
        .get(format!("{}/todos?generacion=3&nombre={}", server.base_url, linked))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows = res.json::<Vec<serde_json::Value>>().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Nombre"], json!(linked));

    let res = client
        .get(format!("{}/todos?generacion=3&nombre={}", server.base_url, unlinked))
        .bearer_auth(&admin)
        .send()
        .await?;
    let rows = res.json::<Vec<serde_json::Value>>().await?;
    assert!(rows.is_empty());

    // Non-numeric generation is rejected
    let res = client
        .get(format!("{}/todos?generacion=tres", server.base_url))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], json!("El parámetro 'generacion' debe ser un número"));

    Ok(())
}

#[tokio::test]
async fn pet_type_filter_matches_exactly() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::admin_access_token(&server.base_url).await?;

    let tipo_mascota = common::unique("Gárgola");
    let res = client
        .post(format!("{}/mascotas", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "Nombre": common::unique("Rockseena"), "Tipo": tipo_mascota }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let pet_id = res.json::<serde_json::Value>().await?["Id"].as_i64().unwrap();

    let nombre = common::unique("Gigi");
    let res = client
        .post(format!("{}/todos", server.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "Nombre": nombre,
            "TipoDeMonstruo": "Genio",
            "FechaDeLanzamiento": "2013-01",
            "Edad": 15,
            "Sexo": "Femenino",
            "MascotaId": pet_id,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/todos?tipoMascota={}", server.base_url, tipo_mascota))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows = res.json::<Vec<serde_json::Value>>().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Nombre"], json!(nombre));

    Ok(())
}
