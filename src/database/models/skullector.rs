use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::character::CharacterResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skullector {
    pub id: i32,
    pub muneca_id: Option<i32>,
    pub serie: String,
    pub edicion_limitada: bool,
    pub inspiracion: Option<String>,
    pub fecha_de_lanzamiento: String,
    pub descripcion: String,
    pub certificado: bool,
    pub precio_original: Option<i32>,
    pub precio_mercado: Option<i32>,
}

/// Wire shape for a skullector. `MunecaId` carries the resolved character
/// when one is linked; prices default to 0 when unset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkullectorResponse {
    pub id: i32,
    pub serie: String,
    pub fecha_de_lanzamiento: String,
    pub descripcion: String,
    pub foto: Vec<String>,
    pub edicion_limitada: bool,
    pub inspiracion: Option<String>,
    pub certificado: bool,
    pub precio_original: i32,
    pub precio_mercado: i32,
    pub muneca_id: Option<CharacterResponse>,
}

impl SkullectorResponse {
    pub fn from_row(row: Skullector, foto: Vec<String>, muneca: Option<CharacterResponse>) -> Self {
        Self {
            id: row.id,
            serie: row.serie,
            fecha_de_lanzamiento: row.fecha_de_lanzamiento,
            descripcion: row.descripcion,
            foto,
            edicion_limitada: row.edicion_limitada,
            inspiracion: row.inspiracion,
            certificado: row.certificado,
            precio_original: row.precio_original.unwrap_or(0),
            precio_mercado: row.precio_mercado.unwrap_or(0),
            muneca_id: muneca,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkullectorPayload {
    pub serie: String,
    pub fecha_de_lanzamiento: String,
    pub descripcion: String,
    pub edicion_limitada: bool,
    pub inspiracion: Option<String>,
    pub certificado: bool,
    pub precio_original: Option<i32>,
    pub precio_mercado: Option<i32>,
    pub muneca_id: Option<i32>,
    #[serde(default)]
    pub foto: Vec<String>,
}

impl SkullectorPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.serie.trim().is_empty() {
            return Err("Serie es obligatoria".to_string());
        }
        if self.descripcion.trim().is_empty() {
            return Err("Descripcion es obligatoria".to_string());
        }
        if self.fecha_de_lanzamiento.trim().is_empty() {
            return Err("FechaDeLanzamiento es obligatoria".to_string());
        }
        if self.serie.len() > 100 {
            return Err("Serie no puede superar 100 caracteres".to_string());
        }
        if self.fecha_de_lanzamiento.len() > 7 {
            return Err("FechaDeLanzamiento no puede superar 7 caracteres".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkullectorPatch {
    pub serie: Option<String>,
    pub fecha_de_lanzamiento: Option<String>,
    pub descripcion: Option<String>,
    pub edicion_limitada: Option<bool>,
    pub inspiracion: Option<String>,
    pub certificado: Option<bool>,
    pub precio_original: Option<i32>,
    pub precio_mercado: Option<i32>,
    pub muneca_id: Option<i32>,
    pub foto: Option<Vec<String>>,
}
