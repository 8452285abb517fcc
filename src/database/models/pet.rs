use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Pet {
    pub id: i32,
    pub nombre: String,
    pub tipo: String,
}

/// Wire shape for a pet. `Foto` is a single optional URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PetResponse {
    pub id: i32,
    pub nombre: String,
    pub tipo: String,
    pub foto: Option<String>,
}

impl PetResponse {
    pub fn from_row(row: Pet, foto: Option<String>) -> Self {
        Self { id: row.id, nombre: row.nombre, tipo: row.tipo, foto }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PetPayload {
    pub nombre: String,
    pub tipo: String,
    pub foto: Option<String>,
}

impl PetPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.nombre.trim().is_empty() {
            return Err("Nombre es obligatorio".to_string());
        }
        if self.tipo.trim().is_empty() {
            return Err("Tipo es obligatorio".to_string());
        }
        if self.nombre.len() > 100 || self.tipo.len() > 100 {
            return Err("Nombre y Tipo no pueden superar 100 caracteres".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PetPatch {
    pub nombre: Option<String>,
    pub tipo: Option<String>,
    pub foto: Option<String>,
}
