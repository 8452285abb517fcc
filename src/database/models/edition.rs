use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Release-wave generations (mirrors the chk_tipo_generacion constraint)
pub const GENERATION_VALUES: [i16; 3] = [1, 2, 3];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Edition {
    pub id: i32,
    pub serie: String,
    pub fecha_de_lanzamiento: String,
    pub tipo_de_generacion: i16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EditionResponse {
    pub id: i32,
    pub serie: String,
    pub fecha_de_lanzamiento: String,
    pub tipo_de_generacion: i16,
    pub foto: Vec<String>,
}

impl EditionResponse {
    pub fn from_row(row: Edition, foto: Vec<String>) -> Self {
        Self {
            id: row.id,
            serie: row.serie,
            fecha_de_lanzamiento: row.fecha_de_lanzamiento,
            tipo_de_generacion: row.tipo_de_generacion,
            foto,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EditionPayload {
    pub serie: String,
    pub fecha_de_lanzamiento: String,
    pub tipo_de_generacion: i16,
    #[serde(default)]
    pub foto: Vec<String>,
}

impl EditionPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.serie.trim().is_empty() {
            return Err("Serie es obligatoria".to_string());
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
        validate_generation(self.tipo_de_generacion)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EditionPatch {
    pub serie: Option<String>,
    pub fecha_de_lanzamiento: Option<String>,
    pub tipo_de_generacion: Option<i16>,
    pub foto: Option<Vec<String>>,
}

pub fn validate_generation(generation: i16) -> Result<(), String> {
    if GENERATION_VALUES.contains(&generation) {
        Ok(())
    } else {
        Err("TipoDeGeneracion debe ser 1, 2 o 3".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_bounds() {
        assert!(validate_generation(1).is_ok());
        assert!(validate_generation(3).is_ok());
        assert!(validate_generation(0).is_err());
        assert!(validate_generation(4).is_err());
    }
}
