use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::edition::EditionResponse;
use super::pet::PetResponse;

/// Allowed values for the `sexo` column (mirrors the chk_sexo constraint)
pub const SEXO_VALUES: [&str; 2] = ["Masculino", "Femenino"];
pub const SEXO_DEFAULT: &str = "Femenino";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Character {
    pub id: i32,
    pub nombre: String,
    pub tipo_de_monstruo: String,
    pub fecha_de_lanzamiento: String,
    pub fecha_cumpleanios: Option<String>,
    pub ciudad_natal: Option<String>,
    pub edad: Option<i32>,
    pub frase: Option<String>,
    pub color_fav: Option<String>,
    pub sexo: String,
    pub mascota_id: Option<i32>,
}

/// Flat wire shape used by `/personajes`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterResponse {
    pub id: i32,
    pub nombre: String,
    pub tipo_de_monstruo: String,
    pub fecha_de_lanzamiento: String,
    pub fecha_cumpleanios: Option<String>,
    pub ciudad_natal: Option<String>,
    pub edad: Option<i32>,
    pub foto: Vec<String>,
    pub frase: Option<String>,
    pub color_fav: Option<String>,
    pub sexo: String,
}

impl CharacterResponse {
    pub fn from_row(row: Character, foto: Vec<String>) -> Self {
        Self {
            id: row.id,
            nombre: row.nombre,
            tipo_de_monstruo: row.tipo_de_monstruo,
            fecha_de_lanzamiento: row.fecha_de_lanzamiento,
            fecha_cumpleanios: row.fecha_cumpleanios,
            ciudad_natal: row.ciudad_natal,
            edad: row.edad,
            foto,
            frase: row.frase,
            color_fav: row.color_fav,
            sexo: row.sexo,
        }
    }
}

/// Nested wire shape used by `/todos`: the flat fields plus the resolved
/// pet and edition relations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterDetailResponse {
    #[serde(flatten)]
    pub character: CharacterResponse,
    pub mascota_id: Option<PetResponse>,
    pub ediciones_id: Vec<EditionResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterPayload {
    pub nombre: String,
    pub tipo_de_monstruo: String,
    pub fecha_de_lanzamiento: String,
    pub fecha_cumpleanios: Option<String>,
    pub ciudad_natal: Option<String>,
    pub edad: Option<i32>,
    #[serde(default)]
    pub foto: Vec<String>,
    pub frase: Option<String>,
    pub color_fav: Option<String>,
    #[serde(default = "default_sexo")]
    pub sexo: String,
    pub mascota_id: Option<i32>,
    #[serde(default)]
    pub ediciones_id: Vec<i32>,
}

fn default_sexo() -> String {
    SEXO_DEFAULT.to_string()
}

impl CharacterPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.nombre.trim().is_empty() {
            return Err("Nombre es obligatorio".to_string());
        }
        if self.tipo_de_monstruo.trim().is_empty() {
            return Err("TipoDeMonstruo es obligatorio".to_string());
        }
        if self.fecha_de_lanzamiento.trim().is_empty() {
            return Err("FechaDeLanzamiento es obligatoria".to_string());
        }
        if self.nombre.len() > 100 || self.tipo_de_monstruo.len() > 100 {
            return Err("Nombre y TipoDeMonstruo no pueden superar 100 caracteres".to_string());
        }
        if self.fecha_de_lanzamiento.len() > 7 {
            return Err("FechaDeLanzamiento no puede superar 7 caracteres".to_string());
        }
        if let Some(cumple) = &self.fecha_cumpleanios {
            if cumple.len() > 5 {
                return Err("FechaCumpleanios no puede superar 5 caracteres".to_string());
            }
        }
        if let Some(ciudad) = &self.ciudad_natal {
            if ciudad.len() > 100 {
                return Err("CiudadNatal no puede superar 100 caracteres".to_string());
            }
        }
        validate_sexo(&self.sexo)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterPatch {
    pub nombre: Option<String>,
    pub tipo_de_monstruo: Option<String>,
    pub fecha_de_lanzamiento: Option<String>,
    pub fecha_cumpleanios: Option<String>,
    pub ciudad_natal: Option<String>,
    pub edad: Option<i32>,
    pub foto: Option<Vec<String>>,
    pub frase: Option<String>,
    pub color_fav: Option<String>,
    pub sexo: Option<String>,
    pub mascota_id: Option<i32>,
    pub ediciones_id: Option<Vec<i32>>,
}

pub fn validate_sexo(sexo: &str) -> Result<(), String> {
    if SEXO_VALUES.contains(&sexo) {
        Ok(())
    } else {
        Err(format!("Sexo debe ser uno de: {}", SEXO_VALUES.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CharacterPayload {
        CharacterPayload {
            nombre: "Draculaura".to_string(),
            tipo_de_monstruo: "Vampiro".to_string(),
            fecha_de_lanzamiento: "2010-07".to_string(),
            fecha_cumpleanios: Some("02-14".to_string()),
            ciudad_natal: Some("Transilvania".to_string()),
            edad: Some(1599),
            foto: vec![],
            frase: None,
            color_fav: Some("Rosa".to_string()),
            sexo: "Femenino".to_string(),
            mascota_id: None,
            ediciones_id: vec![],
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn sexo_outside_enum_is_rejected() {
        let mut p = payload();
        p.sexo = "Otro".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn overlong_release_date_is_rejected() {
        let mut p = payload();
        p.fecha_de_lanzamiento = "2010-07-14".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut p = payload();
        p.nombre = "  ".to_string();
        assert!(p.validate().is_err());
    }
}
