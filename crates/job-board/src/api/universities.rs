use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::{lenient_string, normalize_list};
use super::students::CareerId;
use crate::http::{ApiError, HttpClient};

pub type UniversityId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    #[serde(rename = "id_universidad")]
    pub id: UniversityId,
    #[serde(rename = "nombre", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
}

/// An academic program offered by a university.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
    #[serde(rename = "id_carrera")]
    pub id: CareerId,
    #[serde(rename = "nombre", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "nivel", default, deserialize_with = "lenient_string")]
    pub level: String,
    #[serde(rename = "id_universidad")]
    pub university_id: UniversityId,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
}

pub struct UniversitiesApi<'a> {
    pub(super) http: &'a HttpClient,
}

impl UniversitiesApi<'_> {
    pub async fn list(&self) -> Result<Vec<University>, ApiError> {
        let path = "/universities";
        let payload: Value = self.http.get(path).await?;
        normalize_list(payload, "universities", path)
    }

    pub async fn careers(&self, university_id: UniversityId) -> Result<Vec<Career>, ApiError> {
        let path = format!("/universities/{university_id}/careers");
        let payload: Value = self.http.get(&path).await?;
        normalize_list(payload, "careers", &path)
    }
}
