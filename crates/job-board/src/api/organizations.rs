use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::{lenient_id, lenient_string, normalize_list};
use crate::http::{ApiError, HttpClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    #[serde(rename = "id_organizacion", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nit: String,
    #[serde(rename = "nombre", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sector: String,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub logo_url: String,
    #[serde(rename = "ubicacion", default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(rename = "estado", default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

pub struct OrganizationsApi<'a> {
    pub(super) http: &'a HttpClient,
}

impl OrganizationsApi<'_> {
    pub async fn get(&self, id: &str) -> Result<OrganizationRecord, ApiError> {
        self.http.get(&format!("/organizations/{id}")).await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &OrganizationUpdate,
    ) -> Result<OrganizationRecord, ApiError> {
        self.http.put(&format!("/organizations/{id}"), update).await
    }

    pub async fn featured(&self) -> Result<Vec<OrganizationRecord>, ApiError> {
        let path = "/organizations/featured";
        let payload: Value = self.http.get(path).await?;
        normalize_list(payload, "organizations", path)
    }
}
