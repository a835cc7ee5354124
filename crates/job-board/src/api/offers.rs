use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::{lenient_id, lenient_string, normalize_list};
use crate::http::{ApiError, HttpClient};

pub type OfferId = i64;

/// Offer as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    #[serde(rename = "id_oferta")]
    pub id: OfferId,
    #[serde(rename = "titulo", default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "requisitos", default, deserialize_with = "lenient_string")]
    pub requirements: String,
    #[serde(rename = "tipo_contrato", default, deserialize_with = "lenient_string")]
    pub contract_type: String,
    #[serde(rename = "ubicacion", default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(rename = "salario", default, deserialize_with = "lenient_string")]
    pub salary: String,
    #[serde(rename = "fecha_publicacion", default)]
    pub published_at: Option<String>,
    #[serde(rename = "fecha_cierre", default)]
    pub closes_at: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
    #[serde(rename = "id_organizacion", default, deserialize_with = "lenient_id")]
    pub organization_id: String,
}

/// Partial offer used for create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDraft {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "requisitos", skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(rename = "tipo_contrato", skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "salario", skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(rename = "fecha_publicacion", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(rename = "fecha_cierre", skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<String>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "id_organizacion", skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

pub struct OffersApi<'a> {
    pub(super) http: &'a HttpClient,
}

impl OffersApi<'_> {
    pub async fn list(&self) -> Result<Vec<OfferRecord>, ApiError> {
        let path = "/offers";
        let payload: Value = self.http.get(path).await?;
        normalize_list(payload, "offers", path)
    }

    pub async fn list_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<OfferRecord>, ApiError> {
        let path = format!("/offers/organization/{organization_id}");
        let payload: Value = self.http.get(&path).await?;
        normalize_list(payload, "offers", &path)
    }

    pub async fn create(&self, draft: &OfferDraft) -> Result<OfferRecord, ApiError> {
        self.http.post("/offers", draft).await
    }

    pub async fn update(&self, id: OfferId, draft: &OfferDraft) -> Result<OfferRecord, ApiError> {
        self.http.put(&format!("/offers/{id}"), draft).await
    }

    pub async fn remove(&self, id: OfferId) -> Result<(), ApiError> {
        self.http.delete(&format!("/offers/{id}")).await
    }
}
