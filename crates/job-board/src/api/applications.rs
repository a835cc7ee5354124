use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::offers::OfferId;
use super::payload::{lenient_id, normalize_list};
use crate::http::{ApiError, HttpClient};

pub type ApplicationId = i64;

/// Status of an application as moved along by the owning organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    InReview,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::InReview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::InReview => "IN_REVIEW",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::InReview => "in review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Accepts the canonical codes and the localized labels some backends emit.
    /// Anything unrecognized is treated as pending.
    pub fn from_label(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    /// Strict variant used for user input.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "PENDING" | "PENDIENTE" => Some(Self::Pending),
            "IN_REVIEW" | "EN_REVISION" => Some(Self::InReview),
            "ACCEPTED" | "ACEPTADA" => Some(Self::Accepted),
            "REJECTED" | "RECHAZADA" => Some(Self::Rejected),
            "WITHDRAWN" | "RETIRADA" => Some(Self::Withdrawn),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_label).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(rename = "id_postulacion")]
    pub id: ApplicationId,
    #[serde(rename = "fecha_postulacion", default)]
    pub submitted_at: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: ApplicationStatus,
    #[serde(rename = "id_num", default, deserialize_with = "lenient_id")]
    pub student_id: String,
    #[serde(rename = "id_oferta")]
    pub offer_id: OfferId,
}

/// Body of the create-application call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    #[serde(rename = "id_num")]
    pub student_id: String,
    #[serde(rename = "id_oferta")]
    pub offer_id: OfferId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    #[serde(rename = "estado")]
    pub status: ApplicationStatus,
}

pub struct ApplicationsApi<'a> {
    pub(super) http: &'a HttpClient,
}

impl ApplicationsApi<'_> {
    pub async fn create(&self, application: &NewApplication) -> Result<(), ApiError> {
        self.http
            .execute(Method::POST, "/applications", Some(application))
            .await
    }

    pub async fn list_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<ApplicationRecord>, ApiError> {
        let path = format!("/applications/student/{student_id}");
        let payload: Value = self.http.get(&path).await?;
        normalize_list(payload, "applications", &path)
    }

    pub async fn list_by_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<ApplicationRecord>, ApiError> {
        let path = format!("/applications/organization/{organization_id}");
        let payload: Value = self.http.get(&path).await?;
        normalize_list(payload, "applications", &path)
    }

    pub async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), ApiError> {
        self.http
            .execute(
                Method::PATCH,
                &format!("/applications/{id}"),
                Some(&StatusChange { status }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn localized_labels_map_to_canonical_statuses() {
        assert_eq!(ApplicationStatus::from_label("ACEPTADA"), ApplicationStatus::Accepted);
        assert_eq!(ApplicationStatus::from_label("en_revision"), ApplicationStatus::InReview);
        assert_eq!(ApplicationStatus::from_label("in review"), ApplicationStatus::InReview);
        assert_eq!(ApplicationStatus::from_label("RETIRADA"), ApplicationStatus::Withdrawn);
    }

    #[test]
    fn unknown_or_missing_status_is_pending() {
        let record: ApplicationRecord = serde_json::from_value(json!({
            "id_postulacion": 9,
            "estado": "ARCHIVED",
            "id_num": "1032",
            "id_oferta": 42
        }))
        .expect("decodes");
        assert_eq!(record.status, ApplicationStatus::Pending);

        let record: ApplicationRecord = serde_json::from_value(json!({
            "id_postulacion": 10,
            "estado": null,
            "id_num": 1032,
            "id_oferta": 42
        }))
        .expect("decodes");
        assert_eq!(record.status, ApplicationStatus::Pending);
        assert_eq!(record.student_id, "1032");
    }

    #[test]
    fn status_change_serializes_code() {
        let body = serde_json::to_value(StatusChange {
            status: ApplicationStatus::InReview,
        })
        .expect("encodes");
        assert_eq!(body, json!({"estado": "IN_REVIEW"}));
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!(ApplicationStatus::parse("hired"), None);
    }
}
