use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::payload::{lenient_id, lenient_string};
use crate::http::{ApiError, HttpClient};
use crate::session::{SessionError, SessionUser};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Rejected locally before any request was issued.
    #[error("{0}")]
    Invalid(String),
    /// Rejected by the backend; carries its `message` when one was provided.
    #[error("{message}")]
    Rejected { message: String, source: ApiError },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    fn rejected(source: ApiError, fallback: &str) -> Self {
        let message = server_message(&source).unwrap_or_else(|| match &source {
            ApiError::Status { .. } => fallback.to_string(),
            other => other.to_string(),
        });
        Self::Rejected { message, source }
    }
}

/// Extracts `message` from a JSON error body. Validation failures send it as a list.
fn server_message(error: &ApiError) -> Option<String> {
    let ApiError::Status { message, .. } = error else {
        return None;
    };
    let body: Value = serde_json::from_str(message).ok()?;
    match body.get("message")? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Form input for a student sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRegistration {
    #[serde(rename = "numero_identificacion")]
    pub id_number: String,
    #[serde(rename = "tipo_identificacion")]
    pub id_type: String,
    #[serde(rename = "nombres")]
    pub first_names: String,
    #[serde(rename = "apellidos")]
    pub last_names: String,
    pub email: String,
    pub password: String,
}

impl StudentRegistration {
    /// Mirrors the form checks; names are sent uppercased.
    pub fn validated(mut self) -> Result<Self, AuthError> {
        if self.first_names.trim().chars().count() < 2 {
            return Err(AuthError::Invalid("Please enter your first names".to_string()));
        }
        if self.last_names.trim().chars().count() < 2 {
            return Err(AuthError::Invalid("Please enter your last names".to_string()));
        }
        if self.id_number.trim().chars().count() < 3 {
            return Err(AuthError::Invalid(
                "Please enter your identification number".to_string(),
            ));
        }
        self.first_names = self.first_names.to_uppercase();
        self.last_names = self.last_names.to_uppercase();
        Ok(self)
    }
}

/// Form input for an organization sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRegistration {
    pub nit: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
}

impl OrganizationRegistration {
    pub fn validated(mut self) -> Result<Self, AuthError> {
        if self.name.trim().chars().count() < 3 {
            return Err(AuthError::Invalid(
                "Please enter the organization name".to_string(),
            ));
        }
        if self.nit.trim().chars().count() < 5 {
            return Err(AuthError::Invalid("Please enter a valid NIT".to_string()));
        }
        self.name = self.name.to_uppercase();
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(rename = "numero_identificacion", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "nombres", default, deserialize_with = "lenient_string")]
    pub first_names: String,
    #[serde(rename = "apellidos", default, deserialize_with = "lenient_string")]
    pub last_names: String,
    #[serde(rename = "tipo_identificacion", default, deserialize_with = "lenient_string")]
    pub id_type: String,
    #[serde(rename = "celular", default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(rename = "ciudad", default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(rename = "estado", default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
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

/// `/auth/profile` answers with whichever record matches the token's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Profile {
    Student(StudentProfile),
    Organization(OrganizationProfile),
}

impl Profile {
    pub fn id(&self) -> &str {
        match self {
            Profile::Student(profile) => &profile.id,
            Profile::Organization(profile) => &profile.id,
        }
    }
}

pub struct AuthApi<'a> {
    pub(super) http: &'a HttpClient,
}

impl AuthApi<'_> {
    /// Signs in and replaces the session context.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let response: LoginResponse = self
            .http
            .post("/auth/login", &Credentials { email, password })
            .await
            .map_err(|err| AuthError::rejected(err, "Could not sign in"))?;
        self.adopt(response)
    }

    pub async fn register_student(
        &self,
        registration: StudentRegistration,
    ) -> Result<SessionUser, AuthError> {
        let registration = registration.validated()?;
        let response: LoginResponse = self
            .http
            .post("/auth/register/student", &registration)
            .await
            .map_err(|err| AuthError::rejected(err, "Could not register the student"))?;
        self.adopt(response)
    }

    pub async fn register_organization(
        &self,
        registration: OrganizationRegistration,
    ) -> Result<SessionUser, AuthError> {
        let registration = registration.validated()?;
        let response: LoginResponse = self
            .http
            .post("/auth/register/organization", &registration)
            .await
            .map_err(|err| AuthError::rejected(err, "Could not register the organization"))?;
        self.adopt(response)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.http.session().clear()?;
        info!("session cleared");
        Ok(())
    }

    pub async fn profile(&self) -> Result<Profile, AuthError> {
        self.require_token()?;
        self.http
            .get("/auth/profile")
            .await
            .map_err(|err| AuthError::rejected(err, "Could not load the profile"))
    }

    /// Partial update; only the provided fields are sent.
    pub async fn update_profile(&self, changes: &Value) -> Result<Profile, AuthError> {
        self.require_token()?;
        self.http
            .request(Method::PATCH, "/auth/profile", Some(changes.clone()))
            .await
            .map_err(|err| AuthError::rejected(err, "Could not update the profile"))?
            .ok_or_else(|| {
                AuthError::rejected(
                    ApiError::EmptyBody {
                        path: "/auth/profile".to_string(),
                    },
                    "Could not update the profile",
                )
            })
    }

    fn require_token(&self) -> Result<(), AuthError> {
        if self.http.session().is_authenticated() {
            Ok(())
        } else {
            Err(AuthError::rejected(
                ApiError::Unauthenticated,
                "No authentication token",
            ))
        }
    }

    fn adopt(&self, response: LoginResponse) -> Result<SessionUser, AuthError> {
        let LoginResponse { access_token, user } = response;
        self.http.session().establish(access_token, user.clone())?;
        info!(user = %user.id, kind = user.kind.label(), "signed in");
        Ok(user)
    }
}
