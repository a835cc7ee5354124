use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::{lenient_id, lenient_string, normalize_list};
use super::universities::UniversityId;
use crate::http::{ApiError, HttpClient};

pub type CareerId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "numero_identificacion", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(rename = "tipo_identificacion", default, deserialize_with = "lenient_string")]
    pub id_type: String,
    #[serde(rename = "nombres", default, deserialize_with = "lenient_string")]
    pub first_names: String,
    #[serde(rename = "apellidos", default, deserialize_with = "lenient_string")]
    pub last_names: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "celular", default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(rename = "ciudad", default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(rename = "estado", default)]
    pub active: bool,
    #[serde(rename = "fecha_registro", default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    #[serde(rename = "numero_identificacion")]
    pub id: String,
    #[serde(rename = "tipo_identificacion")]
    pub id_type: String,
    #[serde(rename = "nombres")]
    pub first_names: String,
    #[serde(rename = "apellidos")]
    pub last_names: String,
    pub email: String,
    #[serde(rename = "celular")]
    pub phone: String,
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "estado")]
    pub active: bool,
}

/// Contact fields a student edits from the profile screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(rename = "nombres", skip_serializing_if = "Option::is_none")]
    pub first_names: Option<String>,
    #[serde(rename = "apellidos", skip_serializing_if = "Option::is_none")]
    pub last_names: Option<String>,
    #[serde(rename = "celular", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "ciudad", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl StudentUpdate {
    pub fn from_student(student: &Student) -> Self {
        Self {
            first_names: Some(student.first_names.clone()),
            last_names: Some(student.last_names.clone()),
            phone: Some(student.phone.clone()),
            city: Some(student.city.clone()),
            email: Some(student.email.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityRef {
    #[serde(rename = "id_universidad", default)]
    pub id: Option<UniversityId>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRef {
    #[serde(rename = "id_carrera", default)]
    pub id: Option<CareerId>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "nivel", default)]
    pub level: Option<String>,
    #[serde(rename = "id_universidad", default)]
    pub university_id: Option<UniversityId>,
    #[serde(rename = "universidad", default)]
    pub university: Option<UniversityRef>,
}

/// A persisted enrollment of a student in an academic program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCareerRecord {
    #[serde(rename = "id_carrera", default)]
    pub career_id: Option<CareerId>,
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
    #[serde(rename = "semestre_actual", default)]
    pub semester: Option<u32>,
    #[serde(rename = "fecha_inicio", default)]
    pub start_date: Option<String>,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<String>,
    #[serde(rename = "carrera", default)]
    pub career: Option<CareerRef>,
    #[serde(rename = "universidad", default)]
    pub university: Option<UniversityRef>,
}

impl StudentCareerRecord {
    /// The record's own id wins over the nested career's.
    pub fn resolved_career_id(&self) -> Option<CareerId> {
        self.career_id
            .or_else(|| self.career.as_ref().and_then(|career| career.id))
    }

    pub fn resolved_university(&self) -> Option<&UniversityRef> {
        self.career
            .as_ref()
            .and_then(|career| career.university.as_ref())
            .or(self.university.as_ref())
    }

    pub fn resolved_university_id(&self) -> Option<UniversityId> {
        self.career
            .as_ref()
            .and_then(|career| career.university_id)
            .or_else(|| self.resolved_university().and_then(|university| university.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerAssignment {
    #[serde(rename = "id_carrera")]
    pub career_id: CareerId,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "semestre_actual")]
    pub semester: u32,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_fin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerUpdate {
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "semestre_actual")]
    pub semester: u32,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_fin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

pub struct StudentsApi<'a> {
    pub(super) http: &'a HttpClient,
}

impl StudentsApi<'_> {
    pub async fn list(&self) -> Result<Vec<Student>, ApiError> {
        let path = "/students";
        let payload: Value = self.http.get(path).await?;
        normalize_list(payload, "students", path)
    }

    pub async fn get(&self, id: &str) -> Result<Student, ApiError> {
        self.http.get(&format!("/students/{id}")).await
    }

    pub async fn create(&self, student: &NewStudent) -> Result<Student, ApiError> {
        self.http.post("/students", student).await
    }

    pub async fn update(&self, id: &str, update: &StudentUpdate) -> Result<(), ApiError> {
        self.http
            .execute(Method::PATCH, &format!("/students/{id}"), Some(update))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.http.delete(&format!("/students/{id}")).await
    }

    pub async fn assign_career(
        &self,
        student_id: &str,
        assignment: &CareerAssignment,
    ) -> Result<(), ApiError> {
        self.http
            .execute(
                Method::POST,
                &format!("/students/{student_id}/careers"),
                Some(assignment),
            )
            .await
    }

    pub async fn list_careers(&self, student_id: &str) -> Result<Vec<StudentCareerRecord>, ApiError> {
        let path = format!("/students/{student_id}/careers");
        let payload: Value = self.http.get(&path).await?;
        normalize_list(payload, "careers", &path)
    }

    pub async fn update_career(
        &self,
        student_id: &str,
        career_id: CareerId,
        update: &CareerUpdate,
    ) -> Result<(), ApiError> {
        self.http
            .execute(
                Method::PATCH,
                &format!("/students/{student_id}/careers/{career_id}"),
                Some(update),
            )
            .await
    }

    pub async fn remove_career(&self, student_id: &str, career_id: CareerId) -> Result<(), ApiError> {
        self.http
            .delete(&format!("/students/{student_id}/careers/{career_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_career_fields_resolve() {
        let record: StudentCareerRecord = serde_json::from_value(json!({
            "estado": "ACTIVO",
            "semestre_actual": 6,
            "fecha_inicio": "2022-02-01T00:00:00.000Z",
            "carrera": {
                "id_carrera": 12,
                "nombre": "Ingenieria de Sistemas",
                "nivel": "UNDERGRADUATE",
                "universidad": {"id_universidad": 3, "nombre": "Universidad Nacional"}
            }
        }))
        .expect("decodes");

        assert_eq!(record.resolved_career_id(), Some(12));
        assert_eq!(record.resolved_university_id(), Some(3));
        assert_eq!(
            record.resolved_university().and_then(|u| u.name.as_deref()),
            Some("Universidad Nacional")
        );
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(StudentUpdate::default().is_empty());
        let update = StudentUpdate {
            city: Some("Medellin".to_string()),
            ..StudentUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
