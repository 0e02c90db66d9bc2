//! Resource endpoints of the clinic backend.
//!
//! Every method here is a thin wrapper that builds a path and hands it to
//! [`ApiClient::send`]. Payloads are passed through as JSON values.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use super::client::ApiClient;
use super::error::RequestError;
use super::types::{Page, SupportMessageRequest};

const API_PREFIX: &str = "/api/v1";

/// Collections that follow the uniform list/create/read/update/delete layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Patients,
    Appointments,
    Medications,
    Prescriptions,
    Factors,
    Insurances,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Users,
        Resource::Patients,
        Resource::Appointments,
        Resource::Medications,
        Resource::Prescriptions,
        Resource::Factors,
        Resource::Insurances,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Patients => "patients",
            Resource::Appointments => "appointments",
            Resource::Medications => "medications",
            Resource::Prescriptions => "prescriptions",
            Resource::Factors => "factors",
            Resource::Insurances => "insurances",
        }
    }

    /// `/api/v1/<r>/<r>/`
    pub fn collection_path(&self) -> String {
        format!("{}/{name}/{name}/", API_PREFIX, name = self.as_str())
    }

    /// `/api/v1/<r>/<r>/{id}`
    pub fn item_path(&self, id: u64) -> String {
        format!("{}/{name}/{name}/{}", API_PREFIX, id, name = self.as_str())
    }

    /// `/api/v1/<r>/<r>/my`, the caller's own records.
    pub fn mine_path(&self) -> String {
        format!("{}/{name}/{name}/my", API_PREFIX, name = self.as_str())
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Resource::ALL.iter().map(|r| r.as_str()).collect();
                format!("unknown resource '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Advanced report listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Patients,
    Factors,
    Prescriptions,
    Appointments,
}

impl Report {
    fn as_str(&self) -> &'static str {
        match self {
            Report::Patients => "patients",
            Report::Factors => "factors",
            Report::Prescriptions => "prescriptions",
            Report::Appointments => "appointments",
        }
    }
}

fn reports_base() -> String {
    format!("{}/reports/reports/advanced", API_PREFIX)
}

fn support_base() -> String {
    format!("{}/support/support", API_PREFIX)
}

fn settings_path() -> String {
    format!("{}/settings/settings/", API_PREFIX)
}

/// Append `pairs` as a percent-encoded query string. No `?` when empty.
fn with_query<'a>(path: String, pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        serializer.append_pair(key, &value);
        any = true;
    }
    if !any {
        return path;
    }
    format!("{}?{}", path, serializer.finish())
}

fn page_query(page: Page) -> [(&'static str, String); 2] {
    [("skip", page.skip.to_string()), ("limit", page.limit.to_string())]
}

impl ApiClient {
    // ========== Uniform collections ==========

    pub async fn list(&self, resource: Resource, page: Page) -> Result<Option<Value>, RequestError> {
        let path = with_query(resource.collection_path(), page_query(page));
        self.send(&path, Method::GET, None).await
    }

    pub async fn list_mine(
        &self,
        resource: Resource,
        page: Page,
    ) -> Result<Option<Value>, RequestError> {
        let path = with_query(resource.mine_path(), page_query(page));
        self.send(&path, Method::GET, None).await
    }

    pub async fn get(&self, resource: Resource, id: u64) -> Result<Option<Value>, RequestError> {
        self.send(&resource.item_path(id), Method::GET, None).await
    }

    pub async fn create<T>(&self, resource: Resource, body: &T) -> Result<Option<Value>, RequestError>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(&resource.collection_path(), Method::POST, body)
            .await
    }

    pub async fn update<T>(
        &self,
        resource: Resource,
        id: u64,
        body: &T,
    ) -> Result<Option<Value>, RequestError>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(&resource.item_path(id), Method::PUT, body)
            .await
    }

    pub async fn delete(&self, resource: Resource, id: u64) -> Result<Option<Value>, RequestError> {
        self.send(&resource.item_path(id), Method::DELETE, None).await
    }

    // ========== Users and patients ==========

    /// The user the access token belongs to.
    pub async fn current_user(&self) -> Result<Option<Value>, RequestError> {
        let path = format!("{}/users/users/me", API_PREFIX);
        self.send(&path, Method::GET, None).await
    }

    /// The patient record of the current user.
    pub async fn my_patient(&self) -> Result<Option<Value>, RequestError> {
        let path = format!("{}/patients/patients/me", API_PREFIX);
        self.send(&path, Method::GET, None).await
    }

    // ========== Medications ==========

    /// List medications, optionally filtered by name. An empty search is omitted.
    pub async fn search_medications(
        &self,
        page: Page,
        search: Option<&str>,
    ) -> Result<Option<Value>, RequestError> {
        let mut pairs = page_query(page).to_vec();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            pairs.push(("search", term.to_string()));
        }
        let path = with_query(Resource::Medications.collection_path(), pairs);
        self.send(&path, Method::GET, None).await
    }

    // ========== Settings ==========

    pub async fn settings(&self) -> Result<Option<Value>, RequestError> {
        self.send(&settings_path(), Method::GET, None).await
    }

    pub async fn create_settings<T>(&self, body: &T) -> Result<Option<Value>, RequestError>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(&settings_path(), Method::POST, body).await
    }

    pub async fn update_settings<T>(&self, body: &T) -> Result<Option<Value>, RequestError>
    where
        T: Serialize + ?Sized,
    {
        self.send_json(&settings_path(), Method::PUT, body).await
    }

    // ========== Reports ==========

    /// Fetch an advanced report. `filters` become query parameters
    /// (e.g. `start_date`, `end_date`, `status`).
    pub async fn report(
        &self,
        report: Report,
        filters: &[(&str, &str)],
    ) -> Result<Option<Value>, RequestError> {
        let path = with_query(
            format!("{}/{}", reports_base(), report.as_str()),
            filters.iter().map(|(k, v)| (*k, v.to_string())),
        );
        self.send(&path, Method::GET, None).await
    }

    pub async fn patient_report(&self, patient_id: u64) -> Result<Option<Value>, RequestError> {
        let path = format!("{}/patient/{}", reports_base(), patient_id);
        self.send(&path, Method::GET, None).await
    }

    // ========== Support ==========

    pub async fn support_chats(&self, page: Page) -> Result<Option<Value>, RequestError> {
        let path = with_query(format!("{}/chats", support_base()), page_query(page));
        self.send(&path, Method::GET, None).await
    }

    pub async fn create_support_chat(
        &self,
        subject: Option<&str>,
    ) -> Result<Option<Value>, RequestError> {
        let body = serde_json::json!({ "subject": subject });
        self.send_json(&format!("{}/chats", support_base()), Method::POST, &body)
            .await
    }

    pub async fn support_chat(&self, chat_id: u64) -> Result<Option<Value>, RequestError> {
        let path = format!("{}/chats/{}", support_base(), chat_id);
        self.send(&path, Method::GET, None).await
    }

    pub async fn close_support_chat(&self, chat_id: u64) -> Result<Option<Value>, RequestError> {
        let path = format!("{}/chats/{}/close", support_base(), chat_id);
        self.send(&path, Method::PUT, None).await
    }

    pub async fn send_support_message(
        &self,
        chat_id: u64,
        message: &str,
    ) -> Result<Option<Value>, RequestError> {
        let body = SupportMessageRequest {
            chat_id,
            message: message.to_string(),
        };
        self.send_json(&format!("{}/messages", support_base()), Method::POST, &body)
            .await
    }
}
