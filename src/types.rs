use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trainee,
    Company,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Trainee => "trainee",
            Role::Company => "company",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
    #[serde(default)]
    pub profile: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Pagination block of a list envelope, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// `{ data, pagination }` envelope shared by the list and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainee {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// An entity that can be listed by the CLI as a table row.
pub trait Listable: DeserializeOwned + Clone + Send + Sync + 'static {
    type Row: Tabled;

    fn to_row(&self) -> Self::Row;
}

#[derive(Tabled)]
pub struct TraineeTableRow {
    pub name: String,
    pub major: String,
    pub university: String,
    pub city: String,
}

#[derive(Tabled)]
pub struct CompanyTableRow {
    pub name: String,
    pub industry: String,
    pub city: String,
    pub size: String,
}

#[derive(Tabled)]
pub struct UserTableRow {
    pub email: String,
    pub name: String,
    pub role: String,
    pub active: String,
}

fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

impl Listable for Trainee {
    type Row = TraineeTableRow;

    fn to_row(&self) -> TraineeTableRow {
        TraineeTableRow {
            name: format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
            major: or_dash(&self.major),
            university: or_dash(&self.university),
            city: or_dash(&self.city),
        }
    }
}

impl Listable for Company {
    type Row = CompanyTableRow;

    fn to_row(&self) -> CompanyTableRow {
        CompanyTableRow {
            name: self.name.clone(),
            industry: or_dash(&self.industry),
            city: or_dash(&self.city),
            size: or_dash(&self.size),
        }
    }
}

impl Listable for AdminUser {
    type Row = UserTableRow;

    fn to_row(&self) -> UserTableRow {
        UserTableRow {
            email: self.email.clone(),
            name: or_dash(&self.name),
            role: or_dash(&self.role),
            active: match self.active {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => "-".to_string(),
            },
        }
    }
}
