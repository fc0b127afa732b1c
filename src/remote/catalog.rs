use std::{fmt, marker::PhantomData, str::FromStr, sync::Arc};

use serde::de::DeserializeOwned;

use crate::{
    error::ApiError,
    management::{PageSource, QuerySignature},
    remote::HttpClient,
    types::ListResponse,
};

pub const TRAINEE_FILTERS: &[&str] = &["major", "university", "city"];
pub const COMPANY_FILTERS: &[&str] = &["industry", "city", "size"];
pub const USER_FILTERS: &[&str] = &["role", "status"];

/// One of the browsable catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Trainees,
    Companies,
    Users,
}

impl Resource {
    /// Path of the list endpoint, relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Trainees => "trainees",
            Resource::Companies => "companies",
            Resource::Users => "admin/users",
        }
    }

    /// The fixed filter keys of this view.
    pub fn filter_keys(self) -> &'static [&'static str] {
        match self {
            Resource::Trainees => TRAINEE_FILTERS,
            Resource::Companies => COMPANY_FILTERS,
            Resource::Users => USER_FILTERS,
        }
    }

    /// The list endpoint without a search term, the search endpoint with one.
    pub fn endpoint(self, signature: &QuerySignature) -> String {
        match signature.search() {
            Some(_) => format!("{}/search", self.path()),
            None => self.path().to_string(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Trainees => "trainees",
            Resource::Companies => "companies",
            Resource::Users => "users",
        };
        f.write_str(name)
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trainees" | "trainee" => Ok(Resource::Trainees),
            "companies" | "company" => Ok(Resource::Companies),
            "users" | "user" | "admin" => Ok(Resource::Users),
            other => Err(format!(
                "unknown catalog `{other}`, expected trainees, companies or users"
            )),
        }
    }
}

/// Fetches pages of one catalog through the shared [`HttpClient`].
pub struct CatalogSource<T> {
    client: Arc<HttpClient>,
    resource: Resource,
    _item: PhantomData<fn() -> T>,
}

impl<T> CatalogSource<T> {
    pub fn new(client: Arc<HttpClient>, resource: Resource) -> Self {
        Self {
            client,
            resource,
            _item: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }
}

impl<T> PageSource for CatalogSource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(&self, signature: &QuerySignature) -> Result<ListResponse<T>, ApiError> {
        let path = self.resource.endpoint(signature);
        self.client.get_json(&path, signature.query_pairs()).await
    }
}
