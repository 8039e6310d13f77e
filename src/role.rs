use bson::Bson;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Elevated user roles. Students carry no role at all.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
        }
    }

    /// True only when `stored` is exactly this role's name.
    pub fn matches(self, stored: Option<&str>) -> bool {
        stored == Some(self.as_str())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for Bson {
    fn from(role: Role) -> Self {
        Bson::String(role.as_str().to_string())
    }
}
