//! Model users - the principals requests act under. Staff and brand
//! membership are flags on the record; everything else in the app derives
//! roles from them through `User::roles`.
use validator::Validate;

use models::{BrandId, Role, UserId};

use schema::users;

#[derive(Debug, Serialize, Deserialize, Queryable, Clone, Identifiable)]
#[table_name = "users"]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_staff: bool,
    pub is_brand: bool,
    pub brand_id: Option<BrandId>,
}

impl User {
    /// Roles the user acts under. The flags are additive; a user with
    /// neither flag is a plain `User`.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::new();
        if self.is_staff {
            roles.push(Role::Staff);
        }
        if self.is_brand {
            roles.push(Role::Brand);
        }
        if roles.is_empty() {
            roles.push(Role::User);
        }
        roles
    }
}

/// Payload for creating user
#[derive(Serialize, Deserialize, Insertable, Clone, Validate, Debug)]
#[table_name = "users"]
pub struct NewUser {
    #[validate(length(min = "1", max = "150"))]
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_brand: bool,
    pub brand_id: Option<BrandId>,
}

impl NewUser {
    /// A brand flag without a brand reference is silently dropped at save
    /// time, never rejected.
    pub fn normalize(mut self) -> Self {
        if self.is_brand && self.brand_id.is_none() {
            self.is_brand = false;
        }
        self
    }
}

/// Payload for updating user
#[derive(Serialize, Deserialize, AsChangeset, Validate, Debug)]
#[table_name = "users"]
pub struct UpdateUser {
    #[validate(length(min = "1", max = "150"))]
    pub username: Option<String>,
}
