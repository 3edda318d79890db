//! Roles a user can act under. Derived from the flags on the user
//! record, not stored separately: staff and brand are additive, a user
//! with neither flag acts as a plain `User`.
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Role {
    Staff,
    Brand,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Role::Staff => write!(f, "staff"),
            Role::Brand => write!(f, "brand"),
            Role::User => write!(f, "user"),
        }
    }
}
