//! Enum for resources available in ACLs
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resource {
    Users,
    Brands,
    DiscountRules,
    DiscountCodes,
    CodeUsages,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Resource::Users => write!(f, "users"),
            Resource::Brands => write!(f, "brands"),
            Resource::DiscountRules => write!(f, "discount rules"),
            Resource::DiscountCodes => write!(f, "discount codes"),
            Resource::CodeUsages => write!(f, "code usages"),
        }
    }
}
