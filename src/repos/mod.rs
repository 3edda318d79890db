//! Repos is a module responsible for interacting with postgres db

#[macro_use]
pub mod acl;
pub mod brands;
pub mod code_usages;
pub mod discount_codes;
pub mod discount_rules;
pub mod repo_factory;
pub mod types;
pub mod users;

pub use self::acl::*;
pub use self::brands::*;
pub use self::code_usages::*;
pub use self::discount_codes::*;
pub use self::discount_rules::*;
pub use self::repo_factory::*;
pub use self::types::*;
pub use self::users::*;
