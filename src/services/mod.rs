//! Services is a core layer for the app business logic like
//! validation, authorization, etc.

pub mod brands;
pub mod code_usages;
pub mod discount_codes;
pub mod discount_rules;
pub mod types;
pub mod users;

pub use self::brands::*;
pub use self::code_usages::*;
pub use self::discount_codes::*;
pub use self::discount_rules::*;
pub use self::types::*;
pub use self::users::*;
