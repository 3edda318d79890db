//! Models contains all structures that are used in different
//! modules of the app

pub mod authorization;
pub mod brand;
pub mod code_usage;
pub mod discount_code;
pub mod discount_rule;
pub mod types;
pub mod user;
pub mod validation_rules;

pub use self::authorization::*;
pub use self::brand::*;
pub use self::code_usage::*;
pub use self::discount_code::*;
pub use self::discount_rule::*;
pub use self::types::*;
pub use self::user::*;
pub use self::validation_rules::*;
