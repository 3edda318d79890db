//! Models for working with authorization (acl - access control list)

pub mod action;
pub mod listing;
pub mod permission;
pub mod resource;
pub mod role;
pub mod scope;

pub use self::action::Action;
pub use self::listing::ListingScope;
pub use self::permission::Permission;
pub use self::resource::Resource;
pub use self::role::Role;
pub use self::scope::Scope;
