//! Traits for the access control layer. `Acl` answers whether the acting
//! user may perform an action on a resource; `CheckScope` is implemented
//! by every repository that knows how to resolve ownership of its records.

use models::UserId;

pub trait Acl<Resource, Action, Scope, Error, T> {
    /// Tells if a user with this ACL can do `action` on `resource`.
    /// `obj` is the concrete record the action targets, when one exists.
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        scope_checker: &CheckScope<Scope, T>,
        obj: Option<&T>,
    ) -> Result<bool, Error>;
}

/// `SystemACL` allows all manipulations with resources in all cases. For
/// internal lookups that run before the acting user's roles are known.
#[derive(Clone, Debug, Default)]
pub struct SystemACL;

impl<Resource, Action, Scope, Error, T> Acl<Resource, Action, Scope, Error, T> for SystemACL {
    fn allows(
        &self,
        _resource: Resource,
        _action: Action,
        _scope_checker: &CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, Error> {
        Ok(true)
    }
}

pub trait CheckScope<Scope, T> {
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&T>) -> bool;
}
