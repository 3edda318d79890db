//! Repos is a module responsible for interacting with access control lists
//! Authorization module contains authorization logic for the repo layer app

#[macro_use]
pub mod macros;
pub mod legacy_acl;
pub mod roles_cache;

pub use self::roles_cache::RolesCacheImpl;

use std::collections::HashMap;
use std::rc::Rc;

use errors::Error;
use failure::Error as FailureError;

use self::legacy_acl::{Acl, CheckScope};

use models::authorization::*;
use models::UserId;

pub fn check<T>(
    acl: &Acl<Resource, Action, Scope, FailureError, T>,
    resource: Resource,
    action: Action,
    scope_checker: &CheckScope<Scope, T>,
    obj: Option<&T>,
) -> Result<(), FailureError> {
    acl.allows(resource, action, scope_checker, obj).and_then(|allowed| {
        if allowed {
            Ok(())
        } else {
            Err(format_err!("Denied request to do {} on {}", action, resource)
                .context(Error::Forbidden)
                .into())
        }
    })
}

/// ApplicationAcl contains main logic for manipulation with resources.
/// Permissions are keyed by role; `Scope::Owned` entries delegate the
/// ownership decision to the calling repo's `CheckScope`.
#[derive(Clone)]
pub struct ApplicationAcl {
    acls: Rc<HashMap<Role, Vec<Permission>>>,
    roles: Vec<Role>,
    user_id: UserId,
}

impl ApplicationAcl {
    pub fn new(roles: Vec<Role>, user_id: UserId) -> Self {
        let mut hash = ::std::collections::HashMap::new();
        hash.insert(
            Role::Staff,
            vec![
                permission!(Resource::Users, Action::Read),
                permission!(Resource::Users, Action::Create),
                permission!(Resource::Users, Action::Update, Scope::Owned),
                permission!(Resource::Users, Action::Delete),
                permission!(Resource::Brands),
                permission!(Resource::DiscountRules),
                permission!(Resource::DiscountCodes, Action::Read),
                permission!(Resource::DiscountCodes, Action::Create),
                permission!(Resource::CodeUsages, Action::Read),
            ],
        );
        hash.insert(
            Role::Brand,
            vec![
                permission!(Resource::Users, Action::Read),
                permission!(Resource::Users, Action::Update, Scope::Owned),
                permission!(Resource::Brands, Action::Read),
                permission!(Resource::DiscountRules, Action::Read, Scope::Owned),
                permission!(Resource::DiscountCodes, Action::Read),
                permission!(Resource::DiscountCodes, Action::Create, Scope::Owned),
                permission!(Resource::CodeUsages, Action::Read, Scope::Owned),
            ],
        );
        hash.insert(
            Role::User,
            vec![
                permission!(Resource::Users, Action::Read),
                permission!(Resource::Users, Action::Update, Scope::Owned),
                permission!(Resource::Brands, Action::Read),
                permission!(Resource::DiscountCodes, Action::Read),
                permission!(Resource::CodeUsages, Action::Read, Scope::Owned),
                permission!(Resource::CodeUsages, Action::Create, Scope::Owned),
            ],
        );

        ApplicationAcl {
            acls: Rc::new(hash),
            roles,
            user_id,
        }
    }
}

impl<T> Acl<Resource, Action, Scope, FailureError, T> for ApplicationAcl {
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        scope_checker: &CheckScope<Scope, T>,
        obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        let empty: Vec<Permission> = Vec::new();
        let user_id = &self.user_id;
        let hashed_acls = self.acls.clone();
        let acls = self
            .roles
            .iter()
            .flat_map(|role| hashed_acls.get(role).unwrap_or(&empty))
            .filter(|permission| {
                (permission.resource == resource) && ((permission.action == action) || (permission.action == Action::All))
            })
            .filter(|permission| scope_checker.is_in_scope(*user_id, &permission.scope, obj));

        if acls.count() > 0 {
            Ok(true)
        } else {
            error!("Denied request from user {} to do {} on {}.", user_id, action, resource);
            Ok(false)
        }
    }
}

/// UnauthorizedAcl contains main logic for manipulation with resources
/// for unauthorized users: nothing in this domain is visible or mutable
/// without a principal.
#[derive(Clone, Default)]
pub struct UnauthorizedAcl;

impl<T> Acl<Resource, Action, Scope, FailureError, T> for UnauthorizedAcl {
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        _scope_checker: &CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        error!("Denied unauthorized request to do {} on {}.", action, resource);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use failure::Error as FailureError;

    use models::*;
    use repos::legacy_acl::{Acl, CheckScope};
    use repos::*;

    // Fixtures: rule 1 belongs to the brand of user 2; user 3 is plain.
    const BRAND_USER: UserId = UserId(2);
    const PLAIN_USER: UserId = UserId(3);

    fn create_code(rule_id: i32) -> DiscountCode {
        DiscountCode {
            id: DiscountCodeId::from("foo2022"),
            rule_id: RuleId(rule_id),
            valid_until: ::chrono::Utc::today().naive_utc(),
        }
    }

    fn create_rule(brand_id: i32) -> DiscountRule {
        DiscountRule {
            id: RuleId(1),
            brand_id: BrandId(brand_id),
            discount: 50,
        }
    }

    fn create_usage(user_id: UserId) -> CodeUsage {
        CodeUsage {
            id: CodeUsageId::derive(&DiscountCodeId::from("foo2022"), user_id),
            discount_code_id: DiscountCodeId::from("foo2022"),
            user_id,
            used_at: SystemTime::now(),
        }
    }

    #[derive(Default)]
    struct ScopeChecker;

    impl CheckScope<Scope, DiscountCode> for ScopeChecker {
        fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&DiscountCode>) -> bool {
            match *scope {
                Scope::All => true,
                Scope::Owned => {
                    if let Some(code) = obj {
                        user_id == BRAND_USER && code.rule_id == RuleId(1)
                    } else {
                        false
                    }
                }
            }
        }
    }

    impl CheckScope<Scope, DiscountRule> for ScopeChecker {
        fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&DiscountRule>) -> bool {
            match *scope {
                Scope::All => true,
                Scope::Owned => {
                    if let Some(rule) = obj {
                        user_id == BRAND_USER && rule.brand_id == BrandId(1)
                    } else {
                        false
                    }
                }
            }
        }
    }

    impl CheckScope<Scope, CodeUsage> for ScopeChecker {
        fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&CodeUsage>) -> bool {
            match *scope {
                Scope::All => true,
                Scope::Owned => {
                    if let Some(usage) = obj {
                        usage.user_id == user_id
                    } else {
                        false
                    }
                }
            }
        }
    }

    fn allows<T>(
        acl: &Acl<Resource, Action, Scope, FailureError, T>,
        resource: Resource,
        action: Action,
        obj: Option<&T>,
    ) -> bool
    where
        ScopeChecker: CheckScope<Scope, T>,
    {
        let s = ScopeChecker::default();
        acl.allows(resource, action, &s, obj).unwrap()
    }

    #[test]
    fn test_staff_permissions() {
        let acl = ApplicationAcl::new(vec![Role::Staff], UserId(1));
        let code = create_code(7);
        let rule = create_rule(7);
        let usage = create_usage(PLAIN_USER);

        assert!(allows(&acl, Resource::DiscountRules, Action::Read, Some(&rule)));
        assert!(allows(&acl, Resource::DiscountRules, Action::Create, Some(&rule)));
        assert!(allows(&acl, Resource::DiscountCodes, Action::Create, Some(&code)));
        assert!(allows(&acl, Resource::CodeUsages, Action::Read, Some(&usage)));
        // staff never redeem
        assert!(!allows(&acl, Resource::CodeUsages, Action::Create, Some(&usage)));
    }

    #[test]
    fn test_brand_permissions() {
        let acl = ApplicationAcl::new(vec![Role::Brand], BRAND_USER);
        let own_code = create_code(1);
        let foreign_code = create_code(7);
        let own_rule = create_rule(1);
        let foreign_rule = create_rule(7);
        let usage = create_usage(BRAND_USER);

        // codes are fetchable by id by anyone, but only created for own rules
        assert!(allows(&acl, Resource::DiscountCodes, Action::Read, Some(&foreign_code)));
        assert!(allows(&acl, Resource::DiscountCodes, Action::Create, Some(&own_code)));
        assert!(!allows(&acl, Resource::DiscountCodes, Action::Create, Some(&foreign_code)));

        assert!(allows(&acl, Resource::DiscountRules, Action::Read, Some(&own_rule)));
        assert!(!allows(&acl, Resource::DiscountRules, Action::Read, Some(&foreign_rule)));
        assert!(!allows(&acl, Resource::DiscountRules, Action::Create, Some(&own_rule)));

        // brands never redeem, not even "their own" usage row
        assert!(!allows(&acl, Resource::CodeUsages, Action::Create, Some(&usage)));
    }

    #[test]
    fn test_plain_user_permissions() {
        let acl = ApplicationAcl::new(vec![Role::User], PLAIN_USER);
        let code = create_code(1);
        let rule = create_rule(1);
        let own_usage = create_usage(PLAIN_USER);
        let foreign_usage = create_usage(UserId(4));

        assert!(allows(&acl, Resource::DiscountCodes, Action::Read, Some(&code)));
        assert!(!allows(&acl, Resource::DiscountCodes, Action::Create, Some(&code)));
        assert!(!allows(&acl, Resource::DiscountRules, Action::Read, Some(&rule)));

        assert!(allows(&acl, Resource::CodeUsages, Action::Create, Some(&own_usage)));
        assert!(allows(&acl, Resource::CodeUsages, Action::Read, Some(&own_usage)));
        assert!(!allows(&acl, Resource::CodeUsages, Action::Create, Some(&foreign_usage)));
        assert!(!allows(&acl, Resource::CodeUsages, Action::Read, Some(&foreign_usage)));
    }

    #[test]
    fn test_staff_brand_hybrid_cannot_redeem() {
        let acl = ApplicationAcl::new(vec![Role::Staff, Role::Brand], BRAND_USER);
        let usage = create_usage(BRAND_USER);

        assert!(allows(&acl, Resource::CodeUsages, Action::Read, Some(&usage)));
        assert!(!allows(&acl, Resource::CodeUsages, Action::Create, Some(&usage)));
    }

    #[test]
    fn test_unauthorized_denies_everything() {
        let acl = UnauthorizedAcl::default();
        let code = create_code(1);

        assert!(!allows(&acl, Resource::DiscountCodes, Action::Read, Some(&code)));
        assert!(!allows(&acl, Resource::DiscountCodes, Action::Create, Some(&code)));
        let usage = create_usage(PLAIN_USER);
        assert!(!allows(&acl, Resource::CodeUsages, Action::Create, Some(&usage)));
    }
}
