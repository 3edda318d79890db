//! Repo for discount_rules table. Rules are created by staff and read
//! through a role-scoped window; whether a rule is invisible or absent is
//! indistinguishable to the caller.
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{DiscountRule, ListingScope, NewDiscountRule, RuleId, User, UserId};
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::discount_rules::dsl as DiscountRules;
use schema::users::dsl as Users;

/// DiscountRules repository, responsible for handling discount_rules table
pub struct DiscountRulesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<DiscountRule>>,
    pub requestor: Option<User>,
}

pub trait DiscountRulesRepo {
    /// Creates new discount rule
    fn create(&self, payload: NewDiscountRule) -> RepoResult<DiscountRule>;

    /// Get discount rule, `None` when absent or out of the requestor scope
    fn find(&self, rule_id_arg: RuleId) -> RepoResult<Option<DiscountRule>>;

    /// List discount rules visible to the requestor
    fn list(&self) -> RepoResult<Vec<DiscountRule>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> DiscountRulesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<DiscountRule>>, requestor: Option<User>) -> Self {
        Self {
            db_conn,
            acl,
            requestor,
        }
    }

    fn list_visible(&self) -> RepoResult<Vec<DiscountRule>> {
        let values = match ListingScope::for_catalog(self.requestor.as_ref()) {
            ListingScope::All => DiscountRules::discount_rules
                .order(DiscountRules::id)
                .get_results(self.db_conn)
                .map_err(FailureError::from)?,
            ListingScope::BrandOwned(brand_id) => DiscountRules::discount_rules
                .filter(DiscountRules::brand_id.eq(brand_id))
                .order(DiscountRules::id)
                .get_results(self.db_conn)
                .map_err(FailureError::from)?,
            _ => vec![],
        };

        Ok(values)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> DiscountRulesRepo
    for DiscountRulesRepoImpl<'a, T>
{
    /// Creates new discount rule
    fn create(&self, payload: NewDiscountRule) -> RepoResult<DiscountRule> {
        debug!("Create new discount rule {:?}.", payload);

        acl::check(&*self.acl, Resource::DiscountRules, Action::Create, self, None)?;

        let query = diesel::insert_into(DiscountRules::discount_rules).values(&payload);
        query
            .get_result::<DiscountRule>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Creates new discount rule: {:?} error occurred", payload)).into())
    }

    /// Get discount rule
    fn find(&self, rule_id_arg: RuleId) -> RepoResult<Option<DiscountRule>> {
        debug!("Find in discount rules with id {}.", rule_id_arg);
        let query = DiscountRules::discount_rules.filter(DiscountRules::id.eq(rule_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<DiscountRule>| match value {
                // an out-of-scope rule looks exactly like a missing one
                Some(value) => {
                    if acl::check(&*self.acl, Resource::DiscountRules, Action::Read, self, Some(&value)).is_ok() {
                        Ok(Some(value))
                    } else {
                        Ok(None)
                    }
                }
                None => Ok(None),
            })
            .map_err(|e: FailureError| e.context(format!("Find discount rule by id: {} error occurred", rule_id_arg)).into())
    }

    /// List discount rules visible to the requestor
    fn list(&self) -> RepoResult<Vec<DiscountRule>> {
        debug!("Find all discount rules visible to requestor.");

        self.list_visible()
            .and_then(|values| {
                for value in &values {
                    acl::check(&*self.acl, Resource::DiscountRules, Action::Read, self, Some(value))?;
                }

                Ok(values)
            })
            .map_err(|e: FailureError| e.context("List discount rules").into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, DiscountRule>
    for DiscountRulesRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&DiscountRule>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(rule) = obj {
                    Users::users
                        .filter(Users::id.eq(user_id))
                        .get_result::<User>(self.db_conn)
                        .map(|user| user.brand_id == Some(rule.brand_id))
                        .ok()
                        .unwrap_or(false)
                } else {
                    false
                }
            }
        }
    }
}
