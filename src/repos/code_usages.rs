//! Repo for code_usages table. Rows are append-only; the single-use
//! guarantee lives here: the primary key is derived from the
//! `(code, user)` pair and the pair itself is unique, so a concurrent
//! double redemption is stopped by the storage layer and surfaces as the
//! same validation error the pre-check would have produced.
use std::time::SystemTime;

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::result::DatabaseErrorKind;
use diesel::result::Error as DieselError;
use diesel::Connection;
use failure::Error as FailureError;

use errors::Error;
use models::authorization::*;
use models::{CodeUsage, CodeUsageId, DiscountCode, DiscountCodeId, DiscountRule, ListingScope, NewCodeUsage, User, UserId};
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::code_usages::dsl as CodeUsages;
use schema::discount_codes::dsl as DiscountCodes;
use schema::discount_rules::dsl as DiscountRules;
use schema::users::dsl as Users;

/// CodeUsages repository, responsible for handling code_usages table
pub struct CodeUsagesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<CodeUsage>>,
    pub requestor: Option<User>,
}

pub trait CodeUsagesRepo {
    /// Creates new code usage
    fn create(&self, payload: NewCodeUsage) -> RepoResult<CodeUsage>;

    /// Get code usage, `None` when absent or out of the requestor scope
    fn find(&self, usage_id_arg: CodeUsageId) -> RepoResult<Option<CodeUsage>>;

    /// List code usages visible to the requestor
    fn list(&self) -> RepoResult<Vec<CodeUsage>>;

    /// Check whether the user has already used the code
    fn user_used_code(&self, code_id_arg: DiscountCodeId, user_id_arg: UserId) -> RepoResult<bool>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CodeUsagesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<CodeUsage>>, requestor: Option<User>) -> Self {
        Self {
            db_conn,
            acl,
            requestor,
        }
    }

    fn list_visible(&self) -> RepoResult<Vec<CodeUsage>> {
        let values = match ListingScope::for_usages(self.requestor.as_ref()) {
            ListingScope::All => CodeUsages::code_usages
                .order(CodeUsages::id)
                .get_results(self.db_conn)
                .map_err(FailureError::from)?,
            ListingScope::BrandOwned(brand_id) => CodeUsages::code_usages
                .inner_join(DiscountCodes::discount_codes.inner_join(DiscountRules::discount_rules))
                .filter(DiscountRules::brand_id.eq(brand_id))
                .order(CodeUsages::id)
                .get_results::<(CodeUsage, (DiscountCode, DiscountRule))>(self.db_conn)
                .map_err(FailureError::from)?
                .into_iter()
                .map(|(usage, _)| usage)
                .collect(),
            ListingScope::UserOwned(user_id) => CodeUsages::code_usages
                .filter(CodeUsages::user_id.eq(user_id))
                .order(CodeUsages::id)
                .get_results(self.db_conn)
                .map_err(FailureError::from)?,
            ListingScope::Nothing => vec![],
        };

        Ok(values)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CodeUsagesRepo
    for CodeUsagesRepoImpl<'a, T>
{
    /// Creates new code usage. The id is recomputed from the
    /// `(code, user)` pair and the authorization check runs against the
    /// candidate record, before anything is written. `used_at` is stamped
    /// by the database at commit.
    fn create(&self, payload: NewCodeUsage) -> RepoResult<CodeUsage> {
        debug!("Create new code usage {:?}.", payload);
        let mut payload = payload;
        payload.id = CodeUsageId::derive(&payload.discount_code_id, payload.user_id);

        let candidate = CodeUsage {
            id: payload.id.clone(),
            discount_code_id: payload.discount_code_id.clone(),
            user_id: payload.user_id,
            used_at: SystemTime::now(),
        };
        acl::check(&*self.acl, Resource::CodeUsages, Action::Create, self, Some(&candidate))?;

        let query = diesel::insert_into(CodeUsages::code_usages).values(&payload);
        query
            .get_result::<CodeUsage>(self.db_conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => Error::Validate(validation_errors!({
                    "discount_code": ["used" => "Discount code has already been used"]
                }))
                .into(),
                e => FailureError::from(e),
            })
            .map_err(|e: FailureError| e.context(format!("Creates new code usage: {:?} error occurred", payload)).into())
    }

    /// Get code usage
    fn find(&self, usage_id_arg: CodeUsageId) -> RepoResult<Option<CodeUsage>> {
        debug!("Find in code usages with id {}.", usage_id_arg);
        let query = CodeUsages::code_usages.filter(CodeUsages::id.eq(&usage_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<CodeUsage>| match value {
                // an out-of-scope usage looks exactly like a missing one
                Some(value) => {
                    if acl::check(&*self.acl, Resource::CodeUsages, Action::Read, self, Some(&value)).is_ok() {
                        Ok(Some(value))
                    } else {
                        Ok(None)
                    }
                }
                None => Ok(None),
            })
            .map_err(|e: FailureError| e.context(format!("Find code usage by id: {} error occurred", usage_id_arg)).into())
    }

    /// List code usages visible to the requestor
    fn list(&self) -> RepoResult<Vec<CodeUsage>> {
        debug!("Find all code usages visible to requestor.");

        self.list_visible()
            .and_then(|values| {
                for value in &values {
                    acl::check(&*self.acl, Resource::CodeUsages, Action::Read, self, Some(value))?;
                }

                Ok(values)
            })
            .map_err(|e: FailureError| e.context("List code usages").into())
    }

    /// Check whether the user has already used the code
    fn user_used_code(&self, code_id_arg: DiscountCodeId, user_id_arg: UserId) -> RepoResult<bool> {
        debug!("Check code {} for user {}.", code_id_arg, user_id_arg);

        let query = CodeUsages::code_usages
            .filter(CodeUsages::discount_code_id.eq(&code_id_arg))
            .filter(CodeUsages::user_id.eq(user_id_arg));

        query
            .get_result::<CodeUsage>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<CodeUsage>| match value {
                Some(value) => {
                    acl::check(&*self.acl, Resource::CodeUsages, Action::Read, self, Some(&value))?;
                    Ok(true)
                }
                None => Ok(false),
            })
            .map_err(|e: FailureError| {
                e.context(format!("Check code {} for user {} error occurred", code_id_arg, user_id_arg))
                    .into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, CodeUsage>
    for CodeUsagesRepoImpl<'a, T>
{
    /// A usage is owned by the user who redeemed it and by the brand whose
    /// rule the code belongs to. The union is exact: brands cannot redeem
    /// and plain users carry no brand.
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&CodeUsage>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(usage) = obj {
                    if usage.user_id == user_id {
                        return true;
                    }

                    let brand_id = Users::users
                        .filter(Users::id.eq(user_id))
                        .get_result::<User>(self.db_conn)
                        .ok()
                        .and_then(|user| user.brand_id);

                    match brand_id {
                        Some(brand_id) => DiscountCodes::discount_codes
                            .inner_join(DiscountRules::discount_rules)
                            .filter(DiscountCodes::id.eq(&usage.discount_code_id))
                            .filter(DiscountRules::brand_id.eq(brand_id))
                            .get_result::<(DiscountCode, DiscountRule)>(self.db_conn)
                            .is_ok(),
                        None => false,
                    }
                } else {
                    false
                }
            }
        }
    }
}
