//! Repo for discount_codes table. Codes are fetchable by id by any
//! authenticated user, but listings are narrowed to the requestor's role.
use chrono::Utc;
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
use models::{DiscountCode, DiscountCodeId, DiscountRule, ListingScope, NewDiscountCode, User, UserId};
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::discount_codes::dsl as DiscountCodes;
use schema::discount_rules::dsl as DiscountRules;
use schema::users::dsl as Users;

/// DiscountCodes repository, responsible for handling discount_codes table
pub struct DiscountCodesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<DiscountCode>>,
    pub requestor: Option<User>,
}

pub trait DiscountCodesRepo {
    /// Creates new discount code
    fn create(&self, payload: NewDiscountCode) -> RepoResult<DiscountCode>;

    /// Get discount code by its id (the code itself)
    fn find(&self, code_id_arg: DiscountCodeId) -> RepoResult<Option<DiscountCode>>;

    /// List discount codes visible to the requestor
    fn list(&self) -> RepoResult<Vec<DiscountCode>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> DiscountCodesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<DiscountCode>>, requestor: Option<User>) -> Self {
        Self {
            db_conn,
            acl,
            requestor,
        }
    }

    fn list_visible(&self) -> RepoResult<Vec<DiscountCode>> {
        let values = match ListingScope::for_catalog(self.requestor.as_ref()) {
            ListingScope::All => DiscountCodes::discount_codes
                .order(DiscountCodes::id)
                .get_results(self.db_conn)
                .map_err(FailureError::from)?,
            ListingScope::BrandOwned(brand_id) => DiscountCodes::discount_codes
                .inner_join(DiscountRules::discount_rules)
                .filter(DiscountRules::brand_id.eq(brand_id))
                .order(DiscountCodes::id)
                .get_results::<(DiscountCode, DiscountRule)>(self.db_conn)
                .map_err(FailureError::from)?
                .into_iter()
                .map(|(code, _)| code)
                .collect(),
            _ => vec![],
        };

        Ok(values)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> DiscountCodesRepo
    for DiscountCodesRepoImpl<'a, T>
{
    /// Creates new discount code. The authorization check runs against the
    /// candidate record built from the payload, before anything is written.
    fn create(&self, payload: NewDiscountCode) -> RepoResult<DiscountCode> {
        debug!("Create new discount code {:?}.", payload);
        let mut payload = payload;
        if payload.valid_until.is_none() {
            payload.valid_until = Some(Utc::today().naive_utc());
        }

        let candidate = DiscountCode {
            id: payload.id.clone(),
            rule_id: payload.rule_id,
            valid_until: payload.valid_until.unwrap_or_else(|| Utc::today().naive_utc()),
        };
        acl::check(&*self.acl, Resource::DiscountCodes, Action::Create, self, Some(&candidate))?;

        let query = diesel::insert_into(DiscountCodes::discount_codes).values(&payload);
        query
            .get_result::<DiscountCode>(self.db_conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => Error::Validate(validation_errors!({
                    "id": ["exists" => "Discount code with this id already exists"]
                }))
                .into(),
                e => FailureError::from(e),
            })
            .map_err(|e: FailureError| e.context(format!("Creates new discount code: {:?} error occurred", payload)).into())
    }

    /// Get discount code by its id
    fn find(&self, code_id_arg: DiscountCodeId) -> RepoResult<Option<DiscountCode>> {
        debug!("Find in discount codes with id {}.", code_id_arg);
        let query = DiscountCodes::discount_codes.filter(DiscountCodes::id.eq(&code_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<DiscountCode>| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::DiscountCodes, Action::Read, self, Some(value))?;
                };

                Ok(value)
            })
            .map_err(|e: FailureError| e.context(format!("Find discount code by id: {} error occurred", code_id_arg)).into())
    }

    /// List discount codes visible to the requestor
    fn list(&self) -> RepoResult<Vec<DiscountCode>> {
        debug!("Find all discount codes visible to requestor.");

        self.list_visible()
            .and_then(|values| {
                for value in &values {
                    acl::check(&*self.acl, Resource::DiscountCodes, Action::Read, self, Some(value))?;
                }

                Ok(values)
            })
            .map_err(|e: FailureError| e.context("List discount codes").into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, DiscountCode>
    for DiscountCodesRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&DiscountCode>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(code) = obj {
                    let brand_id = Users::users
                        .filter(Users::id.eq(user_id))
                        .get_result::<User>(self.db_conn)
                        .ok()
                        .and_then(|user| user.brand_id);

                    match brand_id {
                        Some(brand_id) => DiscountRules::discount_rules
                            .filter(DiscountRules::id.eq(code.rule_id))
                            .filter(DiscountRules::brand_id.eq(brand_id))
                            .get_result::<DiscountRule>(self.db_conn)
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
