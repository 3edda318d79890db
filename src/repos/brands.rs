//! Repo for brands table.
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{Brand, BrandId, NewBrand, User, UserId};
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use schema::brands::dsl as Brands;
use schema::users::dsl as Users;

/// Brands repository, responsible for handling brands table
pub struct BrandsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Brand>>,
}

pub trait BrandsRepo {
    /// Creates new brand
    fn create(&self, payload: NewBrand) -> RepoResult<Brand>;

    /// Get brand
    fn find(&self, brand_id_arg: BrandId) -> RepoResult<Option<Brand>>;

    /// List all brands
    fn list(&self) -> RepoResult<Vec<Brand>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> BrandsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Brand>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> BrandsRepo for BrandsRepoImpl<'a, T> {
    /// Creates new brand
    fn create(&self, payload: NewBrand) -> RepoResult<Brand> {
        debug!("Create new brand {:?}.", payload);

        acl::check(&*self.acl, Resource::Brands, Action::Create, self, None)?;

        let query = diesel::insert_into(Brands::brands).values(&payload);
        query
            .get_result::<Brand>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Creates new brand: {:?} error occurred", payload)).into())
    }

    /// Get brand
    fn find(&self, brand_id_arg: BrandId) -> RepoResult<Option<Brand>> {
        debug!("Find in brands with id {}.", brand_id_arg);
        let query = Brands::brands.filter(Brands::id.eq(brand_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Brand>| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::Brands, Action::Read, self, Some(value))?;
                };

                Ok(value)
            })
            .map_err(|e: FailureError| e.context(format!("Find brand by id: {} error occurred", brand_id_arg)).into())
    }

    /// List all brands
    fn list(&self) -> RepoResult<Vec<Brand>> {
        debug!("Find all brands.");
        let query = Brands::brands.order(Brands::id);

        query
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Brand>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Brands, Action::Read, self, Some(value))?;
                }

                Ok(values)
            })
            .map_err(|e: FailureError| e.context("List all brands").into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Brand>
    for BrandsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Brand>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(brand) = obj {
                    Users::users
                        .filter(Users::id.eq(user_id))
                        .get_result::<User>(self.db_conn)
                        .map(|user| user.brand_id == Some(brand.id))
                        .ok()
                        .unwrap_or(false)
                } else {
                    false
                }
            }
        }
    }
}
