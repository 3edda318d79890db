//! Brands Services, presents CRUD operations with brands. Brands are
//! created by staff and never updated or deleted afterwards.
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use r2d2::ManageConnection;
use validator::Validate;

use errors::Error;
use models::{Brand, BrandId, NewBrand};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait BrandsService {
    /// Creates new brand
    fn create_brand(&self, payload: NewBrand) -> ServiceFuture<Brand>;
    /// Returns brand by id
    fn get_brand(&self, brand_id_arg: BrandId) -> ServiceFuture<Option<Brand>>;
    /// Returns all brands
    fn list_brands(&self) -> ServiceFuture<Vec<Brand>>;
    /// Update is not part of the exposed surface
    fn update_brand(&self, brand_id_arg: BrandId) -> ServiceFuture<Brand>;
    /// Delete is not part of the exposed surface
    fn delete_brand(&self, brand_id_arg: BrandId) -> ServiceFuture<Brand>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > BrandsService for Service<T, M, F>
{
    /// Creates new brand
    fn create_brand(&self, payload: NewBrand) -> ServiceFuture<Brand> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to create brand for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        if let Err(errors) = payload.validate() {
            return Box::new(future::err(
                format_err!("Validation of NewBrand failed.")
                    .context(Error::Validate(errors))
                    .into(),
            ));
        }

        self.spawn_on_pool(move |conn| {
            let brands_repo = repo_factory.create_brands_repo(&*conn, Some(user_id));
            conn.transaction::<Brand, FailureError, _>(move || brands_repo.create(payload))
                .map_err(|e| e.context("Service Brands, create_brand endpoint error occurred.").into())
        })
    }

    /// Returns brand by id
    fn get_brand(&self, brand_id_arg: BrandId) -> ServiceFuture<Option<Brand>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to get brand for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let brands_repo = repo_factory.create_brands_repo(&*conn, Some(user_id));
            brands_repo
                .find(brand_id_arg)
                .map_err(|e| e.context("Service Brands, get_brand endpoint error occurred.").into())
        })
    }

    /// Returns all brands
    fn list_brands(&self) -> ServiceFuture<Vec<Brand>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list brands for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let brands_repo = repo_factory.create_brands_repo(&*conn, Some(user_id));
            brands_repo
                .list()
                .map_err(|e| e.context("Service Brands, list_brands endpoint error occurred.").into())
        })
    }

    /// Brands are immutable once created; rejected before any policy runs.
    fn update_brand(&self, brand_id_arg: BrandId) -> ServiceFuture<Brand> {
        Box::new(future::err(
            format_err!("Update is disabled for brand {}", brand_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }

    /// Brands are immutable once created; rejected before any policy runs.
    fn delete_brand(&self, brand_id_arg: BrandId) -> ServiceFuture<Brand> {
        Box::new(future::err(
            format_err!("Delete is disabled for brand {}", brand_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }
}
