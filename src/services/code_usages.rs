//! CodeUsages Services - redemption of discount codes. A usage is created
//! by the redeeming user for themselves, at most once per `(code, user)`
//! pair, while the code is still valid. Usages are append-only.
use chrono::Utc;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use r2d2::ManageConnection;

use errors::Error;
use models::{CodeUsage, CodeUsageId, NewCodeUsage};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait CodeUsagesService {
    /// Redeems a discount code for the acting user
    fn create_code_usage(&self, payload: NewCodeUsage) -> ServiceFuture<CodeUsage>;
    /// Returns code usage by id
    fn get_code_usage(&self, usage_id_arg: CodeUsageId) -> ServiceFuture<Option<CodeUsage>>;
    /// Returns code usages visible to the acting user
    fn list_code_usages(&self) -> ServiceFuture<Vec<CodeUsage>>;
    /// Update is not part of the exposed surface
    fn update_code_usage(&self, usage_id_arg: CodeUsageId) -> ServiceFuture<CodeUsage>;
    /// Delete is not part of the exposed surface
    fn delete_code_usage(&self, usage_id_arg: CodeUsageId) -> ServiceFuture<CodeUsage>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CodeUsagesService for Service<T, M, F>
{
    /// Redeems a discount code for the acting user. All checks and the
    /// insert run in one transaction; a concurrent redemption of the same
    /// pair is stopped by the storage constraint and surfaces as the same
    /// validation error the pre-check produces.
    fn create_code_usage(&self, payload: NewCodeUsage) -> ServiceFuture<CodeUsage> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to redeem discount code for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo_with_sys_acl(&*conn);
            let codes_repo = repo_factory.create_discount_codes_repo(&*conn, Some(user_id));
            let usages_repo = repo_factory.create_code_usages_repo(&*conn, Some(user_id));

            conn.transaction::<CodeUsage, FailureError, _>(move || {
                let code = match codes_repo.find(payload.discount_code_id.clone())? {
                    Some(code) => code,
                    None => {
                        return Err(format_err!("Discount code {} not found.", payload.discount_code_id)
                            .context(Error::NotFound)
                            .into());
                    }
                };

                let today = Utc::today().naive_utc();
                if today > code.valid_until {
                    return Err(format_err!("Discount code {} expired at {}.", code.id, code.valid_until)
                        .context(Error::Validate(validation_errors!({
                            "discount_code": ["expired" => "Discount code must be valid at the time of use"]
                        })))
                        .into());
                }

                let requestor = match users_repo.find(user_id)? {
                    Some(user) => user,
                    None => {
                        return Err(format_err!("User {} not found.", user_id).context(Error::NotFound).into());
                    }
                };

                if requestor.is_brand {
                    return Err(format_err!("Denied request of brand user {} to redeem discount code", user_id)
                        .context(Error::Validate(validation_errors!({
                            "user": ["user" => "Brands cannot use discount codes"]
                        })))
                        .into());
                }

                if payload.user_id != user_id {
                    return Err(format_err!(
                        "Denied request of user {} to redeem discount code for user {}",
                        user_id,
                        payload.user_id
                    )
                    .context(Error::Validate(validation_errors!({
                        "user": ["user" => "Users cannot use discount codes in someone else's name"]
                    })))
                    .into());
                }

                if usages_repo.user_used_code(code.id.clone(), user_id)? {
                    return Err(format_err!("Discount code {} already used by user {}.", code.id, user_id)
                        .context(Error::Validate(validation_errors!({
                            "discount_code": ["used" => "Discount code has already been used"]
                        })))
                        .into());
                }

                usages_repo.create(payload)
            })
            .map_err(|e| {
                e.context("Service CodeUsages, create_code_usage endpoint error occurred.")
                    .into()
            })
        })
    }

    /// Returns code usage by id
    fn get_code_usage(&self, usage_id_arg: CodeUsageId) -> ServiceFuture<Option<CodeUsage>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to get code usage for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let usages_repo = repo_factory.create_code_usages_repo(&*conn, Some(user_id));
            usages_repo
                .find(usage_id_arg)
                .map_err(|e| e.context("Service CodeUsages, get_code_usage endpoint error occurred.").into())
        })
    }

    /// Returns code usages visible to the acting user
    fn list_code_usages(&self) -> ServiceFuture<Vec<CodeUsage>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list code usages for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let usages_repo = repo_factory.create_code_usages_repo(&*conn, Some(user_id));
            usages_repo
                .list()
                .map_err(|e| e.context("Service CodeUsages, list_code_usages endpoint error occurred.").into())
        })
    }

    /// Usages are append-only; rejected before any policy runs.
    fn update_code_usage(&self, usage_id_arg: CodeUsageId) -> ServiceFuture<CodeUsage> {
        Box::new(future::err(
            format_err!("Update is disabled for code usage {}", usage_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }

    /// Usages are append-only; rejected before any policy runs.
    fn delete_code_usage(&self, usage_id_arg: CodeUsageId) -> ServiceFuture<CodeUsage> {
        Box::new(future::err(
            format_err!("Delete is disabled for code usage {}", usage_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }
}
