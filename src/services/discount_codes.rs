//! DiscountCodes Services, presents operations with discount codes:
//! issuing by staff or the owning brand, fetching by id and role-scoped
//! listing. Codes are immutable once created.
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use futures::future::IntoFuture;
use r2d2::ManageConnection;
use uuid::Uuid;
use validator::Validate;

use errors::Error;
use models::{DiscountCode, DiscountCodeId, NewDiscountCode};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait DiscountCodesService {
    /// Creates new discount code
    fn create_discount_code(&self, payload: NewDiscountCode) -> ServiceFuture<DiscountCode>;
    /// Returns discount code by id
    fn get_discount_code(&self, code_id_arg: DiscountCodeId) -> ServiceFuture<Option<DiscountCode>>;
    /// Returns discount codes visible to the acting user
    fn list_discount_codes(&self) -> ServiceFuture<Vec<DiscountCode>>;
    /// Generate discount code
    fn generate_discount_code(&self) -> ServiceFuture<String>;
    /// Update is not part of the exposed surface
    fn update_discount_code(&self, code_id_arg: DiscountCodeId) -> ServiceFuture<DiscountCode>;
    /// Delete is not part of the exposed surface
    fn delete_discount_code(&self, code_id_arg: DiscountCodeId) -> ServiceFuture<DiscountCode>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > DiscountCodesService for Service<T, M, F>
{
    /// Creates new discount code. The rule is resolved through the acting
    /// user's visible scope, so another brand's rule is indistinguishable
    /// from a missing one.
    fn create_discount_code(&self, payload: NewDiscountCode) -> ServiceFuture<DiscountCode> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to create discount code for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        if let Err(errors) = payload.validate() {
            return Box::new(future::err(
                format_err!("Validation of NewDiscountCode failed.")
                    .context(Error::Validate(errors))
                    .into(),
            ));
        }

        self.spawn_on_pool(move |conn| {
            let rules_repo = repo_factory.create_discount_rules_repo(&*conn, Some(user_id));
            let codes_repo = repo_factory.create_discount_codes_repo(&*conn, Some(user_id));

            conn.transaction::<DiscountCode, FailureError, _>(move || {
                match rules_repo.find(payload.rule_id)? {
                    Some(_) => (),
                    None => {
                        return Err(format_err!("Discount rule {} not found.", payload.rule_id)
                            .context(Error::NotFound)
                            .into());
                    }
                }

                codes_repo.create(payload)
            })
            .map_err(|e| {
                e.context("Service DiscountCodes, create_discount_code endpoint error occurred.")
                    .into()
            })
        })
    }

    /// Returns discount code by id
    fn get_discount_code(&self, code_id_arg: DiscountCodeId) -> ServiceFuture<Option<DiscountCode>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to get discount code for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let codes_repo = repo_factory.create_discount_codes_repo(&*conn, Some(user_id));
            codes_repo.find(code_id_arg).map_err(|e| {
                e.context("Service DiscountCodes, get_discount_code endpoint error occurred.")
                    .into()
            })
        })
    }

    /// Returns discount codes visible to the acting user
    fn list_discount_codes(&self) -> ServiceFuture<Vec<DiscountCode>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list discount codes for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let codes_repo = repo_factory.create_discount_codes_repo(&*conn, Some(user_id));
            codes_repo.list().map_err(|e| {
                e.context("Service DiscountCodes, list_discount_codes endpoint error occurred.")
                    .into()
            })
        })
    }

    /// Generate discount code
    fn generate_discount_code(&self) -> ServiceFuture<String> {
        let new_uuid = Uuid::new_v4().simple().to_string().to_uppercase();
        let result = Ok(new_uuid.chars().take(DiscountCode::GENERATED_CODE_LENGTH).collect::<String>());

        Box::new(result.into_future())
    }

    /// Codes are immutable once created; rejected before any policy runs.
    fn update_discount_code(&self, code_id_arg: DiscountCodeId) -> ServiceFuture<DiscountCode> {
        Box::new(future::err(
            format_err!("Update is disabled for discount code {}", code_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }

    /// Codes are immutable once created; rejected before any policy runs.
    fn delete_discount_code(&self, code_id_arg: DiscountCodeId) -> ServiceFuture<DiscountCode> {
        Box::new(future::err(
            format_err!("Delete is disabled for discount code {}", code_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }
}
