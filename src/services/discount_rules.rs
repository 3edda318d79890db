//! DiscountRules Services. Rules are the staff-managed percentage grants
//! codes hang off; they are immutable once created and brands only ever
//! see their own.
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use r2d2::ManageConnection;
use validator::Validate;

use errors::Error;
use models::{DiscountRule, NewDiscountRule, RuleId};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait DiscountRulesService {
    /// Creates new discount rule
    fn create_rule(&self, payload: NewDiscountRule) -> ServiceFuture<DiscountRule>;
    /// Returns discount rule by id
    fn get_rule(&self, rule_id_arg: RuleId) -> ServiceFuture<Option<DiscountRule>>;
    /// Returns discount rules visible to the acting user
    fn list_rules(&self) -> ServiceFuture<Vec<DiscountRule>>;
    /// Update is not part of the exposed surface
    fn update_rule(&self, rule_id_arg: RuleId) -> ServiceFuture<DiscountRule>;
    /// Delete is not part of the exposed surface
    fn delete_rule(&self, rule_id_arg: RuleId) -> ServiceFuture<DiscountRule>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > DiscountRulesService for Service<T, M, F>
{
    /// Creates new discount rule
    fn create_rule(&self, payload: NewDiscountRule) -> ServiceFuture<DiscountRule> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to create discount rule for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        if let Err(errors) = payload.validate() {
            return Box::new(future::err(
                format_err!("Validation of NewDiscountRule failed.")
                    .context(Error::Validate(errors))
                    .into(),
            ));
        }

        self.spawn_on_pool(move |conn| {
            let rules_repo = repo_factory.create_discount_rules_repo(&*conn, Some(user_id));
            conn.transaction::<DiscountRule, FailureError, _>(move || rules_repo.create(payload))
                .map_err(|e| e.context("Service DiscountRules, create_rule endpoint error occurred.").into())
        })
    }

    /// Returns discount rule by id
    fn get_rule(&self, rule_id_arg: RuleId) -> ServiceFuture<Option<DiscountRule>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to get discount rule for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let rules_repo = repo_factory.create_discount_rules_repo(&*conn, Some(user_id));
            rules_repo
                .find(rule_id_arg)
                .map_err(|e| e.context("Service DiscountRules, get_rule endpoint error occurred.").into())
        })
    }

    /// Returns discount rules visible to the acting user
    fn list_rules(&self) -> ServiceFuture<Vec<DiscountRule>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list discount rules for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let rules_repo = repo_factory.create_discount_rules_repo(&*conn, Some(user_id));
            rules_repo
                .list()
                .map_err(|e| e.context("Service DiscountRules, list_rules endpoint error occurred.").into())
        })
    }

    /// Rules are immutable once created; rejected before any policy runs.
    fn update_rule(&self, rule_id_arg: RuleId) -> ServiceFuture<DiscountRule> {
        Box::new(future::err(
            format_err!("Update is disabled for discount rule {}", rule_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }

    /// Rules are immutable once created; rejected before any policy runs.
    fn delete_rule(&self, rule_id_arg: RuleId) -> ServiceFuture<DiscountRule> {
        Box::new(future::err(
            format_err!("Delete is disabled for discount rule {}", rule_id_arg)
                .context(Error::NotSupported)
                .into(),
        ))
    }
}
