//! Users Services, presents CRUD operations with users
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use futures::future;
use r2d2::ManageConnection;
use validator::Validate;

use errors::Error;
use models::{NewUser, UpdateUser, User, UserId};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait UsersService {
    /// Creates new user
    fn create_user(&self, payload: NewUser) -> ServiceFuture<User>;
    /// Returns user by id
    fn get_user(&self, user_id_arg: UserId) -> ServiceFuture<Option<User>>;
    /// Returns all users
    fn list_users(&self) -> ServiceFuture<Vec<User>>;
    /// Updates specific user
    fn update_user(&self, user_id_arg: UserId, payload: UpdateUser) -> ServiceFuture<User>;
    /// Deletes specific user
    fn delete_user(&self, user_id_arg: UserId) -> ServiceFuture<User>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > UsersService for Service<T, M, F>
{
    /// Creates new user
    fn create_user(&self, payload: NewUser) -> ServiceFuture<User> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to create user for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        if let Err(errors) = payload.validate() {
            return Box::new(future::err(
                format_err!("Validation of NewUser failed.")
                    .context(Error::Validate(errors))
                    .into(),
            ));
        }

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, Some(user_id));
            conn.transaction::<User, FailureError, _>(move || users_repo.create(payload))
                .map_err(|e| e.context("Service Users, create_user endpoint error occurred.").into())
        })
    }

    /// Returns user by id
    fn get_user(&self, user_id_arg: UserId) -> ServiceFuture<Option<User>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to get user for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, Some(user_id));
            users_repo
                .find(user_id_arg)
                .map_err(|e| e.context("Service Users, get_user endpoint error occurred.").into())
        })
    }

    /// Returns all users
    fn list_users(&self) -> ServiceFuture<Vec<User>> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to list users for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, Some(user_id));
            users_repo
                .list()
                .map_err(|e| e.context("Service Users, list_users endpoint error occurred.").into())
        })
    }

    /// Updates specific user
    fn update_user(&self, user_id_arg: UserId, payload: UpdateUser) -> ServiceFuture<User> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to update user for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        if let Err(errors) = payload.validate() {
            return Box::new(future::err(
                format_err!("Validation of UpdateUser failed.")
                    .context(Error::Validate(errors))
                    .into(),
            ));
        }

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, Some(user_id));
            conn.transaction::<User, FailureError, _>(move || users_repo.update(user_id_arg, payload))
                .map_err(|e| e.context("Service Users, update_user endpoint error occurred.").into())
        })
    }

    /// Deletes specific user
    fn delete_user(&self, user_id_arg: UserId) -> ServiceFuture<User> {
        let repo_factory = self.static_context.repo_factory.clone();
        let user_id = match self.dynamic_context.user_id {
            Some(user_id) => user_id,
            None => {
                return Box::new(future::err(
                    format_err!("Denied request to delete user for unauthorized user")
                        .context(Error::Unauthorized)
                        .into(),
                ));
            }
        };

        self.spawn_on_pool(move |conn| {
            let users_repo = repo_factory.create_users_repo(&*conn, Some(user_id));
            conn.transaction::<User, FailureError, _>(move || users_repo.delete(user_id_arg))
                .map_err(|e| e.context("Service Users, delete_user endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use tokio_core::reactor::Core;

    use errors::Error;
    use models::*;
    use repos::repo_factory::tests::*;
    use services::*;

    fn create_new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            is_staff: false,
            is_brand: false,
            brand_id: None,
        }
    }

    #[test]
    fn test_create_user() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_STAFF_USER_ID));
        let work = service.create_user(create_new_user("customer"));
        let result = core.run(work).unwrap();
        assert_eq!(result.username, "customer");
    }

    #[test]
    fn test_create_user_rejects_empty_username() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_STAFF_USER_ID));
        let work = service.create_user(create_new_user(""));
        let err = core.run(work).unwrap_err();
        assert!(contains_error(&err, |e| match *e {
            Error::Validate(_) => true,
            _ => false,
        }));
    }

    #[test]
    fn test_get_user() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let work = service.get_user(MOCK_USER_ID);
        let result = core.run(work).unwrap();
        assert_eq!(result.unwrap().id, MOCK_USER_ID);
    }

    #[test]
    fn test_get_user_unauthorized() {
        let mut core = Core::new().unwrap();
        let service = create_service(None);
        let work = service.get_user(MOCK_USER_ID);
        let err = core.run(work).unwrap_err();
        assert!(contains_error(&err, |e| match *e {
            Error::Unauthorized => true,
            _ => false,
        }));
    }

    #[test]
    fn test_list_users() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let work = service.list_users();
        let result = core.run(work).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_update_user() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_USER_ID));
        let work = service.update_user(
            MOCK_USER_ID,
            UpdateUser {
                username: Some("renamed".to_string()),
            },
        );
        let result = core.run(work).unwrap();
        assert_eq!(result.username, "renamed");
    }

    #[test]
    fn test_delete_user() {
        let mut core = Core::new().unwrap();
        let service = create_service(Some(MOCK_STAFF_USER_ID));
        let work = service.delete_user(MOCK_USER_ID);
        let result = core.run(work).unwrap();
        assert_eq!(result.id, MOCK_USER_ID);
    }
}
