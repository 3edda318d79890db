//! Repo for users table. Besides CRUD it resolves the roles a user acts
//! under, caching them between requests.
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewUser, Role, UpdateUser, User, UserId};
use repos::acl;
use repos::legacy_acl::CheckScope;
use repos::types::{RepoAcl, RepoResult};
use repos::RolesCacheImpl;
use schema::users::dsl as Users;

/// Users repository, responsible for handling users table
pub struct UsersRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<User>>,
    pub cached_roles: RolesCacheImpl,
}

pub trait UsersRepo {
    /// Creates new user
    fn create(&self, payload: NewUser) -> RepoResult<User>;

    /// Get user
    fn find(&self, user_id_arg: UserId) -> RepoResult<Option<User>>;

    /// List all users
    fn list(&self) -> RepoResult<Vec<User>>;

    /// Updates specific user
    fn update(&self, user_id_arg: UserId, payload: UpdateUser) -> RepoResult<User>;

    /// Deletes specific user
    fn delete(&self, user_id_arg: UserId) -> RepoResult<User>;

    /// Returns roles for a specific user
    fn roles_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<Role>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsersRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<User>>, cached_roles: RolesCacheImpl) -> Self {
        Self {
            db_conn,
            acl,
            cached_roles,
        }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UsersRepo for UsersRepoImpl<'a, T> {
    /// Creates new user
    fn create(&self, payload: NewUser) -> RepoResult<User> {
        debug!("Create new user {:?}.", payload);
        let payload = payload.normalize();

        acl::check(&*self.acl, Resource::Users, Action::Create, self, None)?;

        let query = diesel::insert_into(Users::users).values(&payload);
        query
            .get_result::<User>(self.db_conn)
            .map_err(From::from)
            .and_then(|user| {
                self.cached_roles.remove(user.id);
                Ok(user)
            })
            .map_err(|e: FailureError| e.context(format!("Creates new user: {:?} error occurred", payload)).into())
    }

    /// Get user
    fn find(&self, user_id_arg: UserId) -> RepoResult<Option<User>> {
        debug!("Find in users with id {}.", user_id_arg);
        let query = Users::users.filter(Users::id.eq(user_id_arg));
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<User>| {
                if let Some(value) = value.as_ref() {
                    acl::check(&*self.acl, Resource::Users, Action::Read, self, Some(value))?;
                };

                Ok(value)
            })
            .map_err(|e: FailureError| e.context(format!("Find user by id: {} error occurred", user_id_arg)).into())
    }

    /// List all users
    fn list(&self) -> RepoResult<Vec<User>> {
        debug!("Find all users.");
        let query = Users::users.order(Users::id);

        query
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<User>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Users, Action::Read, self, Some(value))?;
                }

                Ok(values)
            })
            .map_err(|e: FailureError| e.context("List all users").into())
    }

    /// Updates specific user
    fn update(&self, user_id_arg: UserId, payload: UpdateUser) -> RepoResult<User> {
        debug!("Updating user with id {} and payload {:?}.", user_id_arg, payload);
        let query = Users::users.filter(Users::id.eq(user_id_arg));

        query
            .get_result(self.db_conn)
            .map_err(From::from)
            .and_then(|user: User| acl::check(&*self.acl, Resource::Users, Action::Update, self, Some(&user)))
            .and_then(|_| {
                let filtered = Users::users.filter(Users::id.eq(user_id_arg));
                let query = diesel::update(filtered).set(&payload);

                query.get_result::<User>(self.db_conn).map_err(From::from)
            })
            .and_then(|user: User| {
                self.cached_roles.remove(user.id);
                Ok(user)
            })
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Updates specific user: id: {}, payload: {:?}, error occurred",
                    user_id_arg, payload
                ))
                .into()
            })
    }

    /// Deletes specific user
    fn delete(&self, user_id_arg: UserId) -> RepoResult<User> {
        debug!("Delete user with id {}.", user_id_arg);

        acl::check(&*self.acl, Resource::Users, Action::Delete, self, None)?;

        let filtered = Users::users.filter(Users::id.eq(user_id_arg));
        let query = diesel::delete(filtered);

        query
            .get_result::<User>(self.db_conn)
            .map_err(From::from)
            .and_then(|user: User| {
                self.cached_roles.remove(user.id);
                Ok(user)
            })
            .map_err(|e: FailureError| e.context(format!("Delete user: {} error occurred", user_id_arg)).into())
    }

    /// Returns roles for a specific user. Used by the ACL wiring itself,
    /// so no ACL check here.
    fn roles_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<Role>> {
        debug!("Get roles for user {}.", user_id_arg);
        if self.cached_roles.contains(user_id_arg) {
            return Ok(self.cached_roles.get(user_id_arg));
        }

        let query = Users::users.filter(Users::id.eq(user_id_arg));
        query
            .get_result::<User>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|user: Option<User>| {
                let roles = user.map(|u| u.roles()).unwrap_or_default();
                self.cached_roles.add_roles(user_id_arg, &roles);
                Ok(roles)
            })
            .map_err(|e: FailureError| e.context(format!("Get roles for user {} error occurred", user_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, User>
    for UsersRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&User>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(user) = obj {
                    user.id == user_id
                } else {
                    false
                }
            }
        }
    }
}
