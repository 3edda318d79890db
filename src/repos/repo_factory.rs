use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;

use models::*;
use repos::legacy_acl::{Acl, SystemACL};
use repos::*;

pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>:
    Clone + Send + 'static
{
    fn create_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UsersRepo + 'a>;
    fn create_users_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<UsersRepo + 'a>;
    fn create_brands_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<BrandsRepo + 'a>;
    fn create_discount_rules_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<DiscountRulesRepo + 'a>;
    fn create_discount_codes_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<DiscountCodesRepo + 'a>;
    fn create_code_usages_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CodeUsagesRepo + 'a>;
}

#[derive(Clone)]
pub struct ReposFactoryImpl {
    roles_cache: RolesCacheImpl,
}

impl ReposFactoryImpl {
    pub fn new(roles_cache: RolesCacheImpl) -> Self {
        Self { roles_cache }
    }

    pub fn get_roles<'a, C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        id: UserId,
        db_conn: &'a C,
    ) -> Vec<Role> {
        self.create_users_repo_with_sys_acl(db_conn)
            .roles_for_user(id)
            .ok()
            .unwrap_or_default()
    }

    fn get_requestor<'a, C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        db_conn: &'a C,
        user_id: Option<UserId>,
    ) -> Option<User> {
        user_id.and_then(|id| {
            self.create_users_repo_with_sys_acl(db_conn)
                .find(id)
                .ok()
                .and_then(|user| user)
        })
    }

    fn get_acl<'a, T, C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>(
        &self,
        db_conn: &'a C,
        user_id: Option<UserId>,
    ) -> Box<Acl<Resource, Action, Scope, FailureError, T>> {
        user_id.map_or(
            Box::new(UnauthorizedAcl::default()) as Box<Acl<Resource, Action, Scope, FailureError, T>>,
            |id| {
                let roles = self.get_roles(id, db_conn);
                Box::new(ApplicationAcl::new(roles, id)) as Box<Acl<Resource, Action, Scope, FailureError, T>>
            },
        )
    }
}

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryImpl {
    fn create_users_repo_with_sys_acl<'a>(&self, db_conn: &'a C) -> Box<UsersRepo + 'a> {
        Box::new(UsersRepoImpl::new(
            db_conn,
            Box::new(SystemACL::default()) as Box<Acl<Resource, Action, Scope, FailureError, User>>,
            self.roles_cache.clone(),
        )) as Box<UsersRepo>
    }
    fn create_users_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<UsersRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(UsersRepoImpl::new(db_conn, acl, self.roles_cache.clone())) as Box<UsersRepo>
    }
    fn create_brands_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<BrandsRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        Box::new(BrandsRepoImpl::new(db_conn, acl)) as Box<BrandsRepo>
    }
    fn create_discount_rules_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<DiscountRulesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        let requestor = self.get_requestor(db_conn, user_id);
        Box::new(DiscountRulesRepoImpl::new(db_conn, acl, requestor)) as Box<DiscountRulesRepo>
    }
    fn create_discount_codes_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<DiscountCodesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        let requestor = self.get_requestor(db_conn, user_id);
        Box::new(DiscountCodesRepoImpl::new(db_conn, acl, requestor)) as Box<DiscountCodesRepo>
    }
    fn create_code_usages_repo<'a>(&self, db_conn: &'a C, user_id: Option<UserId>) -> Box<CodeUsagesRepo + 'a> {
        let acl = self.get_acl(db_conn, user_id);
        let requestor = self.get_requestor(db_conn, user_id);
        Box::new(CodeUsagesRepoImpl::new(db_conn, acl, requestor)) as Box<CodeUsagesRepo>
    }
}

#[cfg(test)]
pub mod tests {

    use std::error::Error;
    use std::fmt;
    use std::sync::Arc;
    use std::time::SystemTime;

    use chrono::{Duration, Utc};
    use diesel::connection::AnsiTransactionManager;
    use diesel::connection::SimpleConnection;
    use diesel::deserialize::QueryableByName;
    use diesel::pg::Pg;
    use diesel::query_builder::AsQuery;
    use diesel::query_builder::QueryFragment;
    use diesel::query_builder::QueryId;
    use diesel::sql_types::HasSqlType;
    use diesel::Connection;
    use diesel::ConnectionResult;
    use diesel::QueryResult;
    use diesel::Queryable;
    use futures_cpupool::CpuPool;
    use r2d2;
    use r2d2::ManageConnection;

    use failure::Error as FailureError;

    use config::Config;
    use errors::Error as ApiError;
    use models::*;
    use repos::*;
    use services::*;

    /// Tells whether any error in the chain matches the predicate.
    pub fn contains_error<P>(err: &FailureError, pred: P) -> bool
    where
        P: Fn(&ApiError) -> bool,
    {
        err.iter_chain()
            .any(|fail| fail.downcast_ref::<ApiError>().map(|e| pred(e)).unwrap_or(false))
    }

    pub const MOCK_REPO_FACTORY: ReposFactoryMock = ReposFactoryMock {};
    pub static MOCK_USER_ID: UserId = UserId(1);
    pub static MOCK_BRAND_USER_ID: UserId = UserId(2);
    pub static MOCK_STAFF_USER_ID: UserId = UserId(3);
    pub static MOCK_BRAND_ID: BrandId = BrandId(1);
    pub static MOCK_RULE_ID: RuleId = RuleId(1);
    pub static MOCK_MISSING_RULE_ID: RuleId = RuleId(404);
    pub static MOCK_CODE: &'static str = "MOCKCODE2022";
    pub static MOCK_EDGE_CODE: &'static str = "EDGE2022";
    pub static MOCK_EXPIRED_CODE: &'static str = "EXPIRED2022";
    pub static MOCK_USED_CODE: &'static str = "USED2022";
    pub static MOCK_MISSING_CODE: &'static str = "MISSING2022";

    pub fn create_service(user_id: Option<UserId>) -> Service<MockConnection, MockConnectionManager, ReposFactoryMock> {
        let manager = MockConnectionManager::default();
        let db_pool = r2d2::Pool::builder().build(manager).expect("Failed to create connection pool");
        let cpu_pool = CpuPool::new(1);

        let config = Config::new().unwrap();
        let static_context = StaticContext::new(db_pool, cpu_pool, Arc::new(config), MOCK_REPO_FACTORY);
        let dynamic_context = DynamicContext::new(user_id);

        Service::new(static_context, dynamic_context)
    }

    pub fn create_mock_user(id: UserId) -> User {
        if id == MOCK_BRAND_USER_ID {
            User {
                id,
                username: "acme".to_string(),
                is_staff: false,
                is_brand: true,
                brand_id: Some(MOCK_BRAND_ID),
            }
        } else if id == MOCK_STAFF_USER_ID {
            User {
                id,
                username: "staff".to_string(),
                is_staff: true,
                is_brand: false,
                brand_id: None,
            }
        } else {
            User {
                id,
                username: "customer".to_string(),
                is_staff: false,
                is_brand: false,
                brand_id: None,
            }
        }
    }

    fn create_mock_code(id: DiscountCodeId) -> DiscountCode {
        let today = Utc::today().naive_utc();
        let valid_until = match &*id.0 {
            c if c == MOCK_EXPIRED_CODE => today - Duration::days(1),
            c if c == MOCK_EDGE_CODE => today,
            _ => today + Duration::days(30),
        };

        DiscountCode {
            id,
            rule_id: MOCK_RULE_ID,
            valid_until,
        }
    }

    #[derive(Default, Copy, Clone)]
    pub struct ReposFactoryMock;

    impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C> for ReposFactoryMock {
        fn create_users_repo_with_sys_acl<'a>(&self, _db_conn: &'a C) -> Box<UsersRepo + 'a> {
            Box::new(UsersRepoMock::default()) as Box<UsersRepo>
        }
        fn create_users_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<UsersRepo + 'a> {
            Box::new(UsersRepoMock::default()) as Box<UsersRepo>
        }
        fn create_brands_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<BrandsRepo + 'a> {
            Box::new(BrandsRepoMock::default()) as Box<BrandsRepo>
        }
        fn create_discount_rules_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<DiscountRulesRepo + 'a> {
            Box::new(DiscountRulesRepoMock::default()) as Box<DiscountRulesRepo>
        }
        fn create_discount_codes_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<DiscountCodesRepo + 'a> {
            Box::new(DiscountCodesRepoMock::default()) as Box<DiscountCodesRepo>
        }
        fn create_code_usages_repo<'a>(&self, _db_conn: &'a C, _user_id: Option<UserId>) -> Box<CodeUsagesRepo + 'a> {
            Box::new(CodeUsagesRepoMock::default()) as Box<CodeUsagesRepo>
        }
    }

    #[derive(Clone, Default)]
    pub struct UsersRepoMock;

    impl UsersRepo for UsersRepoMock {
        fn create(&self, payload: NewUser) -> RepoResult<User> {
            let payload = payload.normalize();
            Ok(User {
                id: MOCK_USER_ID,
                username: payload.username,
                is_staff: payload.is_staff,
                is_brand: payload.is_brand,
                brand_id: payload.brand_id,
            })
        }

        fn find(&self, user_id_arg: UserId) -> RepoResult<Option<User>> {
            Ok(Some(create_mock_user(user_id_arg)))
        }

        fn list(&self) -> RepoResult<Vec<User>> {
            Ok(vec![
                create_mock_user(MOCK_USER_ID),
                create_mock_user(MOCK_BRAND_USER_ID),
                create_mock_user(MOCK_STAFF_USER_ID),
            ])
        }

        fn update(&self, user_id_arg: UserId, payload: UpdateUser) -> RepoResult<User> {
            let mut user = create_mock_user(user_id_arg);
            if let Some(username) = payload.username {
                user.username = username;
            }
            Ok(user)
        }

        fn delete(&self, user_id_arg: UserId) -> RepoResult<User> {
            Ok(create_mock_user(user_id_arg))
        }

        fn roles_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<Role>> {
            Ok(create_mock_user(user_id_arg).roles())
        }
    }

    #[derive(Clone, Default)]
    pub struct BrandsRepoMock;

    impl BrandsRepo for BrandsRepoMock {
        fn create(&self, payload: NewBrand) -> RepoResult<Brand> {
            Ok(Brand {
                id: MOCK_BRAND_ID,
                name: payload.name,
            })
        }

        fn find(&self, brand_id_arg: BrandId) -> RepoResult<Option<Brand>> {
            Ok(Some(Brand {
                id: brand_id_arg,
                name: "brand".to_string(),
            }))
        }

        fn list(&self) -> RepoResult<Vec<Brand>> {
            Ok(vec![Brand {
                id: MOCK_BRAND_ID,
                name: "brand".to_string(),
            }])
        }
    }

    #[derive(Clone, Default)]
    pub struct DiscountRulesRepoMock;

    impl DiscountRulesRepo for DiscountRulesRepoMock {
        fn create(&self, payload: NewDiscountRule) -> RepoResult<DiscountRule> {
            Ok(DiscountRule {
                id: MOCK_RULE_ID,
                brand_id: payload.brand_id,
                discount: payload.discount,
            })
        }

        fn find(&self, rule_id_arg: RuleId) -> RepoResult<Option<DiscountRule>> {
            if rule_id_arg == MOCK_MISSING_RULE_ID {
                Ok(None)
            } else {
                Ok(Some(DiscountRule {
                    id: rule_id_arg,
                    brand_id: MOCK_BRAND_ID,
                    discount: 50,
                }))
            }
        }

        fn list(&self) -> RepoResult<Vec<DiscountRule>> {
            Ok(vec![DiscountRule {
                id: MOCK_RULE_ID,
                brand_id: MOCK_BRAND_ID,
                discount: 50,
            }])
        }
    }

    #[derive(Clone, Default)]
    pub struct DiscountCodesRepoMock;

    impl DiscountCodesRepo for DiscountCodesRepoMock {
        fn create(&self, payload: NewDiscountCode) -> RepoResult<DiscountCode> {
            Ok(DiscountCode {
                id: payload.id,
                rule_id: payload.rule_id,
                valid_until: payload.valid_until.unwrap_or_else(|| Utc::today().naive_utc()),
            })
        }

        fn find(&self, code_id_arg: DiscountCodeId) -> RepoResult<Option<DiscountCode>> {
            if code_id_arg.0 == MOCK_MISSING_CODE {
                Ok(None)
            } else {
                Ok(Some(create_mock_code(code_id_arg)))
            }
        }

        fn list(&self) -> RepoResult<Vec<DiscountCode>> {
            Ok(vec![create_mock_code(DiscountCodeId::from(MOCK_CODE))])
        }
    }

    #[derive(Clone, Default)]
    pub struct CodeUsagesRepoMock;

    impl CodeUsagesRepo for CodeUsagesRepoMock {
        fn create(&self, payload: NewCodeUsage) -> RepoResult<CodeUsage> {
            Ok(CodeUsage {
                id: CodeUsageId::derive(&payload.discount_code_id, payload.user_id),
                discount_code_id: payload.discount_code_id,
                user_id: payload.user_id,
                used_at: SystemTime::now(),
            })
        }

        fn find(&self, usage_id_arg: CodeUsageId) -> RepoResult<Option<CodeUsage>> {
            Ok(Some(CodeUsage {
                id: usage_id_arg,
                discount_code_id: DiscountCodeId::from(MOCK_USED_CODE),
                user_id: MOCK_USER_ID,
                used_at: SystemTime::now(),
            }))
        }

        fn list(&self) -> RepoResult<Vec<CodeUsage>> {
            Ok(vec![CodeUsage {
                id: CodeUsageId::derive(&DiscountCodeId::from(MOCK_USED_CODE), MOCK_USER_ID),
                discount_code_id: DiscountCodeId::from(MOCK_USED_CODE),
                user_id: MOCK_USER_ID,
                used_at: SystemTime::now(),
            }])
        }

        fn user_used_code(&self, code_id_arg: DiscountCodeId, _user_id_arg: UserId) -> RepoResult<bool> {
            Ok(code_id_arg.0 == MOCK_USED_CODE)
        }
    }

    #[derive(Default)]
    pub struct MockConnection {
        tr: AnsiTransactionManager,
    }

    impl Connection for MockConnection {
        type Backend = Pg;
        type TransactionManager = AnsiTransactionManager;

        fn establish(_database_url: &str) -> ConnectionResult<MockConnection> {
            Ok(MockConnection::default())
        }

        fn execute(&self, _query: &str) -> QueryResult<usize> {
            unimplemented!()
        }

        fn query_by_index<T, U>(&self, _source: T) -> QueryResult<Vec<U>>
        where
            T: AsQuery,
            T::Query: QueryFragment<Pg> + QueryId,
            Pg: HasSqlType<T::SqlType>,
            U: Queryable<T::SqlType, Pg>,
        {
            unimplemented!()
        }

        fn query_by_name<T, U>(&self, _source: &T) -> QueryResult<Vec<U>>
        where
            T: QueryFragment<Pg> + QueryId,
            U: QueryableByName<Pg>,
        {
            unimplemented!()
        }

        fn execute_returning_count<T>(&self, _source: &T) -> QueryResult<usize>
        where
            T: QueryFragment<Pg> + QueryId,
        {
            unimplemented!()
        }

        fn transaction_manager(&self) -> &Self::TransactionManager {
            &self.tr
        }
    }

    impl SimpleConnection for MockConnection {
        fn batch_execute(&self, _query: &str) -> QueryResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockConnectionManager;

    impl ManageConnection for MockConnectionManager {
        type Connection = MockConnection;
        type Error = MockError;

        fn connect(&self) -> Result<MockConnection, MockError> {
            Ok(MockConnection::default())
        }

        fn is_valid(&self, _conn: &mut MockConnection) -> Result<(), MockError> {
            Ok(())
        }

        fn has_broken(&self, _conn: &mut MockConnection) -> bool {
            false
        }
    }

    #[derive(Debug)]
    pub struct MockError {}

    impl fmt::Display for MockError {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "Mock connection error")
        }
    }

    impl Error for MockError {
        fn description(&self) -> &str {
            "Mock connection error"
        }

        fn cause(&self) -> Option<&Error> {
            None
        }
    }
}
