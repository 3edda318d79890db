//! Identifier newtypes shared by all modules of the app
use std::fmt;
use std::io::Write;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::{Integer, VarChar};

macro_rules! int_id_impls {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromSql<Integer, Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
                <i32 as FromSql<Integer, Pg>>::from_sql(bytes).map($name)
            }
        }

        impl ToSql<Integer, Pg> for $name {
            fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
                <i32 as ToSql<Integer, Pg>>::to_sql(&self.0, out)
            }
        }
    };
}

macro_rules! string_id_impls {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&'static str> for $name {
            fn from(v: &'static str) -> Self {
                $name(v.to_string())
            }
        }

        impl FromSql<VarChar, Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
                <String as FromSql<VarChar, Pg>>::from_sql(bytes).map($name)
            }
        }

        impl ToSql<VarChar, Pg> for $name {
            fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
                <String as ToSql<VarChar, Pg>>::to_sql(&self.0, out)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct UserId(pub i32);
int_id_impls!(UserId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct BrandId(pub i32);
int_id_impls!(BrandId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "Integer"]
pub struct RuleId(pub i32);
int_id_impls!(RuleId);

/// Caller-supplied code string, also the primary key of discount_codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
pub struct DiscountCodeId(pub String);
string_id_impls!(DiscountCodeId);

/// Primary key of code_usages, derived from the `(code, user)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "VarChar"]
pub struct CodeUsageId(pub String);
string_id_impls!(CodeUsageId);
