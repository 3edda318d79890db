//! Discounts is a microservice core responsible for discount rules,
//! single-use discount codes and their redemption by users.
//! The layered structure of the app is
//!
//! `Application -> Service -> Repo`
//!
//! Transport, session authentication and schema migrations live in the
//! surrounding application; this crate owns the authorization policy,
//! the role-scoped queries and the redemption integrity rules.
//!
//! Each layer can throw Error with context or cover occurred error with
//! Error in the context.

#![allow(proc_macro_derive_resolution_fallback)]
extern crate chrono;
extern crate config as config_crate;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate futures_cpupool;
extern crate hex;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate r2d2;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate sha2;
#[cfg(test)]
extern crate tokio_core;
extern crate uuid;
extern crate validator;
#[macro_use]
extern crate validator_derive;

#[macro_use]
pub mod macros;
pub mod config;
pub mod errors;
pub mod models;
pub mod repos;
pub mod schema;
pub mod services;

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use failure::Error as FailureError;
use failure::Fail;
use r2d2::Pool;

use config::Config;
use errors::Error;

/// Creates a r2d2 connection pool for the database from the config.
pub fn create_db_pool(config: &Config) -> Result<Pool<ConnectionManager<PgConnection>>, FailureError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database.url.clone());
    Pool::builder()
        .build(manager)
        .map_err(|e| e.context(Error::Connection).into())
}
