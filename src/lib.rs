//! # bookshop
//!
//! An HTTP JSON API for a bookshop: browse and search the catalog, read and
//! write book reviews, register and log in with bearer tokens.
//!
//! ## Layout
//!
//! The service sits on a small framework layer built on hyper:
//!
//! - Radix-tree routing, one [`matchit`] tree per method
//! - [`Request`] / [`Response`] / [`IntoResponse`]: buffered bodies, JSON helpers
//! - [`Server`]: HTTP/1.1 + HTTP/2, graceful shutdown on SIGTERM / Ctrl-C
//! - [`middleware`]: per-request tracing and the bearer-token guard
//!
//! The bookshop itself:
//!
//! - [`store`]: SQLite records (books, users, reviews, review lists)
//! - [`catalog`]: read-only book lookups
//! - [`reviews`]: upsert, bulk delete and listing for a single review per book
//! - [`auth`]: bcrypt passwords, HS256 tokens
//! - [`api`]: the routes
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookshop::{api, auth::AuthSettings, store::Database, Server};
//!
//! #[tokio::main]
//! async fn main() -> bookshop::Result<()> {
//!     let db = Database::open("bookshop.db")?;
//!     db.migrate().await?;
//!     let app = Arc::new(api::App::new(db, &AuthSettings::new("change-me")));
//!     Server::bind("127.0.0.1:3000".parse().unwrap())
//!         .serve(api::router(app))
//!         .await
//! }
//! ```

mod error;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod handler;
pub mod health;
pub mod middleware;
pub mod model;
pub mod reviews;
pub mod seed;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Message, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
