//! HTTP routes.
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | GET | `/books` | |
//! | GET | `/books/search?isbn&author&title` | |
//! | GET | `/books/title/{title}` | |
//! | GET | `/books/author/{author}` | |
//! | GET | `/books/isbn/{isbn}` | |
//! | GET | `/books/{isbn}/reviews` | |
//! | POST | `/books/{isbn}/reviews` | bearer |
//! | DELETE | `/books/{isbn}/reviews` | bearer |
//! | POST | `/users/register` | |
//! | POST | `/users/login` | |
//! | GET | `/healthz`, `/readyz` | |

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{AuthService, AuthSettings, Claims};
use crate::catalog::{Catalog, Search};
use crate::error::{Error, Result};
use crate::handler::with_state;
use crate::health;
use crate::method::Method;
use crate::middleware::auth::require_auth;
use crate::model::{Book, LoginBody, RegisterBody, Review, ReviewBody};
use crate::request::Request;
use crate::response::{Json, Message, Response};
use crate::reviews::ReviewManager;
use crate::router::Router;
use crate::status::Status;
use crate::store::Database;

/// Everything a handler can reach. Built once in `main`, shared by `Arc`.
pub struct App {
    pub db: Database,
    pub catalog: Catalog,
    pub reviews: ReviewManager,
    pub auth: Arc<AuthService>,
}

impl App {
    pub fn new(db: Database, settings: &AuthSettings) -> Self {
        Self {
            catalog: Catalog::new(db.clone()),
            reviews: ReviewManager::new(db.clone()),
            auth: Arc::new(AuthService::new(db.clone(), settings)),
            db,
        }
    }
}

pub fn router(app: Arc<App>) -> Router {
    let db = Arc::new(app.db.clone());
    Router::new()
        .on(Method::Get, "/books", with_state(&app, list_books))
        .on(Method::Get, "/books/search", with_state(&app, search_books))
        .on(Method::Get, "/books/title/{title}", with_state(&app, books_by_title))
        .on(Method::Get, "/books/author/{author}", with_state(&app, books_by_author))
        .on(Method::Get, "/books/isbn/{isbn}", with_state(&app, book_by_isbn))
        .on(Method::Get, "/books/{isbn}/reviews", with_state(&app, list_reviews))
        .on(
            Method::Post,
            "/books/{isbn}/reviews",
            require_auth(&app.auth, with_state(&app, upsert_review)),
        )
        .on(
            Method::Delete,
            "/books/{isbn}/reviews",
            require_auth(&app.auth, with_state(&app, delete_reviews)),
        )
        .on(Method::Post, "/users/register", with_state(&app, register))
        .on(Method::Post, "/users/login", with_state(&app, login))
        .on(Method::Get, "/healthz", health::liveness)
        .on(Method::Get, "/readyz", with_state(&db, health::readiness))
}

// ── Response bodies ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ReviewSaved {
    message: &'static str,
    review: Review,
}

#[derive(Serialize)]
struct ReviewsDeleted {
    message: &'static str,
    deleted: usize,
}

#[derive(Serialize)]
struct LoginToken {
    token: String,
}

// ── Books ────────────────────────────────────────────────────────────────────

async fn list_books(app: Arc<App>, _req: Request) -> Result<Json<Vec<Book>>> {
    Ok(Json(app.catalog.list_all().await?))
}

async fn search_books(app: Arc<App>, req: Request) -> Result<Json<Vec<Book>>> {
    let search = Search {
        isbn: req.query("isbn"),
        author: req.query("author"),
        title: req.query("title"),
    };
    Ok(Json(app.catalog.search(search).await?))
}

async fn books_by_title(app: Arc<App>, req: Request) -> Result<Json<Vec<Book>>> {
    let title = param(&req, "title")?;
    Ok(Json(app.catalog.by_title(title).await?))
}

async fn books_by_author(app: Arc<App>, req: Request) -> Result<Json<Vec<Book>>> {
    let author = param(&req, "author")?;
    Ok(Json(app.catalog.by_author(author).await?))
}

async fn book_by_isbn(app: Arc<App>, req: Request) -> Result<Json<Book>> {
    let isbn = param(&req, "isbn")?;
    Ok(Json(app.catalog.by_isbn(isbn).await?))
}

// ── Reviews ──────────────────────────────────────────────────────────────────

async fn list_reviews(app: Arc<App>, req: Request) -> Result<Json<Vec<Review>>> {
    let isbn = param(&req, "isbn")?;
    Ok(Json(app.reviews.list_reviews(isbn).await?))
}

async fn upsert_review(app: Arc<App>, req: Request) -> Result<Json<ReviewSaved>> {
    let isbn = param(&req, "isbn")?;
    let input = req.json::<ReviewBody>()?.validate()?;
    let user = req.extension::<Claims>().map(|claims| claims.sub.as_str());

    let outcome = app.reviews.upsert_review(isbn, user, input).await?;
    Ok(Json(ReviewSaved {
        message: outcome.message(),
        review: outcome.review().clone(),
    }))
}

async fn delete_reviews(app: Arc<App>, req: Request) -> Result<Json<ReviewsDeleted>> {
    let isbn = param(&req, "isbn")?;
    let deleted = app.reviews.delete_reviews(isbn).await?;
    Ok(Json(ReviewsDeleted { message: "Reviews deleted successfully", deleted }))
}

// ── Users ────────────────────────────────────────────────────────────────────

async fn register(app: Arc<App>, req: Request) -> Result<Response> {
    let registration = req.json::<RegisterBody>()?.validate()?;
    app.auth.register(registration).await?;
    Ok(Response::builder()
        .status(Status::Created)
        .serialize(&Message::new("User registered successfully")))
}

async fn login(app: Arc<App>, req: Request) -> Result<Json<LoginToken>> {
    let credentials = req.json::<LoginBody>()?.validate()?;
    let token = app.auth.login(credentials).await?;
    Ok(Json(LoginToken { token }))
}

fn param<'a>(req: &'a Request, name: &str) -> Result<&'a str> {
    req.param(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Validation(format!("{name} is required")))
}
