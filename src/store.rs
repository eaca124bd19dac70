//! SQLite-backed record store.
//!
//! One connection behind an async mutex, shared by cloning the handle. Every
//! method is a single statement or a short read sequence; nothing here spans
//! a transaction, so multi-step writes (create a review, then link it into
//! its book's list) are sequenced by the caller.
//!
//! Tables:
//!
//! ```text
//! books         id, isbn UNIQUE, title, author
//! users         id, username UNIQUE, email UNIQUE, password_hash
//! reviews       id, book_id, user_id NULL, rating, comment NULL
//! book_reviews  book_id, review_id, position      ← a book's review list
//! ```

use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Book, NewBook, NewReview, Review, User};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS books (
        id     TEXT PRIMARY KEY,
        isbn   TEXT NOT NULL UNIQUE,
        title  TEXT NOT NULL,
        author TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS reviews (
        id      TEXT PRIMARY KEY,
        book_id TEXT NOT NULL,
        user_id TEXT,
        rating  REAL NOT NULL,
        comment TEXT
    );
    CREATE INDEX IF NOT EXISTS reviews_by_book ON reviews (book_id);
    CREATE TABLE IF NOT EXISTS book_reviews (
        book_id   TEXT NOT NULL,
        review_id TEXT NOT NULL,
        position  INTEGER NOT NULL,
        PRIMARY KEY (book_id, review_id)
    );
";

/// Conjunctive book filter. `None` fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Exact ISBN.
    pub isbn: Option<String>,
    /// Exact author name.
    pub author: Option<String>,
    /// Case-insensitive substring of the author name.
    pub author_contains: Option<String>,
    /// Case-insensitive substring of the title.
    pub title_contains: Option<String>,
}

impl BookQuery {
    fn to_sql(&self) -> (String, Vec<&str>) {
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        if let Some(isbn) = &self.isbn {
            clauses.push("isbn = ?");
            args.push(isbn.as_str());
        }
        if let Some(author) = &self.author {
            clauses.push("author = ?");
            args.push(author.as_str());
        }
        if let Some(author) = &self.author_contains {
            clauses.push("instr(lower(author), lower(?)) > 0");
            args.push(author.as_str());
        }
        if let Some(title) = &self.title_contains {
            clauses.push("instr(lower(title), lower(?)) > 0");
            args.push(title.as_str());
        }

        let mut sql = String::from("SELECT id, isbn, title, author FROM books");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");
        (sql, args)
    }
}

/// Handle to the bookshop database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "database opened");
        Ok(Self::from_connection(conn))
    }

    /// A private database that lives as long as the handle.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    /// Creates any missing tables.
    pub async fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(SCHEMA)?;
        debug!("schema ready");
        Ok(())
    }

    /// Cheapest possible round trip, for readiness checks.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Deletes every record of every kind.
    pub async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            "DELETE FROM book_reviews;
             DELETE FROM reviews;
             DELETE FROM users;
             DELETE FROM books;",
        )?;
        Ok(())
    }

    // ── Books ────────────────────────────────────────────────────────────────

    pub async fn insert_book(&self, book: &NewBook) -> Result<Book> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO books (id, isbn, title, author) VALUES (?1, ?2, ?3, ?4)",
            params![id, book.isbn, book.title, book.author],
        )?;
        Ok(Book {
            id,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            reviews: Vec::new(),
        })
    }

    /// Books matching `query`, in insertion order, with review lists attached.
    pub async fn find_books(&self, query: &BookQuery) -> Result<Vec<Book>> {
        let (sql, args) = query.to_sql();
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let mut books = stmt
            .query_map(params_from_iter(args), book_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for book in &mut books {
            book.reviews = review_list(&conn, &book.id)?;
        }
        Ok(books)
    }

    pub async fn book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let conn = self.conn.lock().await;
        let book = conn
            .query_row(
                "SELECT id, isbn, title, author FROM books WHERE isbn = ?1",
                [isbn],
                book_row,
            )
            .optional()?;
        match book {
            Some(mut book) => {
                book.reviews = review_list(&conn, &book.id)?;
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    // ── Users ────────────────────────────────────────────────────────────────

    /// Stores a new user. A username or email collision is a [`Error::Conflict`].
    pub async fn insert_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            "INSERT INTO users (id, username, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
            params![id, username, email, password_hash],
        );
        match inserted {
            Ok(_) => Ok(User {
                id,
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: password_hash.to_owned(),
            }),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::Conflict("User already exists".to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let user = conn
            .query_row(
                "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
                [username],
                user_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Whether any user already holds `username` or `email`.
    pub async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let exists = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1 OR email = ?2)",
            [username, email],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    // ── Reviews ──────────────────────────────────────────────────────────────

    /// The oldest review referencing `book_id`, if any.
    pub async fn first_review_for_book(&self, book_id: &str) -> Result<Option<Review>> {
        let conn = self.conn.lock().await;
        let review = conn
            .query_row(
                "SELECT id, book_id, user_id, rating, comment FROM reviews
                 WHERE book_id = ?1 ORDER BY rowid LIMIT 1",
                [book_id],
                review_row,
            )
            .optional()?;
        Ok(review)
    }

    /// Every review referencing `book_id`, linked into its list or not.
    pub async fn reviews_for_book(&self, book_id: &str) -> Result<Vec<Review>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, book_id, user_id, rating, comment FROM reviews
             WHERE book_id = ?1 ORDER BY rowid",
        )?;
        let reviews = stmt
            .query_map([book_id], review_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    /// The book's review list resolved to records, in list order.
    pub async fn linked_reviews(&self, book_id: &str) -> Result<Vec<Review>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.book_id, r.user_id, r.rating, r.comment
             FROM book_reviews l JOIN reviews r ON r.id = l.review_id
             WHERE l.book_id = ?1 ORDER BY l.position",
        )?;
        let reviews = stmt
            .query_map([book_id], review_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    pub async fn insert_review(
        &self,
        book_id: &str,
        user_id: Option<&str>,
        review: &NewReview,
    ) -> Result<Review> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO reviews (id, book_id, user_id, rating, comment) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, book_id, user_id, review.rating, review.comment],
        )?;
        Ok(Review {
            id,
            book: book_id.to_owned(),
            user: user_id.map(str::to_owned),
            rating: review.rating,
            comment: review.comment.clone(),
        })
    }

    /// Overwrites rating, comment, and author of an existing review.
    pub async fn update_review(&self, review_id: &str, user_id: Option<&str>, review: &NewReview) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE reviews SET user_id = ?2, rating = ?3, comment = ?4 WHERE id = ?1",
            params![review_id, user_id, review.rating, review.comment],
        )?;
        if changed == 0 {
            return Err(Error::not_found("Review not found"));
        }
        Ok(())
    }

    pub async fn delete_review(&self, review_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM reviews WHERE id = ?1", [review_id])?;
        Ok(())
    }

    /// Appends `review_id` to the end of the book's review list.
    pub async fn link_review(&self, book_id: &str, review_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR IGNORE INTO book_reviews (book_id, review_id, position)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM book_reviews WHERE book_id = ?1))",
            [book_id, review_id],
        )?;
        Ok(())
    }

    /// Empties the book's review list. The reviews themselves are untouched.
    pub async fn clear_review_links(&self, book_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM book_reviews WHERE book_id = ?1", [book_id])?;
        Ok(())
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────────

fn book_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        isbn: row.get(1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        reviews: Vec::new(),
    })
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

fn review_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        book: row.get(1)?,
        user: row.get(2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
    })
}

fn review_list(conn: &Connection, book_id: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT review_id FROM book_reviews WHERE book_id = ?1 ORDER BY position",
    )?;
    let ids = stmt.query_map([book_id], |row| row.get::<_, String>(0))?.collect();
    ids
}
