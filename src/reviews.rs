//! Review reads and writes for a book.
//!
//! A book has at most one review as far as writes are concerned: posting a
//! review for a book that already has one overwrites it, whoever sends it.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Book, NewReview, Review};
use crate::store::Database;

/// Outcome of [`ReviewManager::upsert_review`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    Created(Review),
    Updated(Review),
}

impl Upsert {
    pub fn review(&self) -> &Review {
        match self {
            Self::Created(review) | Self::Updated(review) => review,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Created(_) => "Review added successfully",
            Self::Updated(_) => "Review updated successfully",
        }
    }
}

pub struct ReviewManager {
    db: Database,
}

impl ReviewManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Overwrites the book's review if it has one, otherwise creates it and
    /// appends it to the book's review list.
    ///
    /// Creating is two writes. If the second fails the review exists but is
    /// missing from the list; the next upsert for the book finds and updates
    /// it all the same.
    pub async fn upsert_review(&self, isbn: &str, user: Option<&str>, input: NewReview) -> Result<Upsert> {
        let book = self.book(isbn).await?;

        if let Some(existing) = self.db.first_review_for_book(&book.id).await? {
            self.db.update_review(&existing.id, user, &input).await?;
            debug!(isbn, review = %existing.id, "review updated");
            return Ok(Upsert::Updated(Review {
                user: user.map(str::to_owned),
                rating: input.rating,
                comment: input.comment,
                ..existing
            }));
        }

        let review = self.db.insert_review(&book.id, user, &input).await?;
        self.db.link_review(&book.id, &review.id).await?;
        info!(isbn, review = %review.id, "review created");
        Ok(Upsert::Created(review))
    }

    /// Deletes every review of the book and empties its review list.
    ///
    /// Reviews are deleted one at a time; a failure part-way leaves the
    /// earlier deletions in place.
    pub async fn delete_reviews(&self, isbn: &str) -> Result<usize> {
        let book = self.book(isbn).await?;

        let reviews = self.db.reviews_for_book(&book.id).await?;
        if reviews.is_empty() {
            return Err(Error::not_found("No reviews found for this book"));
        }
        for review in &reviews {
            self.db.delete_review(&review.id).await?;
        }
        self.db.clear_review_links(&book.id).await?;

        info!(isbn, deleted = reviews.len(), "reviews deleted");
        Ok(reviews.len())
    }

    /// The book's review list resolved to review records.
    pub async fn list_reviews(&self, isbn: &str) -> Result<Vec<Review>> {
        let book = self.book(isbn).await?;
        self.db.linked_reviews(&book.id).await
    }

    async fn book(&self, isbn: &str) -> Result<Book> {
        self.db
            .book_by_isbn(isbn)
            .await?
            .ok_or_else(|| Error::not_found("Book not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewBook;

    async fn setup() -> (Database, ReviewManager) {
        let db = Database::open_in_memory().unwrap();
        db.migrate().await.unwrap();
        db.insert_book(&NewBook::new("X1", "Example Book 1", "Author 1")).await.unwrap();
        (db.clone(), ReviewManager::new(db))
    }

    fn input(rating: f64, comment: Option<&str>) -> NewReview {
        NewReview { rating, comment: comment.map(str::to_owned) }
    }

    #[tokio::test]
    async fn second_upsert_updates_the_single_review() {
        let (db, reviews) = setup().await;

        let first = reviews.upsert_review("X1", Some("u-1"), input(5.0, Some("ok"))).await.unwrap();
        assert!(matches!(first, Upsert::Created(_)));
        assert_eq!(first.message(), "Review added successfully");

        let second = reviews.upsert_review("X1", Some("u-2"), input(2.0, None)).await.unwrap();
        assert!(matches!(second, Upsert::Updated(_)));
        assert_eq!(second.review().id, first.review().id);

        let listed = reviews.list_reviews("X1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rating, 2.0);
        assert_eq!(listed[0].comment, None);
        assert_eq!(listed[0].user.as_deref(), Some("u-2"));

        let book = db.book_by_isbn("X1").await.unwrap().unwrap();
        assert_eq!(book.reviews, vec![first.review().id.clone()]);
    }

    #[tokio::test]
    async fn unknown_book_is_not_found_everywhere() {
        let (_, reviews) = setup().await;
        let not_found = |r: Result<_>| matches!(r, Err(Error::NotFound(m)) if m == "Book not found");

        assert!(not_found(reviews.upsert_review("nope", None, input(1.0, None)).await.map(|_| ())));
        assert!(not_found(reviews.delete_reviews("nope").await.map(|_| ())));
        assert!(not_found(reviews.list_reviews("nope").await.map(|_| ())));
    }

    #[tokio::test]
    async fn delete_removes_all_and_empties_the_list() {
        let (db, reviews) = setup().await;
        let book = db.book_by_isbn("X1").await.unwrap().unwrap();
        // Reviews can pile up outside the upsert path (seeding, older data).
        for rating in [1.0, 2.0, 3.0] {
            let review = db.insert_review(&book.id, None, &input(rating, None)).await.unwrap();
            db.link_review(&book.id, &review.id).await.unwrap();
        }

        assert_eq!(reviews.delete_reviews("X1").await.unwrap(), 3);
        assert!(db.reviews_for_book(&book.id).await.unwrap().is_empty());
        assert!(db.book_by_isbn("X1").await.unwrap().unwrap().reviews.is_empty());

        let again = reviews.delete_reviews("X1").await;
        assert!(matches!(again, Err(Error::NotFound(m)) if m == "No reviews found for this book"));
    }

    #[tokio::test]
    async fn book_without_reviews_lists_empty() {
        let (_, reviews) = setup().await;
        assert!(reviews.list_reviews("X1").await.unwrap().is_empty());
    }
}
