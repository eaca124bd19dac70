//! Sample catalog for local runs and demos.

use tracing::info;

use crate::api::App;
use crate::error::Result;
use crate::model::{NewBook, NewReview, Registration};

const REVIEWS: [(f64, &str); 5] = [
    (5.0, "Great book!"),
    (4.0, "Enjoyed it!"),
    (3.0, "It was okay."),
    (2.0, "Not great."),
    (1.0, "Didn't like it."),
];

const ISBNS: [&str; 5] = [
    "978-3-16-148410-0",
    "978-3-16-148411-7",
    "978-3-16-148412-4",
    "978-3-16-148413-1",
    "978-3-16-148414-8",
];

/// Wipes every record, then loads five books, five users (`user1` /
/// `password1` … `user5` / `password5`), and one review per book written
/// by the matching user.
pub async fn load_sample_data(app: &App) -> Result<()> {
    app.db.clear().await?;

    for (n, (isbn, (rating, comment))) in (1..).zip(ISBNS.iter().zip(REVIEWS)) {
        let book = NewBook::new(isbn, &format!("Example Book {n}"), &format!("Author {n}"));
        app.db.insert_book(&book).await?;

        let user = app
            .auth
            .register(Registration {
                username: format!("user{n}"),
                email: format!("user{n}@example.com"),
                password: format!("password{n}"),
            })
            .await?;

        let review = NewReview { rating, comment: Some(comment.to_owned()) };
        app.reviews.upsert_review(isbn, Some(&user.id), review).await?;
    }

    info!(books = ISBNS.len(), "sample data loaded");
    Ok(())
}
