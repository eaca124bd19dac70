//! Records the bookshop stores, and the request bodies that create them.
//!
//! Request bodies deserialize into `*Body` structs whose fields are all
//! optional, then `validate()` turns them into the checked input types. A
//! missing field is therefore a [`Error::Validation`] with a readable
//! message, not a serde error.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    /// Ids of the book's reviews, in the order they were added.
    pub reviews: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    /// Id of the reviewed book.
    pub book: String,
    /// Id of the user who last wrote the review, if known.
    pub user: Option<String>,
    /// Whole ratings serialize as JSON integers, so `5` echoes back as `5`.
    #[serde(serialize_with = "whole_as_integer")]
    pub rating: f64,
    pub comment: Option<String>,
}

fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    // Largest magnitude below which every whole f64 is an exact i64.
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// A book as inserted by seeding; the id and review list are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
}

impl NewBook {
    pub fn new(isbn: &str, title: &str, author: &str) -> Self {
        Self { isbn: isbn.to_owned(), title: title.to_owned(), author: author.to_owned() }
    }
}

// ── Reviews ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ReviewBody {
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub rating: f64,
    pub comment: Option<String>,
}

impl ReviewBody {
    pub fn validate(self) -> Result<NewReview> {
        let rating = self.rating.ok_or_else(|| missing("rating"))?;
        if !rating.is_finite() {
            return Err(Error::Validation("rating must be a finite number".to_owned()));
        }
        Ok(NewReview { rating, comment: self.comment })
    }
}

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterBody {
    pub fn validate(self) -> Result<Registration> {
        Ok(Registration {
            username: required("username", self.username)?,
            email: required("email", self.email)?,
            password: required("password", self.password)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginBody {
    pub fn validate(self) -> Result<Credentials> {
        Ok(Credentials {
            username: required("username", self.username)?,
            password: required("password", self.password)?,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> Error {
    Error::Validation(format!("{field} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_ratings_serialize_as_integers() {
        let review = |rating| Review {
            id: "r".into(),
            book: "b".into(),
            user: None,
            rating,
            comment: None,
        };
        assert_eq!(serde_json::to_string(&review(5.0)).unwrap(), r#"{"id":"r","book":"b","user":null,"rating":5,"comment":null}"#);
        assert_eq!(serde_json::to_value(review(4.5)).unwrap()["rating"], 4.5);
    }

    #[test]
    fn review_requires_rating() {
        let err = ReviewBody { rating: None, comment: Some("ok".into()) }.validate().unwrap_err();
        assert_eq!(err.to_string(), "rating is required");
    }

    #[test]
    fn review_comment_is_optional() {
        let review = ReviewBody { rating: Some(2.0), comment: None }.validate().unwrap();
        assert_eq!(review, NewReview { rating: 2.0, comment: None });
    }

    #[test]
    fn blank_registration_fields_are_rejected() {
        let body = RegisterBody {
            username: Some("  ".into()),
            email: Some("a@example.com".into()),
            password: Some("pw".into()),
        };
        assert!(matches!(body.validate(), Err(Error::Validation(m)) if m == "username is required"));
    }

    #[test]
    fn login_body_from_json() {
        let body: LoginBody = serde_json::from_str(r#"{"username":"user1"}"#).unwrap();
        assert!(matches!(body.validate(), Err(Error::Validation(m)) if m == "password is required"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: "1".into(),
            username: "user1".into(),
            email: "user1@example.com".into(),
            password_hash: "$2b$...".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
