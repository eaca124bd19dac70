//! Read-only book lookups.

use crate::error::{Error, Result};
use crate::model::Book;
use crate::store::{BookQuery, Database};

/// Optional search criteria. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct Search {
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
}

pub struct Catalog {
    db: Database,
}

impl Catalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> Result<Vec<Book>> {
        self.db.find_books(&BookQuery::default()).await
    }

    /// ISBN matches exactly; author and title match as case-insensitive
    /// substrings. All given criteria must hold.
    pub async fn search(&self, search: Search) -> Result<Vec<Book>> {
        let query = BookQuery {
            isbn: non_empty(search.isbn),
            author_contains: non_empty(search.author),
            title_contains: non_empty(search.title),
            ..BookQuery::default()
        };
        self.db.find_books(&query).await
    }

    pub async fn by_author(&self, author: &str) -> Result<Vec<Book>> {
        let query = BookQuery { author: Some(author.to_owned()), ..BookQuery::default() };
        self.db.find_books(&query).await
    }

    pub async fn by_title(&self, title: &str) -> Result<Vec<Book>> {
        let query = BookQuery { title_contains: Some(title.to_owned()), ..BookQuery::default() };
        self.db.find_books(&query).await
    }

    pub async fn by_isbn(&self, isbn: &str) -> Result<Book> {
        self.db
            .book_by_isbn(isbn)
            .await?
            .ok_or_else(|| Error::not_found("Book not found"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewBook;

    async fn catalog() -> Catalog {
        let db = Database::open_in_memory().unwrap();
        db.migrate().await.unwrap();
        for n in 1..=3 {
            let book = NewBook::new(&format!("978-{n}"), &format!("Example Book {n}"), &format!("Author {n}"));
            db.insert_book(&book).await.unwrap();
        }
        Catalog::new(db)
    }

    fn isbns(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.isbn.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_search_is_the_whole_catalog() {
        let catalog = catalog().await;
        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(catalog.search(Search::default()).await.unwrap(), all);

        let blank = Search { isbn: Some(String::new()), author: Some(String::new()), title: None };
        assert_eq!(catalog.search(blank).await.unwrap(), all);
    }

    #[tokio::test]
    async fn search_combines_criteria() {
        let catalog = catalog().await;
        let search = Search { author: Some("author".into()), title: Some("BOOK 2".into()), isbn: None };
        assert_eq!(isbns(&catalog.search(search).await.unwrap()), vec!["978-2"]);

        let search = Search { isbn: Some("978-1".into()), title: Some("book 2".into()), author: None };
        assert!(catalog.search(search).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn title_is_case_insensitive_substring() {
        let catalog = catalog().await;
        assert_eq!(catalog.by_title("EXAMPLE").await.unwrap().len(), 3);
        assert_eq!(isbns(&catalog.by_title("book 1").await.unwrap()), vec!["978-1"]);
    }

    #[tokio::test]
    async fn author_is_exact() {
        let catalog = catalog().await;
        assert_eq!(isbns(&catalog.by_author("Author 3").await.unwrap()), vec!["978-3"]);
        assert!(catalog.by_author("author 3").await.unwrap().is_empty());
        assert!(catalog.by_author("Author").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn isbn_lookup() {
        let catalog = catalog().await;
        assert_eq!(catalog.by_isbn("978-2").await.unwrap().title, "Example Book 2");
        assert!(matches!(catalog.by_isbn("nope").await, Err(Error::NotFound(_))));
    }
}
