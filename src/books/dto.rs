use serde::{Deserialize, Serialize};

use crate::books::repo_types::{Book, BookOwner};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookRequest {
    pub name: Option<String>,
    pub author: Option<String>,
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

#[derive(Debug, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub owner: Option<BookOwner>,
}

#[derive(Debug, Serialize)]
pub struct BookDetailsResponse {
    pub book: BookDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBooksResponse {
    pub user_id: String,
    pub books: Vec<Book>,
    pub count: usize,
}
