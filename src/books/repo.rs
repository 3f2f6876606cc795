use uuid::Uuid;

use crate::books::repo_types::{Book, BookOwner, NewBook};
use crate::db::Db;

impl Book {
    pub async fn list_for_owner(db: &Db, owner: Uuid) -> Vec<Book> {
        db.read().await.books_of(owner).to_vec()
    }

    /// Every book in the owner map, in scan order.
    pub async fn list_all(db: &Db) -> Vec<Book> {
        db.read().await.all_books().map(|(_, b)| b.clone()).collect()
    }

    pub async fn add(db: &Db, owner: Uuid, new: NewBook) -> Book {
        let book = Book {
            id: Uuid::new_v4(),
            name: new.name,
            author: new.author,
            photo_url: new.photo_url,
            description: new.description,
        };
        db.write()
            .await
            .books
            .entry(owner)
            .or_default()
            .push(book.clone());
        book
    }

    /// Removes the book only if `owner` holds it.
    pub async fn delete_owned(db: &Db, owner: Uuid, book_id: Uuid) -> Option<Book> {
        db.write().await.take_book(owner, book_id)
    }

    /// Removes the book from whoever holds it. Returns the former owner id.
    pub async fn delete_any(db: &Db, book_id: Uuid) -> Option<(Uuid, Book)> {
        let mut t = db.write().await;
        let owner = t.find_book(book_id).map(|(owner, _)| owner)?;
        t.take_book(owner, book_id).map(|b| (owner, b))
    }

    /// The book plus its owner's public summary, if the owner still exists.
    pub async fn find_with_owner(db: &Db, book_id: Uuid) -> Option<(Book, Option<BookOwner>)> {
        let t = db.read().await;
        let (owner_id, book) = t.find_book(book_id)?;
        let owner = t.user_by_id(owner_id).map(|u| BookOwner {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        });
        Some((book.clone(), owner))
    }

    /// Every book with its holder's id and, when the account still exists,
    /// the holder's summary.
    pub async fn list_with_owners(db: &Db) -> Vec<(Uuid, Book, Option<BookOwner>)> {
        let t = db.read().await;
        t.all_books()
            .map(|(owner_id, book)| {
                let owner = t.user_by_id(owner_id).map(|u| BookOwner {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                });
                (owner_id, book.clone(), owner)
            })
            .collect()
    }
}
