use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::auth::repo_types::{PasswordResetToken, User};
use crate::books::repo_types::Book;
use crate::error::{AppError, AppResult};
use crate::exchange::repo_types::ExchangeRequest;

/// Ids arrive as path strings; anything that is not a UUID cannot name a
/// stored record, so it is reported as missing.
pub fn parse_id(raw: &str, missing: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found(missing))
}

/// Every collection the service keeps. Lives only as long as the process.
#[derive(Debug, Default)]
pub struct Tables {
    /// Keyed by trimmed, lower-cased email.
    pub users: HashMap<String, User>,
    /// Owner map: user id -> books currently held.
    pub books: HashMap<Uuid, Vec<Book>>,
    /// Keyed by the recipient (owner of the requested book).
    pub exchange_requests: HashMap<Uuid, Vec<ExchangeRequest>>,
    pub reset_tokens: HashMap<String, PasswordResetToken>,
}

/// In-memory store. Reads share the lock, every mutation holds the write
/// guard for its whole duration.
#[derive(Debug, Default)]
pub struct Db {
    tables: RwLock<Tables>,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

impl Tables {
    pub fn user_by_id(&self, id: Uuid) -> Option<&User> {
        self.users.values().find(|u| u.id == id)
    }

    pub fn user_by_id_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.values_mut().find(|u| u.id == id)
    }

    /// All books with their owner id. Owners come in id order, each
    /// collection in the order its books were added, so paging is stable.
    pub fn all_books(&self) -> impl Iterator<Item = (Uuid, &Book)> {
        let mut owners: Vec<_> = self.books.iter().collect();
        owners.sort_by_key(|(owner, _)| **owner);
        owners
            .into_iter()
            .flat_map(|(owner, books)| books.iter().map(move |b| (*owner, b)))
    }

    pub fn find_book(&self, book_id: Uuid) -> Option<(Uuid, &Book)> {
        self.all_books().find(|(_, b)| b.id == book_id)
    }

    pub fn books_of(&self, owner: Uuid) -> &[Book] {
        self.books.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes a book from an owner's collection, returning it.
    pub fn take_book(&mut self, owner: Uuid, book_id: Uuid) -> Option<Book> {
        let books = self.books.get_mut(&owner)?;
        let idx = books.iter().position(|b| b.id == book_id)?;
        Some(books.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(name: &str) -> Book {
        Book {
            id: Uuid::new_v4(),
            name: name.into(),
            author: "Anon".into(),
            photo_url: None,
            description: None,
        }
    }

    #[test]
    fn malformed_ids_read_as_missing() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Book not found").unwrap(), id);
        let err = parse_id("exchanged-123", "Book not found").unwrap_err();
        assert!(matches!(err, AppError::NotFound(m) if m == "Book not found"));
    }

    #[tokio::test]
    async fn find_and_take_book_across_owners() {
        let db = Db::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let wanted = book("Dune");
        let wanted_id = wanted.id;
        {
            let mut t = db.write().await;
            t.books.insert(alice, vec![book("Emma")]);
            t.books.insert(bob, vec![wanted]);
        }

        let mut t = db.write().await;
        assert_eq!(t.find_book(wanted_id).map(|(o, _)| o), Some(bob));
        assert_eq!(t.all_books().count(), 2);
        assert!(t.take_book(alice, wanted_id).is_none());
        assert_eq!(t.take_book(bob, wanted_id).map(|b| b.name), Some("Dune".into()));
        assert!(t.books_of(bob).is_empty());
        assert!(t.find_book(wanted_id).is_none());
    }

    #[tokio::test]
    async fn all_books_are_grouped_by_owner_id() {
        let db = Db::new();
        let mut owners: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        {
            let mut t = db.write().await;
            for (i, owner) in owners.iter().enumerate() {
                t.books
                    .insert(*owner, vec![book(&format!("{i}a")), book(&format!("{i}b"))]);
            }
        }

        let t = db.read().await;
        let first: Vec<(Uuid, String)> = t.all_books().map(|(o, b)| (o, b.name.clone())).collect();
        let again: Vec<(Uuid, String)> = t.all_books().map(|(o, b)| (o, b.name.clone())).collect();
        assert_eq!(first, again);

        owners.sort();
        let seen: Vec<Uuid> = first.iter().step_by(2).map(|(o, _)| *o).collect();
        assert_eq!(seen, owners);
        for pair in first.chunks(2) {
            assert!(pair[0].1.ends_with('a') && pair[1].1.ends_with('b'));
        }
    }
}
