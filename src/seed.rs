//! Start-up data: the default administrator and, optionally, a small demo
//! library with one pending exchange.

use anyhow::Context;
use tracing::{debug, info};

use crate::auth::password::hash_password;
use crate::auth::repo::NewUser;
use crate::auth::repo_types::{Role, User};
use crate::auth::services::normalize_email;
use crate::books::repo_types::{Book, NewBook};
use crate::config::SeedConfig;
use crate::db::Db;
use crate::exchange::repo::NewExchange;
use crate::exchange::repo_types::ExchangeRequest;

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "demo123";
pub const TEST_EMAIL: &str = "test@example.com";
pub const TEST_PASSWORD: &str = "test123";

const CLASSICS: [(&str, &str, &str); 10] = [
    ("The Great Gatsby", "F. Scott Fitzgerald", "photo-1544947950-fa07a98d237f"),
    ("To Kill a Mockingbird", "Harper Lee", "photo-1507003211169-0a1dd7228f2d"),
    ("1984", "George Orwell", "photo-1518709268805-4e9042af2176"),
    ("Pride and Prejudice", "Jane Austen", "photo-1481627834876-b7833e8f5570"),
    ("The Catcher in the Rye", "J.D. Salinger", "photo-1507003211169-0a1dd7228f2d"),
    ("Lord of the Flies", "William Golding", "photo-1518709268805-4e9042af2176"),
    ("The Hobbit", "J.R.R. Tolkien", "photo-1544947950-fa07a98d237f"),
    ("Fahrenheit 451", "Ray Bradbury", "photo-1481627834876-b7833e8f5570"),
    ("Animal Farm", "George Orwell", "photo-1507003211169-0a1dd7228f2d"),
    ("The Chronicles of Narnia", "C.S. Lewis", "photo-1518709268805-4e9042af2176"),
];

const TEST_SHELF: [(&str, &str, &str, &str); 2] = [
    (
        "1984",
        "George Orwell",
        "photo-1518709268805-4e9042af2176",
        "A dystopian novel about totalitarianism",
    ),
    (
        "To Kill a Mockingbird",
        "Harper Lee",
        "photo-1507003211169-0a1dd7228f2d",
        "A classic American novel about racial injustice",
    ),
];

fn cover_url(photo: &str) -> String {
    format!("https://images.unsplash.com/{photo}?w=300&h=400&fit=crop")
}

pub async fn run(db: &Db, cfg: &SeedConfig) -> anyhow::Result<()> {
    let admin = ensure_user(
        db,
        &cfg.admin_email,
        &cfg.admin_password,
        "Admin User",
        Role::Admin,
    )
    .await
    .context("seed admin")?;
    info!(email = %admin.email, "default admin ready");

    if cfg.demo_data {
        seed_demo(db).await.context("seed demo data")?;
    }
    Ok(())
}

async fn ensure_user(
    db: &Db,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> anyhow::Result<User> {
    if let Some(existing) = User::find_by_email(db, email).await {
        debug!(email = %existing.email, "seed user already present");
        return Ok(existing);
    }
    let user = User::create(
        db,
        NewUser {
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            name: name.into(),
            role,
            is_email_verified: true,
        },
    )
    .await?;
    Ok(user)
}

async fn seed_demo(db: &Db) -> anyhow::Result<()> {
    let demo = ensure_user(db, DEMO_EMAIL, DEMO_PASSWORD, "Demo User", Role::User).await?;
    if !Book::list_for_owner(db, demo.id).await.is_empty() {
        return Ok(());
    }

    let mut first = None;
    for (name, author, photo) in CLASSICS {
        let book = Book::add(
            db,
            demo.id,
            NewBook {
                name: name.into(),
                author: author.into(),
                photo_url: Some(cover_url(photo)),
                description: None,
            },
        )
        .await;
        first.get_or_insert(book.id);
    }

    let tester = ensure_user(db, TEST_EMAIL, TEST_PASSWORD, "Test User", Role::User).await?;
    let mut offered = Vec::new();
    for (name, author, photo, description) in TEST_SHELF {
        let book = Book::add(
            db,
            tester.id,
            NewBook {
                name: name.into(),
                author: author.into(),
                photo_url: Some(cover_url(photo)),
                description: Some(description.into()),
            },
        )
        .await;
        offered.push(book.id);
    }

    if let Some(book_id) = first {
        let (request, _) = ExchangeRequest::create(
            db,
            &tester,
            NewExchange {
                book_id,
                offered_book_ids: offered,
                requester_name: tester.name.clone(),
                requester_email: tester.email.clone(),
            },
        )
        .await?;
        debug!(request_id = %request.id, "sample exchange request filed");
    }

    info!(books = CLASSICS.len() + TEST_SHELF.len(), "demo data seeded");
    Ok(())
}
