//! Book publisher and book repository.
//!
//! # Invariants
//! - Every book references an existing publisher.
//! - Deleting a publisher that still owns books requires `DeleteMode::Cascade`.

use crate::model::book::{Book, BookId, BookPublisher, BookPublisherId};
use crate::model::call::CallTarget;
use crate::repo::call_repo::release_target_calls_in;
use crate::repo::common::{
    delete_row, ensure_connection_ready, ensure_no_dependents, list_referencing_ids, parse_uuid,
    require_existing, require_reference, DeleteMode, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const PUBLISHER_SELECT_SQL: &str =
    "SELECT id, name, acronym, website, description FROM book_publishers";

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    publisher_id,
    title,
    theme,
    topics,
    website,
    description
FROM books";

/// Repository interface for publishers and books.
pub trait BookRepository {
    fn create_publisher(&self, publisher: &BookPublisher) -> RepoResult<BookPublisherId>;
    fn update_publisher(&self, publisher: &BookPublisher) -> RepoResult<()>;
    fn get_publisher(&self, id: BookPublisherId) -> RepoResult<Option<BookPublisher>>;
    fn list_publishers(&self) -> RepoResult<Vec<BookPublisher>>;
    fn delete_publisher(&self, id: BookPublisherId, mode: DeleteMode) -> RepoResult<()>;

    fn create_book(&self, book: &Book) -> RepoResult<BookId>;
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Lists books by title, optionally for one publisher.
    fn list_books(&self, publisher_id: Option<BookPublisherId>) -> RepoResult<Vec<Book>>;
    fn delete_book(&self, id: BookId, mode: DeleteMode) -> RepoResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "book_publishers",
                    &["id", "name", "acronym", "website", "description"],
                ),
                (
                    "books",
                    &[
                        "id",
                        "publisher_id",
                        "title",
                        "theme",
                        "topics",
                        "website",
                        "description",
                    ],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_publisher(&self, publisher: &BookPublisher) -> RepoResult<BookPublisherId> {
        publisher.validate()?;
        self.conn.execute(
            "INSERT INTO book_publishers (id, name, acronym, website, description)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                publisher.id.to_string(),
                publisher.name.as_str(),
                publisher.acronym.as_str(),
                publisher.website.as_str(),
                publisher.description.as_str(),
            ],
        )?;
        Ok(publisher.id)
    }

    fn update_publisher(&self, publisher: &BookPublisher) -> RepoResult<()> {
        publisher.validate()?;
        require_existing(self.conn, "book_publishers", "publisher", publisher.id)?;
        self.conn.execute(
            "UPDATE book_publishers
             SET name = ?2, acronym = ?3, website = ?4, description = ?5
             WHERE id = ?1;",
            params![
                publisher.id.to_string(),
                publisher.name.as_str(),
                publisher.acronym.as_str(),
                publisher.website.as_str(),
                publisher.description.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_publisher(&self, id: BookPublisherId) -> RepoResult<Option<BookPublisher>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PUBLISHER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_publisher_row(row)?));
        }
        Ok(None)
    }

    fn list_publishers(&self) -> RepoResult<Vec<BookPublisher>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PUBLISHER_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut publishers = Vec::new();
        while let Some(row) = rows.next()? {
            publishers.push(parse_publisher_row(row)?);
        }
        Ok(publishers)
    }

    fn delete_publisher(&self, id: BookPublisherId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_existing(&tx, "book_publishers", "publisher", id)?;
        match mode {
            DeleteMode::Restrict => {
                ensure_no_dependents(&tx, "publisher", id, "books", "publisher_id")?;
            }
            DeleteMode::Cascade => {
                for book_id in list_referencing_ids(&tx, "books", "publisher_id", id)? {
                    delete_book_in(&tx, book_id, DeleteMode::Cascade)?;
                }
            }
        }
        delete_row(&tx, "book_publishers", "publisher", id)?;
        tx.commit()?;
        Ok(())
    }

    fn create_book(&self, book: &Book) -> RepoResult<BookId> {
        book.validate()?;
        require_reference(self.conn, "book_publishers", "publisher", book.publisher_id)?;
        self.conn.execute(
            "INSERT INTO books (id, publisher_id, title, theme, topics, website, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                book.id.to_string(),
                book.publisher_id.to_string(),
                book.title.as_str(),
                book.theme.as_str(),
                book.topics.as_str(),
                book.website.as_str(),
                book.description.as_str(),
            ],
        )?;
        Ok(book.id)
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;
        require_existing(self.conn, "books", "book", book.id)?;
        require_reference(self.conn, "book_publishers", "publisher", book.publisher_id)?;
        self.conn.execute(
            "UPDATE books
             SET
                publisher_id = ?2,
                title = ?3,
                theme = ?4,
                topics = ?5,
                website = ?6,
                description = ?7
             WHERE id = ?1;",
            params![
                book.id.to_string(),
                book.publisher_id.to_string(),
                book.title.as_str(),
                book.theme.as_str(),
                book.topics.as_str(),
                book.website.as_str(),
                book.description.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        get_book_in(self.conn, id)
    }

    fn list_books(&self, publisher_id: Option<BookPublisherId>) -> RepoResult<Vec<Book>> {
        list_books_in(self.conn, publisher_id)
    }

    fn delete_book(&self, id: BookId, mode: DeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        delete_book_in(&tx, id, mode)?;
        tx.commit()?;
        Ok(())
    }
}

pub(crate) fn get_book_in(conn: &Connection, id: BookId) -> RepoResult<Option<Book>> {
    let mut stmt = conn.prepare(&format!("{BOOK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_book_row(row)?));
    }
    Ok(None)
}

pub(crate) fn list_books_in(
    conn: &Connection,
    publisher_id: Option<BookPublisherId>,
) -> RepoResult<Vec<Book>> {
    let mut sql = format!("{BOOK_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(publisher_id) = publisher_id {
        sql.push_str(" AND publisher_id = ?");
        bind_values.push(Value::Text(publisher_id.to_string()));
    }
    sql.push_str(" ORDER BY title COLLATE NOCASE ASC, id ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut books = Vec::new();
    while let Some(row) = rows.next()? {
        books.push(parse_book_row(row)?);
    }
    Ok(books)
}

fn delete_book_in(conn: &Connection, id: BookId, mode: DeleteMode) -> RepoResult<()> {
    require_existing(conn, "books", "book", id)?;
    release_target_calls_in(conn, "book", CallTarget::book(id), mode)?;
    delete_row(conn, "books", "book", id)
}

fn parse_publisher_row(row: &Row<'_>) -> RepoResult<BookPublisher> {
    let id: String = row.get("id")?;
    Ok(BookPublisher {
        id: parse_uuid(&id, "book_publishers.id")?,
        name: row.get("name")?,
        acronym: row.get("acronym")?,
        website: row.get("website")?,
        description: row.get("description")?,
    })
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let id: String = row.get("id")?;
    let publisher_id: String = row.get("publisher_id")?;
    Ok(Book {
        id: parse_uuid(&id, "books.id")?,
        publisher_id: parse_uuid(&publisher_id, "books.publisher_id")?,
        title: row.get("title")?,
        theme: row.get("theme")?,
        topics: row.get("topics")?,
        website: row.get("website")?,
        description: row.get("description")?,
    })
}
