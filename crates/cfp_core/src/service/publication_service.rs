//! Journal, book publisher and book use-case service.

use crate::model::book::{Book, BookId, BookPublisher, BookPublisherId};
use crate::model::journal::{Journal, JournalId};
use crate::repo::book_repo::BookRepository;
use crate::repo::common::{DeleteMode, RepoError, RepoResult};
use crate::repo::journal_repo::JournalRepository;
use log::info;

/// Publication catalog service facade.
pub struct PublicationService<J: JournalRepository, B: BookRepository> {
    journals: J,
    books: B,
}

impl<J: JournalRepository, B: BookRepository> PublicationService<J, B> {
    pub fn new(journals: J, books: B) -> Self {
        Self { journals, books }
    }

    pub fn create_journal(&self, journal: &Journal) -> RepoResult<Journal> {
        let id = self.journals.create_journal(journal)?;
        self.load_journal(id)
    }

    pub fn update_journal(&self, journal: &Journal) -> RepoResult<Journal> {
        self.journals.update_journal(journal)?;
        self.load_journal(journal.id)
    }

    pub fn get_journal(&self, id: JournalId) -> RepoResult<Option<Journal>> {
        self.journals.get_journal(id)
    }

    pub fn list_journals(&self) -> RepoResult<Vec<Journal>> {
        self.journals.list_journals()
    }

    pub fn delete_journal(&self, id: JournalId, mode: DeleteMode) -> RepoResult<()> {
        self.journals.delete_journal(id, mode)?;
        info!("event=catalog_delete module=service entity=journal mode={mode:?} status=ok");
        Ok(())
    }

    pub fn create_publisher(&self, publisher: &BookPublisher) -> RepoResult<BookPublisher> {
        let id = self.books.create_publisher(publisher)?;
        self.load_publisher(id)
    }

    pub fn update_publisher(&self, publisher: &BookPublisher) -> RepoResult<BookPublisher> {
        self.books.update_publisher(publisher)?;
        self.load_publisher(publisher.id)
    }

    pub fn get_publisher(&self, id: BookPublisherId) -> RepoResult<Option<BookPublisher>> {
        self.books.get_publisher(id)
    }

    pub fn list_publishers(&self) -> RepoResult<Vec<BookPublisher>> {
        self.books.list_publishers()
    }

    pub fn delete_publisher(&self, id: BookPublisherId, mode: DeleteMode) -> RepoResult<()> {
        self.books.delete_publisher(id, mode)?;
        info!("event=catalog_delete module=service entity=book_publisher mode={mode:?} status=ok");
        Ok(())
    }

    pub fn create_book(&self, book: &Book) -> RepoResult<Book> {
        let id = self.books.create_book(book)?;
        self.load_book(id)
    }

    pub fn update_book(&self, book: &Book) -> RepoResult<Book> {
        self.books.update_book(book)?;
        self.load_book(book.id)
    }

    pub fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        self.books.get_book(id)
    }

    /// Lists books by title, optionally for one publisher.
    pub fn list_books(&self, publisher_id: Option<BookPublisherId>) -> RepoResult<Vec<Book>> {
        self.books.list_books(publisher_id)
    }

    pub fn delete_book(&self, id: BookId, mode: DeleteMode) -> RepoResult<()> {
        self.books.delete_book(id, mode)?;
        info!("event=catalog_delete module=service entity=book mode={mode:?} status=ok");
        Ok(())
    }

    fn load_journal(&self, id: JournalId) -> RepoResult<Journal> {
        self.journals.get_journal(id)?.ok_or(RepoError::NotFound {
            entity: "journal",
            id,
        })
    }

    fn load_publisher(&self, id: BookPublisherId) -> RepoResult<BookPublisher> {
        self.books.get_publisher(id)?.ok_or(RepoError::NotFound {
            entity: "publisher",
            id,
        })
    }

    fn load_book(&self, id: BookId) -> RepoResult<Book> {
        self.books
            .get_book(id)?
            .ok_or(RepoError::NotFound { entity: "book", id })
    }
}
