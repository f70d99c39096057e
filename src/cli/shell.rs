//! Interactive command shell.
//!
//! Reads one command per line (`<command> <parameter>`), runs it against the
//! catalog and reports the result. A failing command prints its error and the
//! loop carries on; `exit` or end of input stops it.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::domain::{Book, BookEdit};
use crate::library::{BorrowOutcome, Catalog, CatalogError, ReturnOutcome};

const RULE: &str =
    "=====================================================================================================";

const HELP: &str = "\
 ====================================================================================
 Welcome to the Library Catalog Management System!

 List of available Commands:
 import <file_name>                          : Read a Book file from a file
 export <file_name>                          : Export Books to a file
 findBook <title of the book>                : Search a book in the catalog
 findAll <category/sub-category/..>          : List all books in a category/sub-category
 addBook                                     : Add a book to the Catalog
 editBook <title of the book>                : Edit a book detail in the catalog
 removeBook <title of the book>              : Remove a book from the Catalog
 borrowBook <title of the book>              : Borrow a book from the Library
 returnBook <title of the book>              : Return a book to the Library
 listCurrentBorrowers <title of the book>    : Print the list of Borrowers of a book
 listAllBorrowers <title of the book>        : Print the list of all Borrowers that have ever borrowed this book
 listBooks <borrower's name,borrower's id>   : Print the list of books borrowed by a borrower
 findCategory <category/sub-category/...>    : Find a category in the catalog
 addCategory <category/sub-category/...>     : Add a category/sub-category to the catalog
 removeCategory <category/sub-category/...>  : Remove a category/sub-category from the catalog
 editCategory <category/sub-category/...>    : Rename a category/sub-category
 list                                        : Display all categories from the catalog
 help                                        : Display the list of available commands
 exit                                        : Exit the Program
 ====================================================================================
";

enum Flow {
    Continue,
    Exit,
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {}: {:?}", field, value))
}

/// Line-oriented front end over a `Catalog`
pub struct Shell<R, W> {
    catalog: Catalog,
    input: R,
    output: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(catalog: Catalog, input: R, output: W) -> Self {
        Self {
            catalog,
            input,
            output,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Hand the catalog back once the session is over
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Run until `exit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        write!(self.output, "{}", HELP)?;

        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let Some(line) = self.read_line().await? else {
                writeln!(self.output)?;
                break;
            };

            let (command, parameter) = match line.split_once(' ') {
                Some((command, parameter)) => (command.to_string(), parameter.to_string()),
                None => (line.clone(), String::new()),
            };

            match self.dispatch(&command, &parameter).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(self.output, "{:#}", e)?,
            }
        }

        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .await
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string()))
    }

    async fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line().await?.context("Unexpected end of input")
    }

    async fn dispatch(&mut self, command: &str, parameter: &str) -> Result<Flow> {
        debug!(command, parameter, "Shell command");

        match command {
            "" => {}
            "import" => self.import(parameter).await?,
            "export" => self.export(parameter).await?,
            "list" => write!(self.output, "{}", self.catalog.render())?,
            "findAll" => self.find_all(parameter)?,
            "findBook" => self.find_book(parameter)?,
            "addBook" => self.add_book().await?,
            "editBook" => self.edit_book(parameter).await?,
            "borrowBook" => self.borrow_book(parameter).await?,
            "returnBook" => self.return_book(parameter).await?,
            "removeBook" => self.remove_book(parameter).await?,
            "listCurrentBorrowers" => self.list_borrowers(parameter, true)?,
            "listAllBorrowers" => self.list_borrowers(parameter, false)?,
            "listBooks" => self.list_books(parameter)?,
            "findCategory" => self.find_category(parameter)?,
            "addCategory" => self.add_category(parameter)?,
            "removeCategory" => self.remove_category(parameter)?,
            "editCategory" => self.edit_category(parameter).await?,
            "help" => write!(self.output, "{}", HELP)?,
            "exit" => return Ok(Flow::Exit),
            _ => writeln!(self.output, "Invalid Command!")?,
        }

        Ok(Flow::Continue)
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    async fn import(&mut self, path: &str) -> Result<()> {
        let report = self.catalog.import_file(Path::new(path)).await?;
        writeln!(self.output, "{} records have been imported", report.imported)?;
        if report.duplicates > 0 {
            writeln!(self.output, "{} duplicate titles skipped", report.duplicates)?;
        }
        for skipped in report.malformed.iter() {
            writeln!(self.output, "Line {} skipped: {}", skipped.line, skipped.reason)?;
        }
        Ok(())
    }

    async fn export(&mut self, path: &str) -> Result<()> {
        let written = self.catalog.export_file(Path::new(path)).await?;
        writeln!(
            self.output,
            "{} records have been successfully exported to {}",
            written, path
        )?;
        Ok(())
    }

    // ========================================================================
    // Books
    // ========================================================================

    fn find_all(&mut self, category: &str) -> Result<()> {
        let Some(subtree) = self.catalog.find_all(category) else {
            writeln!(self.output, "Category {} does not exist", category)?;
            return Ok(());
        };

        for book in subtree.records.iter() {
            writeln!(self.output, "Title: {}", book.title)?;
            writeln!(self.output, "Author(s): {}", book.author)?;
            writeln!(self.output, "ISBN: {}", book.isbn)?;
            writeln!(self.output, "Year: {}", book.publication_year)?;
            writeln!(self.output, "{}", RULE)?;
        }
        writeln!(self.output, "{} records found", subtree.total)?;
        Ok(())
    }

    fn find_book(&mut self, title: &str) -> Result<()> {
        match self.catalog.find_book(title) {
            Some(book) => {
                writeln!(self.output, "Book found in the library:")?;
                writeln!(self.output, "{}", book)?;
            }
            None => writeln!(self.output, "Book not found in the library.")?,
        }
        Ok(())
    }

    async fn add_book(&mut self) -> Result<()> {
        let title = self.prompt("Enter Title: ").await?.trim().to_string();
        let author = self.prompt("Enter Author(s): ").await?;
        let isbn = self.prompt("Enter ISBN: ").await?.trim().to_string();
        let year = self.prompt("Enter Publication Year: ").await?;
        let year = parse_number("publication year", &year)?;
        let total = self.prompt("Enter number of total copies: ").await?;
        let total = parse_number("total copies", &total)?;
        let available = parse_number(
            "available copies",
            &self.prompt("Enter number of available copies: ").await?,
        )?;

        let book = Book::new(title.clone(), author, isbn, year, total, available);
        book.validate()?;

        let category = self.prompt("Enter Category: ").await?;
        match self.catalog.add_book(category.trim(), book) {
            Ok(_) => writeln!(
                self.output,
                "Book {} has been successfully added to the catalog.",
                title
            )?,
            Err(CatalogError::DuplicateTitle { .. }) => writeln!(
                self.output,
                "A book with this title already exists in the category."
            )?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn edit_book(&mut self, title: &str) -> Result<()> {
        if self.catalog.find_book(title).is_none() {
            writeln!(self.output, "Book not found in the library.")?;
            return Ok(());
        }

        let mut current = title.to_string();
        loop {
            writeln!(self.output, "1: Title")?;
            writeln!(self.output, "2: Author")?;
            writeln!(self.output, "3: ISBN")?;
            writeln!(self.output, "4: Publication Year")?;
            writeln!(self.output, "5: Total Copies")?;
            writeln!(self.output, "6: Available Copies")?;
            writeln!(self.output, "7: Exit")?;

            write!(self.output, "Choose the field you want to edit: ")?;
            self.output.flush()?;
            let Some(choice) = self.read_line().await? else {
                return Ok(());
            };

            let choice = choice.trim();
            if choice == "7" {
                writeln!(
                    self.output,
                    "Changes made have been successfully saved to the book details"
                )?;
                return Ok(());
            }
            if !matches!(choice, "1" | "2" | "3" | "4" | "5" | "6") {
                writeln!(self.output, "Invalid option, please try again.")?;
                continue;
            }

            let value = self.prompt("> ").await?;
            let edit = match choice {
                "1" => Ok(BookEdit::Title(value.trim().to_string())),
                "2" => Ok(BookEdit::Author(value)),
                "3" => Ok(BookEdit::Isbn(value.trim().to_string())),
                "4" => parse_number("publication year", &value).map(BookEdit::PublicationYear),
                "5" => parse_number("total copies", &value).map(BookEdit::TotalCopies),
                _ => parse_number("available copies", &value).map(BookEdit::AvailableCopies),
            };

            let result = match edit {
                Ok(edit) => {
                    let renamed = match &edit {
                        BookEdit::Title(new_title) => Some(new_title.clone()),
                        _ => None,
                    };
                    self.catalog
                        .edit_book(&current, edit)
                        .map(|()| renamed)
                        .map_err(anyhow::Error::from)
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(Some(new_title)) => current = new_title,
                Ok(None) => {}
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }

    async fn remove_book(&mut self, title: &str) -> Result<()> {
        loop {
            write!(
                self.output,
                "Are you sure you want to delete the book \"{}\"? yes/no: ",
                title
            )?;
            self.output.flush()?;

            let answer = self.read_line().await?.unwrap_or_else(|| "no".to_string());
            match answer.trim() {
                "yes" => {
                    if self.catalog.remove_book(title) {
                        writeln!(self.output, "Book {} removed successfully.", title)?;
                    } else {
                        writeln!(
                            self.output,
                            "Couldn't delete the book {}, book doesn't exist in the catalog",
                            title
                        )?;
                    }
                    return Ok(());
                }
                "no" => {
                    writeln!(self.output, "Deletion canceled.")?;
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Lending
    // ========================================================================

    async fn borrower_identity(&mut self) -> Result<(String, String)> {
        let name = self.prompt("Enter borrower's name: ").await?.trim().to_string();
        let id = self.prompt("Enter borrower's id: ").await?.trim().to_string();
        Ok((name, id))
    }

    async fn borrow_book(&mut self, title: &str) -> Result<()> {
        let Some(book) = self.catalog.find_book(title) else {
            writeln!(self.output, "Book not found in the library.")?;
            return Ok(());
        };
        if book.available_copies == 0 {
            writeln!(
                self.output,
                "Book {} is not available in the library right now!",
                title
            )?;
            return Ok(());
        }

        let (name, id) = self.borrower_identity().await?;
        match self.catalog.borrow_book(title, &name, &id) {
            Some(BorrowOutcome::Issued) => {
                writeln!(self.output, "Book {} has been issued to {}", title, name)?
            }
            Some(BorrowOutcome::AlreadyBorrowing) => writeln!(
                self.output,
                "Book with title: {} is already borrowed by: {}",
                title, name
            )?,
            Some(BorrowOutcome::Unavailable) => writeln!(
                self.output,
                "Book {} is not available in the library right now!",
                title
            )?,
            None => writeln!(self.output, "Book not found in the library.")?,
        }
        Ok(())
    }

    async fn return_book(&mut self, title: &str) -> Result<()> {
        if self.catalog.find_book(title).is_none() {
            writeln!(self.output, "Book not found in the library.")?;
            return Ok(());
        }

        let (name, id) = self.borrower_identity().await?;
        match self.catalog.return_book(title, &name, &id) {
            Some(ReturnOutcome::Returned) => {
                writeln!(self.output, "Book has been successfully returned.")?
            }
            Some(ReturnOutcome::NotBorrowing) => writeln!(self.output, "Borrower not found.")?,
            None => writeln!(self.output, "Book not found in the library.")?,
        }
        Ok(())
    }

    fn list_borrowers(&mut self, title: &str, current_only: bool) -> Result<()> {
        let borrowers = if current_only {
            self.catalog.current_borrowers(title)
        } else {
            self.catalog.all_borrowers(title)
        };

        let Some(borrowers) = borrowers else {
            writeln!(self.output, "Book not found in the library.")?;
            return Ok(());
        };
        if borrowers.is_empty() {
            writeln!(self.output, "No borrowers.")?;
        }
        for (i, borrower) in borrowers.iter().enumerate() {
            writeln!(self.output, "{} {}", i + 1, borrower)?;
        }
        Ok(())
    }

    fn list_books(&mut self, parameter: &str) -> Result<()> {
        let (name, id) = parameter.split_once(',').unwrap_or((parameter, ""));
        let (name, id) = (name.trim(), id.trim());

        let Some(borrower) = self.catalog.borrower(name, id) else {
            writeln!(self.output, "Borrower {} (ID: {}) not found.", name, id)?;
            return Ok(());
        };

        writeln!(self.output, "Books borrowed by {} (ID: {}):", name, id)?;
        if borrower.history().is_empty() {
            writeln!(self.output, "No books borrowed.")?;
        }
        for (i, title) in borrower.history().iter().enumerate() {
            writeln!(self.output, "{}: {}", i + 1, title)?;
        }
        Ok(())
    }

    // ========================================================================
    // Categories
    // ========================================================================

    fn find_category(&mut self, category: &str) -> Result<()> {
        if self.catalog.find_category(category) {
            writeln!(self.output, "Category {} was found in the catalog", category)?;
        } else {
            writeln!(self.output, "Category {} was not found in the catalog", category)?;
        }
        Ok(())
    }

    fn add_category(&mut self, category: &str) -> Result<()> {
        self.catalog.add_category(category)?;
        writeln!(self.output, "{} has been successfully created.", category)?;
        Ok(())
    }

    fn remove_category(&mut self, category: &str) -> Result<()> {
        let removed = self.catalog.remove_category(category)?;
        writeln!(self.output, "{} has been successfully removed", category)?;
        debug!(category, books = removed, "Category removed from shell");
        Ok(())
    }

    async fn edit_category(&mut self, category: &str) -> Result<()> {
        if !self.catalog.find_category(category) {
            return Err(CatalogError::CategoryNotFound(category.to_string()).into());
        }

        writeln!(self.output, "Enter name of the category")?;
        let name = self.prompt("> ").await?;
        self.catalog.rename_category(category, name.trim())?;
        writeln!(self.output, "Category edited successfully")?;
        Ok(())
    }
}
