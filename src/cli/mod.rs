//! Command-line interface for shelf.
//!
//! Provides one-shot commands for querying and editing the catalog data
//! file, plus the interactive shell (the default when no command is given).

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{debug, info};

use crate::config::{self, ResolvedConfig};
use crate::domain::Book;
use crate::library::Catalog;

pub mod shell;

pub use shell::Shell;

/// shelf - Library catalog organized by category
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog data file (overrides the config file)
    #[arg(long, global = true, env = "SHELF_DATA")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive shell
    Shell,

    /// Import books from a delimited-text file
    Import {
        /// File to read
        file: PathBuf,
    },

    /// Export every book to a delimited-text file
    Export {
        /// File to write
        file: PathBuf,
    },

    /// Show the category tree with book counts
    List,

    /// List every book under a category
    FindAll {
        /// Category path (whole catalog if omitted)
        #[arg(default_value = "")]
        category: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show a book by title
    FindBook {
        title: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Add a book to a category
    AddBook {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long, default_value = "")]
        isbn: String,

        #[arg(long)]
        year: i32,

        /// Copies owned
        #[arg(long, default_value = "1")]
        total: u32,

        /// Copies on the shelf (defaults to total)
        #[arg(long)]
        available: Option<u32>,

        /// Category path, e.g. Science/Physics
        #[arg(long)]
        category: String,
    },

    /// Remove a book by title
    RemoveBook {
        title: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a book to another category
    MoveBook { title: String, category: String },

    /// Create a category path
    AddCategory { path: String },

    /// Check whether a category path exists
    FindCategory { path: String },

    /// Remove a category and every book under it
    RemoveCategory { path: String },

    /// Rename the last segment of a category path
    RenameCategory { path: String, new_name: String },

    /// Show resolved configuration
    Config,
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::Shell
                | Commands::Import { .. }
                | Commands::AddBook { .. }
                | Commands::RemoveBook { .. }
                | Commands::MoveBook { .. }
                | Commands::AddCategory { .. }
                | Commands::RemoveCategory { .. }
                | Commands::RenameCategory { .. }
        )
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;
        let data_file = self.data.unwrap_or_else(|| cfg.data_file.clone());
        let command = self.command.unwrap_or(Commands::Shell);

        if let Commands::Config = command {
            show_config(cfg, &data_file);
            return Ok(());
        }

        let mut catalog = load_catalog(&cfg.catalog_name, &data_file).await?;
        let mutates = command.mutates();

        catalog = match command {
            Commands::Shell => run_shell(catalog).await?,
            Commands::Import { file } => {
                import_file(&mut catalog, &file).await?;
                catalog
            }
            Commands::Export { file } => {
                let written = catalog.export_file(&file).await?;
                println!(
                    "{} records have been successfully exported to {}",
                    written,
                    file.display()
                );
                catalog
            }
            Commands::List => {
                print!("{}", catalog.render());
                catalog
            }
            Commands::FindAll { category, json } => {
                find_all(&catalog, &category, json)?;
                catalog
            }
            Commands::FindBook { title, json } => {
                find_book(&catalog, &title, json)?;
                catalog
            }
            Commands::AddBook {
                title,
                author,
                isbn,
                year,
                total,
                available,
                category,
            } => {
                let available = available.unwrap_or(total);
                let book = Book::new(title.clone(), author, isbn, year, total, available);
                catalog.add_book(&category, book)?;
                println!("Book {} has been successfully added to the catalog.", title);
                catalog
            }
            Commands::RemoveBook { title, yes } => {
                remove_book(&mut catalog, &title, yes)?;
                catalog
            }
            Commands::MoveBook { title, category } => {
                catalog.move_book(&title, &category)?;
                println!("Book {} moved to {}", title, category);
                catalog
            }
            Commands::AddCategory { path } => {
                catalog.add_category(&path)?;
                println!("{} has been successfully created.", path);
                catalog
            }
            Commands::FindCategory { path } => {
                if catalog.find_category(&path) {
                    println!("Category {} was found in the catalog", path);
                } else {
                    println!("Category {} was not found in the catalog", path);
                }
                catalog
            }
            Commands::RemoveCategory { path } => {
                let removed = catalog.remove_category(&path)?;
                println!("{} has been successfully removed ({} books)", path, removed);
                catalog
            }
            Commands::RenameCategory { path, new_name } => {
                catalog.rename_category(&path, &new_name)?;
                println!("Category edited successfully");
                catalog
            }
            Commands::Config => catalog,
        };

        if mutates && cfg.autosave {
            catalog.export_file(&data_file).await?;
            debug!(path = %data_file.display(), "Saved catalog");
        }

        Ok(())
    }
}

/// Load the catalog from `data_file`, or start empty if it does not exist
async fn load_catalog(name: &str, data_file: &Path) -> Result<Catalog> {
    let mut catalog = Catalog::new(name);
    if !data_file.exists() {
        debug!(path = %data_file.display(), "No data file, starting empty");
        return Ok(catalog);
    }

    let report = catalog.import_file(data_file).await?;
    if !report.malformed.is_empty() {
        eprintln!(
            "Warning: {} lines of {} could not be read",
            report.malformed.len(),
            data_file.display()
        );
    }
    Ok(catalog)
}

async fn run_shell(catalog: Catalog) -> Result<Catalog> {
    info!(books = catalog.total_books(), "Starting shell");
    let input = BufReader::new(tokio::io::stdin());
    let mut shell = Shell::new(catalog, input, io::stdout());
    shell.run().await?;
    Ok(shell.into_catalog())
}

async fn import_file(catalog: &mut Catalog, file: &Path) -> Result<()> {
    let report = catalog.import_file(file).await?;
    println!("{} records have been imported", report.imported);
    if report.duplicates > 0 {
        println!("{} duplicate titles skipped", report.duplicates);
    }
    for skipped in report.malformed.iter() {
        println!("Line {} skipped: {}", skipped.line, skipped.reason);
    }
    Ok(())
}

fn find_all(catalog: &Catalog, category: &str, json: bool) -> Result<()> {
    let subtree = catalog
        .find_all(category)
        .with_context(|| format!("Category {} does not exist", category))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&subtree.records)?);
        return Ok(());
    }

    println!("{:<40} {:<25} {:<6} {:<9}", "TITLE", "AUTHOR", "YEAR", "AVAILABLE");
    println!("{}", "-".repeat(83));
    for book in subtree.records.iter() {
        let title_truncated = if book.title.chars().count() > 37 {
            format!("{}...", book.title.chars().take(37).collect::<String>())
        } else {
            book.title.clone()
        };
        println!(
            "{:<40} {:<25} {:<6} {}/{}",
            title_truncated,
            book.author,
            book.publication_year,
            book.available_copies,
            book.total_copies
        );
    }
    println!("\n{} records found", subtree.total);
    Ok(())
}

fn find_book(catalog: &Catalog, title: &str, json: bool) -> Result<()> {
    let Some(book) = catalog.find_book(title) else {
        println!("Book not found in the library.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(book)?);
    } else {
        println!("{}", book);
        if let Some(category) = catalog.book_category(title) {
            println!("Category : {}", category);
        }
    }
    Ok(())
}

fn remove_book(catalog: &mut Catalog, title: &str, yes: bool) -> Result<()> {
    if !yes {
        print!("Are you sure you want to delete the book \"{}\"? yes/no: ", title);
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read confirmation")?;
        if answer.trim() != "yes" {
            println!("Deletion canceled.");
            return Ok(());
        }
    }

    if catalog.remove_book(title) {
        println!("Book {} removed successfully.", title);
    } else {
        println!("Couldn't delete the book {}, book doesn't exist in the catalog", title);
    }
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig, data_file: &Path) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("  Shelf Configuration");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:      {}", cfg.home.display());
    println!("  Data file: {}", data_file.display());
    println!();
    println!("Catalog:");
    println!("  Name:      {}", cfg.catalog_name);
    println!("  Autosave:  {}", cfg.autosave);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_shell() {
        let cli = Cli::try_parse_from(["shelf"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.data.is_none());
    }

    #[test]
    fn test_parse_add_book() {
        let cli = Cli::try_parse_from([
            "shelf",
            "add-book",
            "--title",
            "Dune",
            "--author",
            "Frank Herbert",
            "--year",
            "1965",
            "--total",
            "3",
            "--category",
            "Fiction/SciFi",
            "--data",
            "/tmp/books.csv",
        ])
        .unwrap();

        assert_eq!(cli.data, Some(PathBuf::from("/tmp/books.csv")));
        match cli.command {
            Some(Commands::AddBook {
                title,
                total,
                available,
                category,
                ..
            }) => {
                assert_eq!(title, "Dune");
                assert_eq!(total, 3);
                assert_eq!(available, None);
                assert_eq!(category, "Fiction/SciFi");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_read_only_commands_do_not_save() {
        assert!(!Commands::List.mutates());
        assert!(!Commands::Config.mutates());
        assert!(Commands::Shell.mutates());
        assert!(Commands::RemoveCategory {
            path: "A".to_string()
        }
        .mutates());
    }

    #[tokio::test]
    async fn test_load_catalog_missing_file_starts_empty() {
        let temp = tempfile::TempDir::new().unwrap();
        let catalog = load_catalog("Branch", &temp.path().join("none.csv")).await.unwrap();
        assert_eq!(catalog.name(), "Branch");
        assert_eq!(catalog.total_books(), 0);
    }
}
