//! Delimited-text interchange format.
//!
//! One book per line, seven comma-separated fields in header order:
//!
//! ```text
//! Title,Author,ISBN,Publication Year,Category,Total Copies,Available Copies
//! "Gravitation, Vol. 1",Misner,0716703440,1973,Science/Physics,2,1
//! ```
//!
//! A field containing a comma or a double quote is wrapped in double quotes,
//! with inner quotes doubled.

use std::borrow::Cow;

use thiserror::Error;

use crate::core::GrowableArray;
use crate::domain::{Book, BookError};

/// Header line written on export and skipped on import
pub const HEADER: &str =
    "Title,Author,ISBN,Publication Year,Category,Total Copies,Available Copies";

/// Fields per line
pub const FIELD_COUNT: usize = 7;

pub const DELIMITER: char = ',';

const QUOTE: char = '"';

/// Why a line could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLine {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unterminated quoted field")]
    UnterminatedQuote,

    #[error(transparent)]
    Book(#[from] BookError),
}

/// One parsed line: a book plus the category path it is filed under
#[derive(Debug)]
pub struct BookRow {
    pub category: String,
    pub book: Book,
}

/// Split a line into fields, honoring quotes
pub fn split_fields(line: &str) -> Result<GrowableArray<String>, MalformedLine> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = GrowableArray::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    field.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == QUOTE {
            in_quotes = true;
        } else if c == DELIMITER {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return Err(MalformedLine::UnterminatedQuote);
    }
    fields.push(field);
    Ok(fields)
}

fn parse_number<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, MalformedLine> {
    value
        .trim()
        .parse()
        .map_err(|_| MalformedLine::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Parse one data line
pub fn parse_line(line: &str) -> Result<BookRow, MalformedLine> {
    let fields = split_fields(line)?;
    if fields.len() != FIELD_COUNT {
        return Err(MalformedLine::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    let title = next();
    let author = next();
    let isbn = next();
    let year = parse_number("publication year", &next())?;
    let category = next();
    let total = parse_number("total copies", &next())?;
    let available = parse_number("available copies", &next())?;

    let book = Book::new(title, author, isbn, year, total, available);
    book.validate()?;
    Ok(BookRow { category, book })
}

/// Quote a field if it contains the delimiter or a quote
pub fn quote_field(value: &str) -> Cow<'_, str> {
    if value.contains(DELIMITER) || value.contains(QUOTE) {
        Cow::Owned(format!("\"{}\"", value.replace(QUOTE, "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Format one book and its category path as a line (without newline)
pub fn format_row(book: &Book, category: &str) -> String {
    let year = book.publication_year.to_string();
    let total = book.total_copies.to_string();
    let available = book.available_copies.to_string();
    let fields = [
        book.title.as_str(),
        book.author.as_str(),
        book.isbn.as_str(),
        year.as_str(),
        category,
        total.as_str(),
        available.as_str(),
    ];

    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        line.push_str(&quote_field(field));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<String> {
        split_fields(line).unwrap().into_iter().collect()
    }

    #[test]
    fn test_split_plain_and_quoted() {
        assert_eq!(fields("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(fields("\"x, y\",z"), vec!["x, y", "z"]);
        assert_eq!(fields("\"say \"\"hi\"\"\",1"), vec!["say \"hi\"", "1"]);
        assert_eq!(fields("trailing\r"), vec!["trailing"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(split_fields("\"open,b"), Err(MalformedLine::UnterminatedQuote));
    }

    #[test]
    fn test_parse_line() {
        let line = "\"Gravitation, Vol. 1\",Misner,0716703440,1973,Science/Physics,2,1";
        let row = parse_line(line).unwrap();
        assert_eq!(row.category, "Science/Physics");
        assert_eq!(row.book.title, "Gravitation, Vol. 1");
        assert_eq!(row.book.publication_year, 1973);
        assert_eq!(row.book.total_copies, 2);
        assert_eq!(row.book.available_copies, 1);
    }

    #[test]
    fn test_parse_line_rejects_bad_input() {
        assert_eq!(
            parse_line("a,b,c").unwrap_err(),
            MalformedLine::FieldCount {
                expected: 7,
                found: 3
            }
        );
        assert!(matches!(
            parse_line("T,A,1,nineteen,C,1,1"),
            Err(MalformedLine::InvalidNumber { field: "publication year", .. })
        ));
        assert!(matches!(
            parse_line("T,A,1,1999,C,1,2"),
            Err(MalformedLine::Book(BookError::CopiesExceedTotal { .. }))
        ));
    }

    #[test]
    fn test_format_row_quotes_delimiters() {
        let book = Book::new("War, Peace", "Tolstoy", "1", 1869, 2, 2);
        assert_eq!(
            format_row(&book, "Fiction/Russian"),
            "\"War, Peace\",Tolstoy,1,1869,Fiction/Russian,2,2"
        );

        let quoted = Book::new("The \"Best\" Book", "Anon", "2", 2000, 1, 0);
        let line = format_row(&quoted, "Misc");
        let row = parse_line(&line).unwrap();
        assert_eq!(row.book.title, "The \"Best\" Book");
        assert_eq!(row.book.available_copies, 0);
    }

    #[test]
    fn test_header_has_field_count_columns() {
        assert_eq!(fields(HEADER).len(), FIELD_COUNT);
    }
}
