use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use shelf_db::Document;
use validator::{Validate, ValidationError, ValidationErrors};

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
}

impl Book {
    /// Decode a stored document into a book
    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        let fields: BookFields = serde_json::from_value(document.body)?;
        Ok(Self::with_fields(document.id, fields))
    }

    fn with_fields(id: String, fields: BookFields) -> Self {
        Self {
            id,
            title: fields.title,
            author: fields.author,
            genre: fields.genre,
            price: fields.price,
        }
    }

    /// Overwrite every field; the id is left untouched.
    pub fn apply(&mut self, fields: BookFields) {
        self.title = fields.title;
        self.author = fields.author;
        self.genre = fields.genre;
        self.price = fields.price;
    }

    pub fn fields(&self) -> BookFields {
        BookFields {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            price: self.price,
        }
    }
}

/// Validated book values; also the stored document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
}

/// Raw details-form submission. Every field is kept as submitted so a
/// rejected form can be redisplayed verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase", default)]
pub struct BookForm {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub author: String,
    #[validate(custom(function = "not_blank"))]
    pub genre: String,
    #[validate(custom(function = "valid_price"))]
    pub price: String,
}

/// Field order used when reporting violations
const FIELDS: [(&str, &str); 4] = [
    ("title", "Title"),
    ("author", "Author"),
    ("genre", "Genre"),
    ("price", "Price"),
];

impl BookForm {
    /// Run every rule and collect all violations, in field order.
    pub fn to_fields(&self) -> Result<BookFields, Vec<String>> {
        if let Err(errors) = self.validate() {
            return Err(messages(&errors));
        }

        let price = parse_price(&self.price).map_err(|e| vec![describe(&e, "Price")])?;
        Ok(BookFields {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre.trim().to_string(),
            price,
        })
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            price: book.price.to_string(),
        }
    }
}

fn messages(errors: &ValidationErrors) -> Vec<String> {
    let by_field = errors.field_errors();
    let mut out = Vec::new();
    for (field, label) in FIELDS {
        let found = by_field.iter().find(|(name, _)| {
            let name: &str = name.as_ref();
            name == field || name == label
        });
        if let Some((_, field_errors)) = found {
            out.extend(field_errors.iter().map(|e| describe(e, label)));
        }
    }
    out
}

fn describe(error: &ValidationError, label: &str) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("{label} is required"),
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn valid_price(value: &str) -> Result<(), ValidationError> {
    parse_price(value).map(|_| ())
}

/// Finite and non-negative; `-0` is stored as `0`.
fn parse_price(raw: &str) -> Result<f64, ValidationError> {
    let price = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| {
            ValidationError::new("not_a_number")
                .with_message(Cow::Borrowed("Price must be a number"))
        })?;

    if price < 0.0 {
        return Err(ValidationError::new("negative")
            .with_message(Cow::Borrowed("Price must be zero or greater")));
    }
    Ok(if price == 0.0 { 0.0 } else { price })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(title: &str, author: &str, genre: &str, price: &str) -> BookForm {
        BookForm {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn valid_form_is_trimmed() {
        let fields = form("  Dune ", "Herbert", "SciFi", " 12.5 ").to_fields().unwrap();
        assert_eq!(
            fields,
            BookFields {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                genre: "SciFi".to_string(),
                price: 12.5,
            }
        );
    }

    #[test]
    fn zero_price_is_allowed() {
        assert!(form("Free", "Anon", "Misc", "0").to_fields().is_ok());
    }

    #[test]
    fn blank_title_and_negative_price_give_two_errors() {
        let errors = form("", "A", "B", "-1").to_fields().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Title is required".to_string(),
                "Price must be zero or greater".to_string(),
            ]
        );
    }

    #[test]
    fn whitespace_only_fields_are_blank() {
        let errors = form(" \t", "\n", "   ", "3").to_fields().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Title is required".to_string(),
                "Author is required".to_string(),
                "Genre is required".to_string(),
            ]
        );
    }

    #[test]
    fn non_numeric_prices_are_rejected() {
        for price in ["", "abc", "NaN", "inf", "12,50"] {
            let errors = form("T", "A", "G", price).to_fields().unwrap_err();
            assert_eq!(errors, vec!["Price must be a number".to_string()], "{price}");
        }
    }

    #[test]
    fn negative_zero_price_is_stored_as_zero() {
        let fields = form("T", "A", "G", "-0").to_fields().unwrap();
        assert_eq!(fields.price, 0.0);
        assert!(fields.price.is_sign_positive());
        assert_eq!(serde_json::to_value(&fields).unwrap()["price"], json!(0.0));
    }

    #[test]
    fn derived_rules_report_each_field() {
        let errors = form("", "", "x", "abc").validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn form_fields_use_pascal_case_names() {
        let form: BookForm = serde_json::from_value(json!({
            "Title": "Emma",
            "Price": "9"
        }))
        .unwrap();
        assert_eq!(form.title, "Emma");
        assert_eq!(form.author, "");
        assert_eq!(form.price, "9");
    }

    #[test]
    fn apply_keeps_identifier() {
        let mut book = Book {
            id: "b1".to_string(),
            title: "Old".to_string(),
            author: "Someone".to_string(),
            genre: "Drama".to_string(),
            price: 1.0,
        };
        book.apply(form("New", "Other", "Comedy", "2").to_fields().unwrap());
        assert_eq!(book.id, "b1");
        assert_eq!(book.title, "New");
        assert_eq!(book.price, 2.0);
    }

    #[test]
    fn document_body_decodes_into_book() {
        let book = Book::from_document(Document {
            id: "b2".to_string(),
            body: json!({"title": "Emma", "author": "Austen", "genre": "Novel", "price": 7.0}),
        })
        .unwrap();
        assert_eq!(book.id, "b2");
        assert_eq!(book.author, "Austen");
        assert_eq!(BookForm::from(&book).price, "7");
    }
}
