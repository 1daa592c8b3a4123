//! Server-rendered pages for the books module.
//!
//! Templates are looked up by name and fed a JSON context, so handlers stay
//! decoupled from markup.

use anyhow::anyhow;
use serde_json::Value;
use shelf_http::html::{escape, layout};

pub const INDEX: &str = "books/index";
pub const DETAILS: &str = "books/details";

/// Render the template called `template` with `context`.
pub fn render(template: &str, context: &Value) -> anyhow::Result<String> {
    match template {
        INDEX => Ok(index(context)),
        DETAILS => Ok(details(context)),
        other => Err(anyhow!("unknown template '{other}'")),
    }
}

/// `{ title, books: [{ id, title, author, genre, price }] }`
fn index(context: &Value) -> String {
    let books = context["books"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let mut body = String::from("<p><a href=\"/books/add\">Add a book</a></p>\n");
    if books.is_empty() {
        body.push_str("<p>No books yet.</p>");
        return layout(&text(context, "title"), &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th>Title</th><th>Author</th><th>Genre</th><th>Price</th><th></th></tr></thead>\n<tbody>\n",
    );
    for book in books {
        let id = escape(&text(book, "id"));
        body.push_str(&format!(
            "<tr><td>{title}</td><td>{author}</td><td>{genre}</td><td>{price}</td>\
             <td><a href=\"/books/{id}\">Edit</a> <a href=\"/books/delete/{id}\">Delete</a></td></tr>\n",
            title = escape(&text(book, "title")),
            author = escape(&text(book, "author")),
            genre = escape(&text(book, "genre")),
            price = escape(&text(book, "price")),
        ));
    }
    body.push_str("</tbody>\n</table>");

    layout(&text(context, "title"), &body)
}

/// `{ title, action, book: { Title, Author, Genre, Price }, errors: [..] }`
fn details(context: &Value) -> String {
    let book = &context["book"];
    let mut body = String::new();

    if let Some(errors) = context["errors"].as_array().filter(|e| !e.is_empty()) {
        body.push_str("<ul class=\"errors\">\n");
        for error in errors {
            body.push_str(&format!("<li>{}</li>\n", escape(error.as_str().unwrap_or_default())));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\n",
        escape(&text(context, "action"))
    ));
    for (name, input_type) in [
        ("Title", "text"),
        ("Author", "text"),
        ("Genre", "text"),
        ("Price", "number"),
    ] {
        let step = if input_type == "number" {
            " step=\"0.01\" min=\"0\""
        } else {
            ""
        };
        body.push_str(&format!(
            "<label>{name} <input type=\"{input_type}\" name=\"{name}\" value=\"{value}\"{step} required></label>\n",
            value = escape(&text(book, name)),
        ));
    }
    body.push_str("<button type=\"submit\">Save</button>\n<a href=\"/books/\">Cancel</a>\n</form>");

    layout(&text(context, "title"), &body)
}

/// String form of `value[key]`; missing and null render as empty.
fn text(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_lists_books_with_links() {
        let page = render(
            INDEX,
            &json!({
                "title": "Books",
                "books": [{"id": "b1", "title": "Dune", "author": "Herbert", "genre": "SciFi", "price": 12.5}]
            }),
        )
        .unwrap();

        assert!(page.contains("<td>Dune</td>"));
        assert!(page.contains("<td>12.5</td>"));
        assert!(page.contains("href=\"/books/b1\""));
        assert!(page.contains("href=\"/books/delete/b1\""));
    }

    #[test]
    fn empty_index_says_so() {
        let page = render(INDEX, &json!({"title": "Books", "books": []})).unwrap();
        assert!(page.contains("No books yet."));
    }

    #[test]
    fn details_prefills_and_escapes() {
        let page = render(
            DETAILS,
            &json!({
                "title": "Edit book",
                "action": "/books/b1",
                "book": {"Title": "<Dune>", "Author": "Herbert", "Genre": "SciFi", "Price": "12.5"},
                "errors": ["Price must be zero or greater"]
            }),
        )
        .unwrap();

        assert!(page.contains("action=\"/books/b1\""));
        assert!(page.contains("value=\"&lt;Dune&gt;\""));
        assert!(page.contains("<li>Price must be zero or greater</li>"));
    }

    #[test]
    fn empty_details_form_has_no_error_list() {
        let page = render(
            DETAILS,
            &json!({"title": "Add new book", "action": "/books/add", "book": {}}),
        )
        .unwrap();
        assert!(page.contains("name=\"Title\" value=\"\""));
        assert!(!page.contains("class=\"errors\""));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(render("books/missing", &json!({})).is_err());
    }
}
