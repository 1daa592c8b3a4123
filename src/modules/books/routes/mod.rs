//! HTTP handlers for `/books`.

use std::sync::Arc;

use axum::extract::{FromRef, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde_json::{json, Value};
use shelf_http::error::AppError;

use super::flash::{Flash, FlashStore};
use super::models::BookForm;
use super::repository::BookRepository;
use super::views;

const LIST_PATH: &str = "/books/";
const ADD_PATH: &str = "/books/add";

const FLASH_ERRORS: &str = "error";
const FLASH_BOOK: &str = "book";

/// Shared handler state
#[derive(Clone)]
pub struct BooksState {
    pub books: BookRepository,
    pub flash: Arc<FlashStore>,
}

impl FromRef<BooksState> for Arc<FlashStore> {
    fn from_ref(state: &BooksState) -> Self {
        state.flash.clone()
    }
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/books", get(list_books))
        .route(LIST_PATH, get(list_books))
        .route(ADD_PATH, get(add_form).post(create_book))
        .route("/books/delete/{id}", get(delete_book))
        .route("/books/{id}", get(edit_form).post(update_book))
        .with_state(state)
}

async fn list_books(State(state): State<BooksState>) -> Result<Html<String>, AppError> {
    let books = state.books.find_all().await?;
    let page = views::render(views::INDEX, &json!({ "title": "Books", "books": books }))?;
    Ok(Html(page))
}

async fn add_form(flash: Flash) -> Result<Html<String>, AppError> {
    let (book, errors) = take_rejected(&flash, ADD_PATH).await.unzip();

    let page = views::render(
        views::DETAILS,
        &json!({
            "title": "Add new book",
            "action": ADD_PATH,
            "book": book.unwrap_or_else(|| json!({})),
            "errors": errors.unwrap_or_else(|| json!([])),
        }),
    )?;
    Ok(Html(page))
}

async fn create_book(
    State(state): State<BooksState>,
    flash: Flash,
    Form(form): Form<BookForm>,
) -> Result<Response, AppError> {
    let fields = match form.to_fields() {
        Ok(fields) => fields,
        Err(errors) => return Ok(reject(&flash, errors, &form, ADD_PATH).await),
    };

    let book = state.books.create(fields).await?;
    tracing::info!(book_id = %book.id, title = %book.title, "book created");

    Ok(found(LIST_PATH))
}

async fn edit_form(
    State(state): State<BooksState>,
    flash: Flash,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let action = book_path(&id);
    let rejected = take_rejected(&flash, &action).await;

    let Some(stored) = state.books.find_by_id(&id).await? else {
        return Err(AppError::not_found(format!("book '{id}' not found")));
    };

    // A just-rejected submission for this book is shown as typed
    let (book, errors) = match rejected {
        Some(rejected) => rejected,
        None => (
            serde_json::to_value(BookForm::from(&stored)).map_err(|e| AppError::Internal(e.into()))?,
            json!([]),
        ),
    };

    let page = views::render(
        views::DETAILS,
        &json!({
            "title": "Edit book",
            "action": action,
            "book": book,
            "errors": errors,
        }),
    )?;
    Ok(Html(page))
}

async fn update_book(
    State(state): State<BooksState>,
    flash: Flash,
    Path(id): Path<String>,
    Form(form): Form<BookForm>,
) -> Result<Response, AppError> {
    let fields = match form.to_fields() {
        Ok(fields) => fields,
        Err(errors) => return Ok(reject(&flash, errors, &form, &book_path(&id)).await),
    };

    match state.books.update(&id, fields).await? {
        Some(book) => {
            tracing::info!(book_id = %book.id, "book updated");
            Ok(found(LIST_PATH))
        }
        None => Err(AppError::not_found(format!("book '{id}' not found"))),
    }
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let removed = state.books.delete(&id).await?;
    tracing::info!(book_id = %id, removed, "book delete requested");
    Ok(found(LIST_PATH))
}

/// Plain 302 redirect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Edit-form path with the id percent-encoded as one segment
fn book_path(id: &str) -> String {
    format!("/books/{}", urlencoding::encode(id))
}

/// Stash the rejected submission and point the browser back at its form.
async fn reject(flash: &Flash, errors: Vec<String>, form: &BookForm, location: &str) -> Response {
    tracing::info!(target_form = location, errors = ?errors, "book form rejected");

    flash.set(FLASH_ERRORS, Value::from(errors)).await;
    match serde_json::to_value(form) {
        Ok(book) => {
            flash
                .set(FLASH_BOOK, json!({ "action": location, "form": book }))
                .await
        }
        Err(e) => tracing::warn!(error = %e, "could not stash rejected form"),
    }

    let body = format!(
        "<p>The form has errors. <a href=\"{0}\">Back to the form</a></p>",
        shelf_http::html::escape(location)
    );
    let mut response = (StatusCode::BAD_REQUEST, Html(body)).into_response();

    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => tracing::warn!(error = %e, "form path is not a valid header value"),
    }
    if let Some(cookie) = flash.cookie() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// Consume both flash keys; the stashed form and its errors are returned
/// only when they were rejected from `action`.
async fn take_rejected(flash: &Flash, action: &str) -> Option<(Value, Value)> {
    let errors = flash.take(FLASH_ERRORS).await;
    let mut stashed = flash.take(FLASH_BOOK).await?;

    if stashed.get("action").and_then(Value::as_str) != Some(action) {
        tracing::debug!(action, "ignoring flash stashed for another form");
        return None;
    }
    Some((
        stashed["form"].take(),
        errors.unwrap_or_else(|| json!([])),
    ))
}
