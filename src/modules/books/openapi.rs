use serde_json::{json, Value};

/// OpenAPI fragment for the books pages, merged into the host document.
pub fn document() -> Value {
    let html_page = |description: &str| {
        json!({
            "description": description,
            "content": { "text/html": { "schema": { "type": "string" } } }
        })
    };
    let redirect = |description: &str| {
        json!({
            "description": description,
            "headers": { "Location": { "schema": { "type": "string" } } }
        })
    };
    let form_body = json!({
        "required": true,
        "content": {
            "application/x-www-form-urlencoded": {
                "schema": { "$ref": "#/components/schemas/BookForm" }
            }
        }
    });
    let id_param = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    }]);

    json!({
        "paths": {
            "/books/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": html_page("Book list page"),
                        "500": html_page("Store failure")
                    }
                }
            },
            "/books/add": {
                "get": {
                    "summary": "Blank (or previously rejected) book form",
                    "tags": ["Books"],
                    "responses": { "200": html_page("Book form page") }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": form_body.clone(),
                    "responses": {
                        "302": redirect("Created; back to the list"),
                        "400": redirect("Rejected; back to the form with errors flashed"),
                        "500": html_page("Store failure")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Edit form for a book",
                    "tags": ["Books"],
                    "parameters": id_param.clone(),
                    "responses": {
                        "200": html_page("Book form page"),
                        "404": html_page("No book with this id")
                    }
                },
                "post": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": id_param.clone(),
                    "requestBody": form_body,
                    "responses": {
                        "302": redirect("Updated; back to the list"),
                        "400": redirect("Rejected; back to the form with errors flashed"),
                        "404": html_page("No book with this id")
                    }
                }
            },
            "/books/delete/{id}": {
                "get": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "responses": {
                        "302": redirect("Back to the list, whether or not the book existed")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "BookForm": {
                    "type": "object",
                    "properties": {
                        "Title": { "type": "string", "minLength": 1 },
                        "Author": { "type": "string", "minLength": 1 },
                        "Genre": { "type": "string", "minLength": 1 },
                        "Price": { "type": "number", "minimum": 0 }
                    },
                    "required": ["Title", "Author", "Genre", "Price"]
                }
            }
        }
    })
}
