//! HTML pages returned by the handlers.
//!
//! Pages are deliberately bare: the upload confirmation keeps the exact
//! `<html><body><p>..</p></body></html>` shape that existing form posts expect.

use crate::storage::StoredFile;

pub const NO_FILE_MESSAGE: &str = "No file was uploaded";

/// Escape text for use in HTML element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Wrap an already-escaped message in the confirmation page.
fn message_page(message: &str) -> String {
    format!("<html><body>\n<p>{message}</p>\n</body></html>\n")
}

/// Confirmation page for an upload request. `None` means the form carried no file.
pub fn upload_result(stored: Option<&StoredFile>) -> String {
    match stored {
        Some(file) => message_page(&format!(
            "The file \"{name}\" was uploaded successfully\n<img src=\"{src}\" />",
            name = escape(&file.name),
            src = escape(&file.url),
        )),
        None => message_page(NO_FILE_MESSAGE),
    }
}

/// The form that posts to the upload handler.
pub fn upload_form(action: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Upload</title>
</head>
<body>
    <form method="post" action="{action}" enctype="multipart/form-data">
        <p><label>a <input type="text" name="a"></label></p>
        <p><label>b <input type="text" name="b"></label></p>
        <p><input type="file" name="file" accept="image/jpeg"></p>
        <p><button type="submit">Upload</button></p>
    </form>
</body>
</html>
"#,
        action = escape(action)
    )
}

pub fn sum(a: f64, b: f64) -> String {
    format!("<h1>add</h1>\n<output>{a} + {b} = {}</output>\n", a + b)
}
