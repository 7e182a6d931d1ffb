//! HTML pages. The service renders four fixed pages, so they are built with
//! `format!` around a shared layout; all dynamic text goes through `escape_html`.

use axum::http::StatusCode;

use crate::summary::Summary;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:42rem;margin:3rem auto;padding:0 1rem;line-height:1.5;color:#222}\
h1{font-size:1.6rem}form{display:grid;gap:1rem}textarea{min-height:10rem;font:inherit}\
.summary{padding:1rem;border-left:4px solid #2a6;background:#f5faf7}\
.notice{color:#8a5a00}a{color:#2a6}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Upload form served at `GET /`.
pub fn index_page() -> String {
    layout(
        "Resume Summarizer",
        "<h1>Resume Summarizer</h1>\n\
<p>Upload a resume (PDF, DOCX, TXT, JPG or PNG) or paste its text to get a short summary \
of the candidate's education, experience and skills.</p>\n\
<form action=\"/summarize\" method=\"post\" enctype=\"multipart/form-data\">\n\
<label>Resume file <input type=\"file\" name=\"file\" accept=\".pdf,.docx,.txt,.jpg,.jpeg,.png\"></label>\n\
<label>Or paste resume text<textarea name=\"text\"></textarea></label>\n\
<button type=\"submit\">Summarize</button>\n\
</form>",
    )
}

/// Result page for `POST /summarize`.
pub fn summary_page(summary: &Summary, source: &str) -> String {
    let notice = if summary.complete {
        String::new()
    } else {
        "<p class=\"notice\">The summary may be cut short: the model did not finish its last \
sentence within the allowed attempts.</p>\n"
            .to_string()
    };

    let body = format!(
        "<h1>Resume Summary</h1>\n<p>Source: {source}</p>\n\
<div class=\"summary\"><p>{text}</p></div>\n{notice}\
<p><a href=\"/\">Summarize another resume</a></p>",
        source = escape_html(source),
        text = escape_html(&summary.text),
    );
    layout("Resume Summary", &body)
}

/// Page returned with HTTP 429 once a client spends its daily quota.
pub fn too_many_requests_page() -> String {
    layout(
        "Too Many Requests",
        "<h1>Too Many Requests</h1>\n\
<p>You have reached the daily limit of summaries for your address. Please try again later.</p>\n\
<p><a href=\"/\">Back to the upload form</a></p>",
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h1>{code} {title}</h1>\n<p>{message}</p>\n<p><a href=\"/\">Back to the upload form</a></p>",
        code = status.as_u16(),
        title = escape_html(title),
        message = escape_html(message),
    );
    layout(title, &body)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
