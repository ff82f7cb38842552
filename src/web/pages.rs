//! Minimal HTML rendering for the browser-facing pages.

use crate::models::{format_timestamp, Overview, UrlMapping};

/// Message shown once on the index page after a form submission.
pub enum Flash {
    Success(String),
    Error(String),
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn index_page(flash: Option<Flash>, api_key_required: bool) -> String {
    let mut body = String::from("<h1>Shorten a URL</h1>\n");

    match flash {
        Some(Flash::Success(link)) => {
            let link = escape(&link);
            body.push_str(&format!(
                "<p class=\"flash success\">Your short URL: <a href=\"{link}\">{link}</a></p>\n"
            ));
        }
        Some(Flash::Error(message)) => {
            body.push_str(&format!(
                "<p class=\"flash error\">{}</p>\n",
                escape(&message)
            ));
        }
        None => {}
    }

    body.push_str("<form method=\"post\" action=\"/\">\n");
    body.push_str("<label>URL <input type=\"text\" name=\"url\" required></label>\n");
    body.push_str("<label>Custom short URL <input type=\"text\" name=\"short\"></label>\n");
    body.push_str("<label>Expiry (ISO 8601) <input type=\"text\" name=\"expiry\"></label>\n");
    if api_key_required {
        body.push_str("<label>API key <input type=\"password\" name=\"api_key\"></label>\n");
    }
    body.push_str("<button type=\"submit\">Shorten</button>\n</form>");

    layout("Shorten a URL", &body)
}

pub fn overview_page(overview: &Overview, deploy_url: &str) -> String {
    let mut body = format!(
        "<h1>Analytics</h1>\n<p>Short URLs: {}</p>\n<p>Total views: {}</p>\n",
        overview.url_count, overview.total_views
    );

    if let Some(urls) = &overview.urls {
        body.push_str(
            "<table>\n<tr><th>Short URL</th><th>Source</th><th>Created (UTC)</th><th>Expiry</th><th>Views</th></tr>\n",
        );
        for row in urls {
            body.push_str(&format!(
                "<tr><td><a href=\"/analytics/{code}\">{deploy}{code}</a></td><td>{source}</td><td>{created}</td><td>{expiry}</td><td>{views}</td></tr>\n",
                code = escape(&row.short_url),
                deploy = escape(deploy_url),
                source = escape(&row.source_url),
                created = escape(&row.created_utc),
                expiry = escape(row.expiry.as_deref().unwrap_or("never")),
                views = row.views,
            ));
        }
        body.push_str("</table>");
    }

    layout("Analytics", &body)
}

pub fn mapping_page(mapping: &UrlMapping, deploy_url: &str) -> String {
    let body = format!(
        "<h1>{deploy}{code}</h1>\n<dl>\n<dt>Source URL</dt><dd>{source}</dd>\n<dt>Created (UTC)</dt><dd>{created}</dd>\n<dt>Expiry</dt><dd>{expiry}</dd>\n<dt>Views</dt><dd>{views}</dd>\n</dl>",
        deploy = escape(deploy_url),
        code = escape(&mapping.short_code),
        source = escape(&mapping.source_url),
        created = format_timestamp(mapping.created_utc),
        expiry = mapping
            .expiry
            .map(format_timestamp)
            .unwrap_or_else(|| "never".to_string()),
        views = mapping.views,
    );

    layout("Analytics", &body)
}

pub fn not_found_page(short_code: &str) -> String {
    layout(
        "Not found",
        &format!(
            "<h1>Not found</h1>\n<p>No short URL found for '{}'.</p>",
            escape(short_code)
        ),
    )
}
