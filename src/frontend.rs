use actix_web::{http::header::ContentType, HttpResponse, Responder};

// ============================================================================
// Browser page served by the store
// ============================================================================

const INDEX_HTML: &str = include_str!("../frontend/index.html");
const APP_JS: &str = include_str!("../frontend/app.js");

pub async fn index() -> impl Responder {
    HttpResponse::Ok().content_type(ContentType::html()).body(INDEX_HTML)
}

pub async fn script() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .body(APP_JS)
}

/// Keys of the `STATUS_CARDS` table in the page script, i.e. the labels
/// the renderer knows how to show.
#[cfg(test)]
fn rendered_labels(script: &str) -> Vec<&str> {
    script
        .lines()
        .skip_while(|line| !line.starts_with("const STATUS_CARDS"))
        .skip(1)
        .take_while(|line| !line.starts_with("};"))
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix('"')?;
            rest.split_once("\":").map(|(label, _)| label)
        })
        .collect()
}
