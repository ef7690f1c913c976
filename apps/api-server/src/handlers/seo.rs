//! Sitemap and robots.txt.

use std::fmt::Write;

use actix_web::{HttpResponse, web};
use chrono::{DateTime, SecondsFormat, Utc};

use grove_core::services::SitemapEntry;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /sitemap.xml
pub async fn sitemap(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let entries = state.posts.sitemap_entries().await?;
    let body = render_sitemap(&state.site_url, &entries, Utc::now());

    Ok(HttpResponse::Ok()
        .content_type("application/xml")
        .body(body))
}

/// GET /robots.txt
pub async fn robots(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(render_robots(&state.site_url))
}

fn render_sitemap(base: &str, entries: &[SitemapEntry], now: DateTime<Utc>) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    push_url(&mut xml, base, now, "daily", "1.0");
    push_url(&mut xml, &format!("{base}/auth"), now, "monthly", "0.8");
    for entry in entries {
        push_url(
            &mut xml,
            &format!("{base}/posts/{}", entry.slug),
            entry.updated_at,
            "weekly",
            "0.9",
        );
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: DateTime<Utc>, changefreq: &str, priority: &str) {
    // Writing to a String cannot fail.
    let _ = write!(
        xml,
        "  <url>\n    <loc>{loc}</loc>\n    <lastmod>{}</lastmod>\n    \
         <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n",
        lastmod.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
}

fn render_robots(base: &str) -> String {
    format!("User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api/\n\nSitemap: {base}/sitemap.xml\n")
}
