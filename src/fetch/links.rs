// src/fetch/links.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::trace;

use crate::error::LinkError;

static TRIPS_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/getattachment/[A-Za-z0-9-]+/trips_\d{2}_\d{2}_[^/]*-csv\.[A-Za-z0-9]+$")
        .expect("trips href pattern should compile")
});

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector should parse"));

/// Collect every anchor `href` that names a monthly trips archive.
pub fn get_links(html: &str) -> HashSet<String> {
    let doc = Html::parse_document(html);
    doc.select(&ANCHOR)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| TRIPS_HREF.is_match(href))
        .inspect(|href| trace!(href, "matched trips link"))
        .map(str::to_string)
        .collect()
}

/// Same as [`get_links`] for a raw response body, which must be UTF-8 text.
pub fn get_links_from_bytes(body: &[u8]) -> Result<HashSet<String>, LinkError> {
    let html = std::str::from_utf8(body)
        .map_err(|e| LinkError::InvalidInput(format!("html must be UTF-8 text: {e}")))?;
    Ok(get_links(html))
}

/// Split `trips_YY_MM_<label>` out of a link's file name.
pub fn period_of(link: &str) -> Option<(u32, u32)> {
    let file = link.rsplit('/').next()?;
    let mut parts = file.split('_');
    parts.next()?;
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    Some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMT_ANCHOR: &str = r#"<img src="/Imagenes/Extensiones-de-archivos/zip_logo.aspx"/><a target="_blank" href="/getattachment/51ba4be6-596f-41d3-8bab-634c4be569c5/trips_21_10_October-csv.aspx" title="Datos de uso de octubre de 2021. Nueva ventana" > Datos de uso de octubre de 2021</a>"#;

    #[test]
    fn test_get_links_valid_html() {
        let html = r#"
        <a href="/getattachment/1234/trips_21_10_data-csv.aspx">Download</a>
        <a href="/getattachment/5678/trips_22_01_data-csv.aspx">Download</a>
        <a href="/getattachment/5678/trips_22_01_data-csv.aspx">Again</a>
        "#;
        let expected: HashSet<String> = [
            "/getattachment/1234/trips_21_10_data-csv.aspx",
            "/getattachment/5678/trips_22_01_data-csv.aspx",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(get_links(html), expected);
    }

    #[test]
    fn test_get_links_real_anchor() {
        let links = get_links(EMT_ANCHOR);
        assert_eq!(links.len(), 1);
        assert!(links.contains(
            "/getattachment/51ba4be6-596f-41d3-8bab-634c4be569c5/trips_21_10_October-csv.aspx"
        ));
    }

    #[test]
    fn test_get_links_no_matches() {
        assert!(get_links("<html><body>No links here</body></html>").is_empty());
        assert!(get_links("").is_empty());
    }

    #[test]
    fn test_get_links_rejects_partial_matches() {
        let html = r#"
        <a href="/getattachment//trips_21_10_data-csv.aspx">no id</a>
        <a href="/getattachment/ab/trips_2_10_data-csv.aspx">one digit year</a>
        <a href="/getattachment/ab/trips_21_10_data.aspx">no csv suffix</a>
        <a href="/getattachment/ab/bikes_21_10_data-csv.aspx">wrong prefix</a>
        <a href="https://other.host/getattachment/ab/trips_21_10_data-csv.aspx">absolute</a>
        <p>/getattachment/ab/trips_21_10_data-csv.aspx</p>
        "#;
        assert!(get_links(html).is_empty());
    }

    #[test]
    fn test_get_links_from_bytes_rejects_non_text() {
        let err = get_links_from_bytes(&[0xff, 0xfe, 0x00, 0xc3]).unwrap_err();
        assert!(matches!(err, LinkError::InvalidInput(_)));
    }

    #[test]
    fn test_period_of() {
        assert_eq!(
            period_of("/getattachment/1234/trips_22_01_January-csv.aspx"),
            Some((22, 1))
        );
        assert_eq!(period_of("/getattachment/1234/nothing.aspx"), None);
    }
}
