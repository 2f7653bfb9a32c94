use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static GROUP_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.mw-category-group a").unwrap());

/// Non-article namespaces: category, special, project, help and portal pages.
static EXCLUDED_NS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/wiki/(Kategorie|Spesiaal|Wikipedia|Hulp|Portaal):").unwrap());

pub fn category_url(base_url: &str, name: &str) -> String {
    format!("{}/wiki/Kategorie:{}", base_url.trim_end_matches('/'), name)
}

pub fn article_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// True for `/wiki/...` paths outside the excluded namespaces.
pub fn is_article_path(href: &str) -> bool {
    href.starts_with("/wiki/") && !EXCLUDED_NS_RE.is_match(href)
}

/// Article paths listed in the category groups of a listing page, in document order.
pub fn article_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&GROUP_LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_article_path(href))
        .map(|href| href.to_string())
        .collect()
}
