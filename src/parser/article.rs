use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;
use crate::store::{ArticleRecord, SOURCE_WIKIPEDIA};

/// Articles at or below this many characters are dropped.
pub const MIN_CONTENT_CHARS: usize = 200;

static CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.mw-parser-output").unwrap());
static FIRST_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1#firstHeading").unwrap());
static H1_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

/// Parse an article page into a record.
pub fn extract(html: &str, url: &str) -> Result<ArticleRecord, ExtractError> {
    let doc = Html::parse_document(html);

    let content_div = doc
        .select(&CONTENT_SEL)
        .next()
        .ok_or(ExtractError::MissingContent)?;

    let title = doc
        .select(&FIRST_HEADING_SEL)
        .next()
        .or_else(|| doc.select(&H1_SEL).next())
        .ok_or(ExtractError::MissingTitle)?;
    let title = element_text(title);

    let content = top_level_paragraphs(content_div).join(" ");
    let chars = content.chars().count();
    if chars <= MIN_CONTENT_CHARS {
        return Err(ExtractError::TooShort { chars });
    }

    Ok(ArticleRecord {
        title,
        content,
        source: SOURCE_WIKIPEDIA.to_string(),
        url: url.to_string(),
    })
}

/// Trimmed text of the direct `<p>` children that sit outside any table.
fn top_level_paragraphs(container: ElementRef<'_>) -> Vec<String> {
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "p")
        .filter(|el| !inside_table(*el))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn inside_table(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(|n| n.value().as_element())
        .any(|e| e.name() == "table")
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

// ── Tests ──
