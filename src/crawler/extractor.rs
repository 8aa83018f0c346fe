//! HTML extraction for catalog pages
//!
//! This module turns fetched document bodies into navigation links and
//! structured book records:
//! - Category links from the catalog root sidebar
//! - Book detail links and the next-page link from listing pages
//! - Full book records from detail pages
//!
//! Every function here is pure: HTML in, data out. Link-returning
//! functions degrade to empty results on missing markup; only
//! [`extract_book_detail`] can fail, and only when a field the record
//! cannot exist without is absent.

use crate::store::BookRecord;
use chrono::Utc;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors from parsing a book detail page
#[derive(Debug, Error)]
pub enum ParseError {
    /// A field the record cannot exist without is absent
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The detail page carries no attribute table at all
    #[error("Malformed attribute table: {0}")]
    MalformedTable(String),
}

/// Star-rating class words in ascending order
const RATING_CLASSES: [(&str, u8); 5] = [
    ("One", 1),
    ("Two", 2),
    ("Three", 3),
    ("Four", 4),
    ("Five", 5),
];

/// Extracts category links from the catalog root page
///
/// Selects every anchor in the sidebar category list and resolves each
/// href against the catalog root. The first entry is the all-books
/// pseudo-category; every book in it reappears under a real category, so
/// it is always dropped.
///
/// # Arguments
///
/// * `html` - The catalog root page body
/// * `base_url` - The catalog root URL hrefs resolve against
///
/// # Returns
///
/// Absolute category URLs, one per real category; empty when the sidebar
/// is missing
pub fn extract_category_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("div.side_categories a") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base_url) {
                    links.push(absolute);
                }
            }
        }
    }

    if !links.is_empty() {
        links.remove(0);
    }

    links
}

/// Extracts book detail links from a category listing page
///
/// Listing pages live at varying path depths, so hrefs resolve against
/// the listing page's own URL rather than the catalog root.
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `page_url` - The URL the listing page was fetched from
///
/// # Returns
///
/// Absolute detail-page URLs in listing order
pub fn extract_book_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("article.product_pod h3 a") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, page_url) {
                    links.push(absolute);
                }
            }
        }
    }

    links
}

/// Extracts the next-page link from a category listing page
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `page_url` - The URL the listing page was fetched from
///
/// # Returns
///
/// The absolute URL of the next page, or None on the last page
pub fn extract_next_page_link(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("li.next a").ok()?;

    let element = document.select(&selector).next()?;
    let href = element.value().attr("href")?;
    resolve_link(href, page_url)
}

/// Extracts a full book record from a detail page
///
/// Title, cover and category are required; everything else degrades to a
/// harmless default. The attribute table is kept in page order, with the
/// mis-decoded pound sign repaired on currency-bearing values. Price and
/// review count are derived from the repaired table so that query filters
/// never have to parse strings.
///
/// # Arguments
///
/// * `html` - The detail page body
/// * `page_url` - The URL the detail page was fetched from
///
/// # Returns
///
/// * `Ok(BookRecord)` - The extracted record, stamped with the current time
/// * `Err(ParseError)` - A required field or the attribute table is missing
pub fn extract_book_detail(html: &str, page_url: &Url) -> Result<BookRecord, ParseError> {
    let document = Html::parse_document(html);

    let title = select_first_text(&document, "h1").ok_or(ParseError::MissingField("title"))?;

    let cover_url = select_first_attr(&document, "img", "src")
        .and_then(|src| resolve_link(src, page_url))
        .map(|url| url.to_string())
        .ok_or(ParseError::MissingField("cover"))?;

    let category =
        extract_breadcrumb_category(&document).ok_or(ParseError::MissingField("category"))?;

    let rating = extract_rating(&document);

    // The description is kept verbatim, whitespace included
    let description =
        select_first_attr(&document, "meta[name='description']", "content").map(String::from);

    let attributes = extract_attribute_table(&document)?;
    let price = parse_price(attribute_value(&attributes, "Price (excl. tax)"));
    let review_count = parse_review_count(attribute_value(&attributes, "Number of reviews"));

    Ok(BookRecord {
        title,
        category,
        cover_url,
        rating,
        description,
        attributes,
        price,
        review_count,
        scraped_at: Utc::now(),
    })
}

/// Resolves an href against the page it appeared on, keeping http(s) only
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// First matching element's text, trimmed; None when empty or absent
fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let text = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First matching element's attribute value, untrimmed
fn select_first_attr<'a>(document: &'a Html, selector: &str, attr: &str) -> Option<&'a str> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()?.value().attr(attr)
}

/// Category from the second-to-last breadcrumb entry
///
/// The last crumb is the book itself; the one before it is the category
/// the book is filed under.
fn extract_breadcrumb_category(document: &Html) -> Option<String> {
    let selector = Selector::parse("ul.breadcrumb li").ok()?;
    let crumbs: Vec<_> = document.select(&selector).collect();

    if crumbs.len() < 2 {
        return None;
    }

    let text = crumbs[crumbs.len() - 2]
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Star rating from the first paragraph carrying a rating class word
fn extract_rating(document: &Html) -> Option<u8> {
    let selector = Selector::parse("p").ok()?;

    for element in document.select(&selector) {
        for (word, value) in RATING_CLASSES {
            if element.value().classes().any(|class| class == word) {
                return Some(value);
            }
        }
    }

    None
}

/// Label/value pairs from the detail page attribute table, in page order
///
/// Rows without exactly one label cell and one value cell are skipped
/// rather than failing the record. A page with no table at all is the
/// only hard failure.
fn extract_attribute_table(document: &Html) -> Result<Vec<(String, String)>, ParseError> {
    let table_selector = Selector::parse("table")
        .map_err(|e| ParseError::MalformedTable(e.to_string()))?;
    let row_selector =
        Selector::parse("tr").map_err(|e| ParseError::MalformedTable(e.to_string()))?;
    let cell_selector =
        Selector::parse("th, td").map_err(|e| ParseError::MalformedTable(e.to_string()))?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| ParseError::MalformedTable("detail page has no attribute table".to_string()))?;

    let mut attributes = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<_> = row.select(&cell_selector).collect();
        if cells.len() != 2 {
            continue;
        }

        let label = cells[0].text().collect::<String>().trim().to_string();
        let mut value = cells[1].text().collect::<String>().trim().to_string();

        if label.contains("Price") || label == "Tax" {
            value = repair_currency(&value);
        }

        attributes.push((label, value));
    }

    Ok(attributes)
}

/// Repairs the double-encoded pound sign the source pages carry
fn repair_currency(value: &str) -> String {
    value.replace("Â£", "£")
}

/// Numeric price from a currency-formatted attribute value
///
/// Strips everything except digits and the decimal point, so currency
/// symbols and thousands separators both fall away. Unparseable input
/// yields 0.0 rather than an error.
fn parse_price(value: Option<&str>) -> f64 {
    value
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect::<String>()
        })
        .and_then(|cleaned| cleaned.parse().ok())
        .unwrap_or(0.0)
}

/// Review count from its attribute value; absent or unparseable is zero
fn parse_review_count(value: Option<&str>) -> u32 {
    value.and_then(|raw| raw.trim().parse().ok()).unwrap_or(0)
}

/// Value of the first attribute with the given label
fn attribute_value<'a>(attributes: &'a [(String, String)], label: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key == label)
        .map(|(_, value)| value.as_str())
}
