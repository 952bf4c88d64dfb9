use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// An entry of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Page(n) => serializer.serialize_u32(*n),
            PageItem::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

impl std::fmt::Display for PageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{}", n),
            PageItem::Ellipsis => write!(f, "..."),
        }
    }
}

/// Build the pagination bar for `current_page` out of `total_pages`.
/// Up to seven pages are listed in full; beyond that the first and last
/// pages stay visible and the gaps collapse into ellipses.
pub fn generate_pagination(current_page: u32, total_pages: u32) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Page};

    if total_pages <= 7 {
        return (1..=total_pages).map(Page).collect();
    }

    if current_page <= 3 {
        return vec![
            Page(1),
            Page(2),
            Page(3),
            Ellipsis,
            Page(total_pages - 1),
            Page(total_pages),
        ];
    }

    if current_page >= total_pages - 2 {
        return vec![
            Page(1),
            Page(2),
            Ellipsis,
            Page(total_pages - 2),
            Page(total_pages - 1),
            Page(total_pages),
        ];
    }

    vec![
        Page(1),
        Ellipsis,
        Page(current_page - 1),
        Page(current_page),
        Page(current_page + 1),
        Ellipsis,
        Page(total_pages),
    ]
}

/// Format a calendar date the way the dashboard tables show it, e.g. "Dec 6, 2022".
pub fn format_date_to_local(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
