use serde::Serialize;

/// One control in the page navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum PageLink {
    Number(usize),
    Ellipsis,
}

/// Page numbers to show around `current`, with gaps collapsed.
///
/// Up to five pages are listed in full. Beyond that: the first page, the
/// neighbours of `current`, and the last page, with an ellipsis for each gap.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 5 {
        return (1..=total).map(PageLink::Number).collect();
    }

    let mut links = vec![PageLink::Number(1)];
    if current > 3 {
        links.push(PageLink::Ellipsis);
    }
    let lo = current.saturating_sub(1).max(2);
    let hi = (current + 1).min(total - 1);
    links.extend((lo..=hi).map(PageLink::Number));
    if current + 2 < total {
        links.push(PageLink::Ellipsis);
    }
    links.push(PageLink::Number(total));
    links
}

/// Site-relative path of a listing page. Page 1 is the home page.
pub fn page_path(page: usize) -> String {
    if page <= 1 { "/".to_string() } else { format!("/page/{}/", page) }
}
