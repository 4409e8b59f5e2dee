//! Page links for the bookings and history lists.

use serde::Serialize;

/// Page size of the bookings and history lists.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Page numbers to link to, `None` standing for an ellipsis. Keeps
/// `edge` pages at both ends and `around` pages on each side of the current
/// one.
fn page_links(total_pages: usize, current_page: usize, edge: usize, around: usize) -> Vec<Option<usize>> {
    if total_pages == 0 {
        return vec![];
    }

    let mut links = Vec::new();
    let mut previous = 0;
    for page in 1..=total_pages {
        let near_edge = page <= edge || page > total_pages.saturating_sub(edge);
        let near_current =
            page.saturating_add(around) >= current_page && page <= current_page.saturating_add(around);
        if !(near_edge || near_current) {
            continue;
        }
        if page > previous + 1 {
            links.push(None);
        }
        links.push(Some(page));
        previous = page;
    }
    links
}

#[derive(Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pages: Vec<Option<usize>>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Paginated<T> {
    /// Cuts page `page` (1-based) out of the full list. Pages outside the
    /// list read as the nearest existing one.
    pub fn paginate(all: Vec<T>, page: usize) -> Self {
        let total_items = all.len();
        let total_pages = total_items.div_ceil(DEFAULT_ITEMS_PER_PAGE);
        let page = page.clamp(1, total_pages.max(1));
        let items = all
            .into_iter()
            .skip((page - 1) * DEFAULT_ITEMS_PER_PAGE)
            .take(DEFAULT_ITEMS_PER_PAGE)
            .collect();

        Self {
            items,
            pages: page_links(total_pages, page, 1, 2),
            page,
            total_pages,
            total_items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pages: self.pages,
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_pages_of_ten() {
        let first = Paginated::paginate((1..=23).collect::<Vec<_>>(), 0);
        assert_eq!(first.page, 1);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);

        let last = Paginated::paginate((1..=23).collect::<Vec<_>>(), 3);
        assert_eq!(last.items, vec![21, 22, 23]);

        let beyond = Paginated::paginate((1..=23).collect::<Vec<_>>(), 4);
        assert_eq!(beyond.page, 3);
        assert_eq!(beyond.items, vec![21, 22, 23]);
    }

    #[test]
    fn huge_page_numbers_read_as_the_last_page() {
        let page = Paginated::paginate(vec![1, 2, 3], usize::MAX);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![1, 2, 3]);

        let empty = Paginated::paginate(Vec::<i32>::new(), usize::MAX);
        assert_eq!(empty.page, 1);
        assert!(empty.items.is_empty());

        assert_eq!(page_links(3, usize::MAX, 1, 2), vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn links_collapse_distant_pages() {
        assert_eq!(
            page_links(10, 5, 1, 2),
            vec![
                Some(1),
                None,
                Some(3),
                Some(4),
                Some(5),
                Some(6),
                Some(7),
                None,
                Some(10)
            ]
        );
        assert_eq!(page_links(3, 1, 1, 2), vec![Some(1), Some(2), Some(3)]);
        assert!(page_links(0, 1, 1, 2).is_empty());
    }
}
