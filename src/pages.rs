use std::collections::BTreeSet;
use tracing::warn;

/// Parses a page selection like `"all"`, `"5"`, `"1-10"` or `"1-3,7,10-12"`
/// into sorted 0-based page indices. Page numbers are 1-based on the way in,
/// ranges are clamped to the document and invalid parts are skipped.
pub fn parse_page_range(spec: &str, total_pages: usize) -> Vec<usize> {
    let trimmed = spec.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return (0..total_pages).collect();
    }

    let mut selected = BTreeSet::new();
    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start_str, end_str)) = part.split_once('-') {
            let bounds = (
                start_str.trim().parse::<usize>(),
                end_str.trim().parse::<usize>(),
            );
            let (Ok(start), Ok(end)) = bounds else {
                warn!("invalid page range '{}', skipping", part);
                continue;
            };
            for page in start.max(1)..=end.min(total_pages) {
                selected.insert(page - 1);
            }
        } else {
            let Ok(page) = part.parse::<usize>() else {
                warn!("invalid page number '{}', skipping", part);
                continue;
            };
            if (1..=total_pages).contains(&page) {
                selected.insert(page - 1);
            } else {
                warn!("page {} out of range (1-{}), skipping", page, total_pages);
            }
        }
    }

    selected.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selects_every_page() {
        assert_eq!(parse_page_range("all", 3), vec![0, 1, 2]);
        assert_eq!(parse_page_range("", 3), vec![0, 1, 2]);
        assert_eq!(parse_page_range("ALL", 2), vec![0, 1]);
    }

    #[test]
    fn single_pages_and_ranges() {
        assert_eq!(parse_page_range("5", 10), vec![4]);
        assert_eq!(parse_page_range("1-3", 10), vec![0, 1, 2]);
        assert_eq!(parse_page_range("1,5,9", 10), vec![0, 4, 8]);
    }

    #[test]
    fn mixed_spec_is_sorted_and_deduplicated() {
        let indices = parse_page_range("10-12, 7, 1-3, 2", 20);
        insta::assert_snapshot!(format!("{:?}", indices), @"[0, 1, 2, 6, 9, 10, 11]");
    }

    #[test]
    fn ranges_clamp_to_document() {
        assert_eq!(parse_page_range("1-10", 3), vec![0, 1, 2]);
        assert_eq!(parse_page_range("0-2", 3), vec![0, 1]);
    }

    #[test]
    fn invalid_parts_are_skipped() {
        assert_eq!(parse_page_range("x,2,9-", 5), vec![1]);
        assert_eq!(parse_page_range("abc", 5), Vec::<usize>::new());
        assert_eq!(parse_page_range("7", 5), Vec::<usize>::new());
    }
}
