use super::*;

fn items(n: usize) -> Vec<usize> { (0..n).collect() }

fn labels(meta: &PageMeta) -> Vec<&str> { meta.links.iter().map(|l| l.label.as_str()).collect() }

#[test]
fn slice_bounds_hold_for_every_page_and_size() {
    for n in [0usize, 1, 9, 10, 11, 25, 100] {
        for per in 1..=12usize {
            for page in -1..=15i64 {
                let r = paginate(&items(n), page, per);
                assert!(r.meta.last_page >= 1);
                assert!(r.data.len() <= per);
                assert!(r.meta.current_page >= 1 && r.meta.current_page <= r.meta.last_page);
                assert!(r.meta.to <= n);
                assert_eq!(r.meta.total, n);
            }
        }
    }
}

#[test]
fn empty_collection_is_page_one_of_one() {
    let r = paginate::<usize>(&[], 5, 10);
    assert_eq!(r.meta.current_page, 1);
    assert_eq!(r.meta.last_page, 1);
    assert_eq!(r.meta.total, 0);
    assert_eq!(r.meta.from, 0);
    assert_eq!(r.meta.to, 0);
    assert!(r.data.is_empty());
    assert_eq!(r.links, PageLinks::default());
}

#[test]
fn twenty_five_items_ten_per_page() {
    let all = items(25);
    assert_eq!(paginate(&all, 1, 10).data, (0..10).collect::<Vec<_>>());
    let third = paginate(&all, 3, 10);
    assert_eq!(third.data, vec![20, 21, 22, 23, 24]);
    assert_eq!((third.meta.from, third.meta.to), (21, 25));
    assert_eq!(paginate(&all, 4, 10), third);
}

#[test]
fn zero_per_page_does_not_divide_by_zero() {
    let r = paginate(&items(3), 2, 0);
    assert_eq!(r.meta.per_page, 1);
    assert_eq!(r.data, vec![1]);
}

#[test]
fn navigation_links_carry_filters() {
    let q = PageQuery { path: "/menu-items".into(), search: Some("spicy tibs".into()), category_id: Some(3) };
    let r = paginate_with(&items(25), 2, 10, &q);
    assert_eq!(r.links.first.as_deref(), Some("/menu-items?page=1&search=spicy%20tibs&category_id=3"));
    assert_eq!(r.links.prev, r.links.first);
    assert_eq!(r.links.next.as_deref(), Some("/menu-items?page=3&search=spicy%20tibs&category_id=3"));
    assert_eq!(r.meta.path, "/menu-items");

    let last = paginate_with(&items(25), 3, 10, &PageQuery::new("/menu-items"));
    assert!(last.links.next.is_none() && last.links.last.is_none());
    assert_eq!(last.links.prev.as_deref(), Some("/menu-items?page=2"));
}

#[test]
fn link_strip_windows_and_ellipses() {
    let all = items(100);
    assert_eq!(labels(&paginate(&all, 1, 10).meta), vec!["1", "2", "3", "...", "10"]);
    assert_eq!(labels(&paginate(&all, 4, 10).meta), vec!["1", "2", "3", "4", "5", "6", "...", "10"]);
    assert_eq!(labels(&paginate(&all, 5, 10).meta), vec!["1", "...", "3", "4", "5", "6", "7", "...", "10"]);
    assert_eq!(labels(&paginate(&all, 8, 10).meta), vec!["1", "...", "6", "7", "8", "9", "10"]);
    assert_eq!(labels(&paginate(&all, 10, 10).meta), vec!["1", "...", "8", "9", "10"]);

    let m = paginate(&all, 5, 10).meta;
    let current: Vec<_> = m.links.iter().filter(|l| l.active).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].label, "5");
    assert!(current[0].url.is_none());
}

#[test]
fn summary_keeps_counts() {
    let meta = paginate(&items(42), 2, 5).meta;
    let s = PageSummary::from(&meta);
    assert_eq!(s, PageSummary { current_page: 2, last_page: 9, per_page: 5, total: 42 });
}
