use viaggi::pagination::{
    check_page, page_links, paginate, render_links, total_pages, PageLink, PAGE_SIZE,
};

use PageLink::{Ellipsis, Page};

#[test]
fn total_pages_never_below_one() {
    assert_eq!(total_pages(0, PAGE_SIZE), 1);
    assert_eq!(total_pages(1, PAGE_SIZE), 1);
    assert_eq!(total_pages(10, PAGE_SIZE), 1);
    assert_eq!(total_pages(11, PAGE_SIZE), 2);
    assert_eq!(total_pages(37, PAGE_SIZE), 4);
}

#[test]
fn paginate_slices_by_page() {
    let items: Vec<u32> = (1..=23).collect();
    assert_eq!(paginate(&items, 1, 10), &items[..10]);
    assert_eq!(paginate(&items, 3, 10), &[21, 22, 23]);
    assert!(paginate(&items, 4, 10).is_empty());
    assert!(paginate(&items, 0, 10).is_empty());
}

#[test]
fn short_pagers_list_every_page() {
    assert!(page_links(1, 0).is_empty());
    assert_eq!(page_links(1, 1), vec![Page(1)]);
    assert_eq!(page_links(2, 3), vec![Page(1), Page(2), Page(3)]);
}

#[test]
fn first_page_of_many() {
    assert_eq!(page_links(1, 10), vec![Page(1), Ellipsis, Page(10)]);
}

#[test]
fn second_page_has_no_leading_gap() {
    assert_eq!(page_links(2, 10), vec![Page(1), Page(2), Ellipsis, Page(10)]);
}

#[test]
fn middle_page_has_both_gaps() {
    assert_eq!(
        page_links(5, 10),
        vec![Page(1), Ellipsis, Page(5), Ellipsis, Page(10)]
    );
}

#[test]
fn near_the_end() {
    assert_eq!(page_links(9, 10), vec![Page(1), Ellipsis, Page(9), Page(10)]);
    assert_eq!(page_links(10, 10), vec![Page(1), Ellipsis, Page(10)]);
}

#[test]
fn page_zero_is_never_a_link() {
    assert_eq!(page_links(0, 5), vec![Page(1), Ellipsis, Page(5)]);
    assert_eq!(page_links(0, 2), vec![Page(1), Page(2)]);
}

#[test]
fn page_past_the_end_is_never_a_link() {
    assert_eq!(page_links(12, 10), vec![Page(1), Ellipsis, Page(10)]);
}

#[test]
fn check_page_rejects_zero() {
    assert_eq!(check_page(1).unwrap(), 1);
    assert_eq!(check_page(7).unwrap(), 7);
    let err = check_page(0).unwrap_err();
    assert_eq!(err.to_string(), "page must be 1 or greater");
}

#[test]
fn render_marks_current_page() {
    let links = page_links(5, 10);
    assert_eq!(render_links(&links, 5), "1 … [5] … 10");
    assert_eq!(render_links(&page_links(1, 2), 1), "[1] 2");
}

#[test]
fn links_serialize_with_kind_tag() {
    let json = serde_json::to_value(page_links(2, 10)).unwrap();
    assert_eq!(json[0], serde_json::json!({"kind": "page", "page": 1}));
    assert_eq!(json[2], serde_json::json!({"kind": "ellipsis"}));
}
