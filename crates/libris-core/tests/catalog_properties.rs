use std::fs;

use libris_core::{Book, BookDraft, Catalog, Category, JsonStore, LibrisError};
use tempfile::TempDir;

fn draft(title: &str, category: Category) -> BookDraft {
    BookDraft::new(title, "Someone", "https://example.org/book", category, 1995)
}

fn store_in(dir: &TempDir) -> JsonStore {
    JsonStore::new(dir.path().join("library.json"))
}

#[test]
fn load_after_save_returns_same_collection() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut stray = Book::new(draft("Off the map", Category::Coding));
    stray.category = "Astronomy".into();
    let books = vec![
        Book::new(draft("Poetry Basics", Category::Poetry)),
        Book::new(draft("Poetry Basics", Category::Poetry)),
        stray,
    ];

    store.save(&books).unwrap();
    assert_eq!(store.load().unwrap(), books);
}

#[test]
fn legacy_backfill_is_stable_across_saves() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"[
    {"title": "Old Book", "author": "X", "link": "http://x", "category": "Grammar"}
]"#,
    )
    .unwrap();

    let first = store.load().unwrap();
    assert_eq!(first[0].publish_year, 2000);

    store.save(&first).unwrap();
    let second = store.load().unwrap();
    assert_eq!(second, first);
    assert_eq!(second[0].publish_year, 2000);
    assert_eq!(second[0].id, first[0].id);
}

#[test]
fn legacy_file_is_rewritten_on_next_mutation() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"[{"title": "Old", "author": "X", "link": "l", "category": "Poetry",
              "publish_year": 1900}]"#,
    )
    .unwrap();

    let mut catalog = Catalog::open(store.clone()).unwrap();
    catalog.add(draft("New", Category::Coding)).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["version"], libris_core::CURRENT_VERSION);
    assert_eq!(value["books"][0]["publish_year"], 1900);
    assert_eq!(value["books"].as_array().unwrap().len(), 2);
}

#[test]
fn add_grows_by_one_and_is_retrievable() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open(store_in(&dir)).unwrap();
    catalog.add(draft("First", Category::Islamiat)).unwrap();

    let before = catalog.len();
    let id = catalog.add(draft("First", Category::Islamiat)).unwrap().id;
    assert_eq!(catalog.len(), before + 1);
    assert_eq!(catalog.books().last().unwrap().id, id);
    assert!(catalog.find_by_title("First", Category::Islamiat).is_some());
}

#[test]
fn delete_single_pair_removes_one() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open(store_in(&dir)).unwrap();
    catalog.add(draft("Keep", Category::Poetry)).unwrap();
    catalog.add(draft("Drop", Category::Poetry)).unwrap();
    catalog.add(draft("Drop", Category::Grammar)).unwrap();

    assert_eq!(catalog.remove_by_title("Drop", Category::Poetry).unwrap(), 1);
    assert_eq!(catalog.len(), 2);
    assert!(catalog.find_by_title("Drop", Category::Poetry).is_none());
    assert!(catalog.find_by_title("Drop", Category::Grammar).is_some());

    let reopened = Catalog::open(store_in(&dir)).unwrap();
    assert_eq!(reopened.len(), 2);
}

#[test]
fn delete_duplicated_pair_removes_all() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open(store_in(&dir)).unwrap();
    for _ in 0..3 {
        catalog.add(draft("Twin", Category::Coding)).unwrap();
    }
    catalog.add(draft("Other", Category::Coding)).unwrap();

    assert_eq!(catalog.remove_by_title("Twin", Category::Coding).unwrap(), 3);
    assert_eq!(catalog.len(), 1);
}

#[test]
fn delete_by_id_leaves_duplicates_alone() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open(store_in(&dir)).unwrap();
    let first = catalog.add(draft("Twin", Category::Coding)).unwrap().id;
    let second = catalog.add(draft("Twin", Category::Coding)).unwrap().id;

    catalog.remove(&first).unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get(&second).is_some());
}

#[test]
fn edit_touches_only_target() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open(store_in(&dir)).unwrap();
    catalog.add(draft("A", Category::Poetry)).unwrap();
    let target = catalog.add(draft("B", Category::Poetry)).unwrap().id;
    catalog.add(draft("C", Category::Coding)).unwrap();
    let before: Vec<Book> = catalog.books().to_vec();

    let mut edit = BookDraft::from_book(catalog.get(&target).unwrap());
    edit.title = "B, revised".into();
    edit.category = Category::Grammar;
    edit.publish_year = 2024;
    catalog.update(&target, edit).unwrap();

    let reopened = Catalog::open(store_in(&dir)).unwrap();
    let after = reopened.books();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1].id, target);
    assert_eq!(after[1].title, "B, revised");
    assert_eq!(after[1].category, "Grammar");
    assert_eq!(after[1].publish_year, 2024);
}

#[test]
fn search_matches_title_or_category() {
    let dir = TempDir::new().unwrap();
    let mut catalog = Catalog::open(store_in(&dir)).unwrap();
    catalog.add(draft("Poetry Basics", Category::Poetry)).unwrap();
    catalog.add(draft("Clean Code", Category::SoftwareEngineering)).unwrap();

    let hits = catalog.search("poe");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Poetry Basics");

    assert_eq!(catalog.search("engineering").len(), 1);
    assert!(catalog.search("quantum").is_empty());
}

#[test]
fn grouping_empty_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::open(store_in(&dir)).unwrap();
    let groups = catalog.group_by_category();
    for category in Category::ALL {
        assert!(groups.get(category).is_empty());
    }
    assert_eq!(groups.iter().count(), Category::ALL.len());
}

#[test]
fn corrupt_file_fails_fast() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(store.path(), "[{\"title\": ").unwrap();

    let err = Catalog::open(store).unwrap_err();
    assert!(matches!(err, LibrisError::StorageCorrupt { .. }));
}

#[test]
fn case_variant_category_is_addressed_where_it_is_shown() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"[{"title": "Odes", "author": "K", "link": "l", "category": "poetry"}]"#,
    )
    .unwrap();

    let mut catalog = Catalog::open(store).unwrap();
    let groups = catalog.group_by_category();
    assert!(groups.get(Category::Poetry).is_empty());
    assert_eq!(groups.get(Category::SoftwareEngineering).len(), 1);
    assert_eq!(catalog.stats().uncategorized, 1);

    assert_eq!(catalog.remove_by_title("Odes", Category::Poetry).unwrap(), 0);
    assert_eq!(catalog.len(), 1);
}

#[test]
fn legacy_record_without_category_loads_under_fallback() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        store.path(),
        r#"[{"title": "Untagged", "author": "X", "link": "l", "publish_year": 1950}]"#,
    )
    .unwrap();

    let mut catalog = Catalog::open(store).unwrap();
    let groups = catalog.group_by_category();
    assert_eq!(groups.get(Category::FALLBACK)[0].title, "Untagged");
    assert_eq!(catalog.stats().uncategorized, 0);

    let removed = catalog
        .remove_by_title("Untagged", Category::SoftwareEngineering)
        .unwrap();
    assert_eq!(removed, 1);
}
