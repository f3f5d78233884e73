//! Query semantics against the in-memory backend.

mod common;

use catalog_store::criteria;
use catalog_store::error::AppError;
use catalog_store::models::{Category, CategoryPatch, Product, User};
use catalog_store::repositories::{CategoryRepository, ProductRepository, UserRepository};
use catalog_store::store::{DocumentStore, QueryOptions};
use serde_json::json;

use common::{fields, harness};

async fn seed_categories(repo: &CategoryRepository, names: &[&str]) -> Vec<Category> {
    let mut saved = Vec::new();
    for name in names {
        let mut category = Category::new(repo.new_id(), name, "U1");
        repo.save(&mut category).await.unwrap();
        saved.push(category);
    }
    saved
}

fn names(categories: &[Category]) -> Vec<String> {
    let mut names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_where_equal_never_returns_soft_deleted() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    let mut seeded = seed_categories(&repo, &["Tea", "Coffee", "Cocoa"]).await;
    repo.soft_delete(&mut seeded[1]).await.unwrap();

    let active = repo
        .where_equal(criteria!(state = true), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap();

    assert_eq!(names(&active), vec!["Cocoa", "Tea"]);
    assert!(active.iter().all(|c| c.state));
}

#[tokio::test]
async fn test_where_equal_conjunction_and_none_skipped() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    seed_categories(&repo, &["Tea", "Coffee"]).await;

    let missing: Option<&str> = None;
    let found = repo
        .where_equal(criteria!(lower = "tea", user = missing), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["Tea"]);

    let none = repo
        .where_equal(criteria!(lower = "tea", user = "U2"), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_where_equal_one() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    seed_categories(&repo, &["Tea"]).await;

    let tea = repo.where_equal_one(criteria!(lower = "tea")).await.unwrap();
    assert_eq!(tea.map(|c| c.name).as_deref(), Some("Tea"));
    assert!(repo
        .where_equal_one(criteria!(lower = "juice"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_prefix_search_matches_exactly_the_prefixed_subset() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    let all = [
        "Cof", "Coffee", "Coffee beans", "Cog", "Cocoa", "Co", "Tea", "Café", "Cafe",
    ];
    let seeded = seed_categories(&repo, &all).await;

    for prefix in ["co", "cof", "coffee ", "caf", "café", "t", "z"] {
        let found = repo
            .where_starts_with(criteria!(lower = prefix), QueryOptions::default())
            .fetch_all()
            .await
            .unwrap();

        let expected: Vec<Category> = seeded
            .iter()
            .filter(|c| c.lower.starts_with(prefix))
            .cloned()
            .collect();
        assert_eq!(names(&found), names(&expected), "prefix {:?}", prefix);
    }
}

#[tokio::test]
async fn test_prefix_search_edges() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    seed_categories(&repo, &["Tea", "Coffee"]).await;

    // empty prefix adds no constraint
    let everything = repo
        .where_starts_with(criteria!(lower = ""), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(everything.len(), 2);

    let err = repo
        .where_starts_with(criteria!(lower = "a\u{10FFFF}"), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPrefix { .. }));

    let err = repo
        .where_starts_with(criteria!(lower = 42), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPrefix { .. }));
}

#[tokio::test]
async fn test_chained_builder_with_pagination() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    seed_categories(&repo, &["Coffee", "Cocoa", "Cola", "Tea"]).await;

    let all = repo
        .query()
        .where_equal(criteria!(state = true))
        .where_starts_with(criteria!(lower = "co"))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let page = repo
        .query()
        .where_equal(criteria!(state = true))
        .where_starts_with(criteria!(lower = "co"))
        .with_options(QueryOptions::new(2, 1))
        .get_results()
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    // zero limit is unset
    let unlimited = repo
        .find_all(QueryOptions::new(0, 0))
        .await
        .unwrap();
    assert_eq!(unlimited.len(), 4);
}

async fn seed_users(repo: &UserRepository) {
    for (name, email) in [
        ("Ana Gomez", "ana@example.com"),
        ("Bob Stone", "bob@ana.dev"),
        ("Carla Diaz", "carla@example.com"),
    ] {
        let mut user = User::new(repo.new_id(), name, email, "USER_ROLE");
        repo.save(&mut user).await.unwrap();
    }
}

#[tokio::test]
async fn test_either_contains_is_a_union_without_duplicates() {
    let h = harness();
    let repo: UserRepository = h.ctx.resolve();
    seed_users(&repo).await;

    // "ana" hits Ana by name and by email, Bob only by email
    let found = repo
        .where_either_contains(
            criteria!(lower = "ana", email = "ana"),
            QueryOptions::default(),
        )
        .await
        .unwrap();

    let mut emails: Vec<&str> = found.iter().map(|u| u.email.as_str()).collect();
    emails.sort();
    assert_eq!(emails, vec!["ana@example.com", "bob@ana.dev"]);
}

#[tokio::test]
async fn test_either_contains_paginates_the_final_list() {
    let h = harness();
    let repo: UserRepository = h.ctx.resolve();
    seed_users(&repo).await;

    let all = repo
        .where_either_contains(criteria!(email = "@"), QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let page = repo
        .where_either_contains(criteria!(email = "@"), QueryOptions::new(1, 1))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, all[1].id);
}

#[tokio::test]
async fn test_either_contains_respects_prior_constraints() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    let mut seeded = seed_categories(&repo, &["Coffee", "Decaf coffee"]).await;
    repo.update(
        &mut seeded[1],
        CategoryPatch {
            state: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let found = repo
        .query()
        .where_equal(criteria!(state = true))
        .either_contains(criteria!(lower = "coffee"), QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["Coffee"]);
}

#[tokio::test]
async fn test_find_by_id_absent_is_none() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    assert!(repo.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_document_surfaces_as_error() {
    let h = harness();
    let repo: CategoryRepository = h.ctx.resolve();
    h.store
        .set(&repo.collection().doc("bad"), fields(json!({"name": 7})))
        .await
        .unwrap();

    let err = repo.find_by_id("bad").await.unwrap_err();
    assert!(matches!(err, AppError::MalformedDocument { .. }));
}

#[tokio::test]
async fn test_non_finite_criteria_fail_instead_of_widening() {
    let h = harness();
    let repo: ProductRepository = h.ctx.resolve();
    let mut product = Product::new(repo.new_id(), "Beans", "U1", "C1");
    product.price = 3.0;
    repo.save(&mut product).await.unwrap();

    let err = repo
        .where_equal(criteria!(price = f64::NAN), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCriteria { ref field, .. } if field == "price"));

    let err = repo
        .where_equal_one(criteria!(state = true, price = f64::INFINITY))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCriteria { .. }));

    let err = repo
        .where_either_contains(criteria!(price = f64::NAN), QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCriteria { .. }));

    let exact = repo
        .where_equal(criteria!(price = 3.0), QueryOptions::default())
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(exact, vec![product]);
}
