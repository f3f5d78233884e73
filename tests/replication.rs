//! Dual-write replication between primary collections and per-user mirrors.

mod common;

use catalog_store::error::AppError;
use catalog_store::models::{Category, CategoryPatch, Entity, Product, ProductPatch, User};
use catalog_store::repositories::{
    CategoryRepository, ProductRepository, ReconcileOutcome, UserRepository,
};
use catalog_store::store::{CollectionPath, DocumentConverter, DocumentStore};

use common::harness;

fn product_mirror(user: &str, category: &str, id: &str) -> catalog_store::store::DocumentPath {
    CollectionPath::root("users")
        .doc(user)
        .child("categories")
        .doc(category)
        .child("products")
        .doc(id)
}

#[tokio::test]
async fn test_save_product_writes_both_copies() {
    let h = harness();
    let products: ProductRepository = h.ctx.resolve();

    let mut product = Product::new(products.new_id(), "  dark ROAST ", "U1", "C1");
    product.price = 9.5;
    products.save(&mut product).await.unwrap();

    let primary = h
        .store
        .get(&CollectionPath::root("products").doc(&product.id))
        .await
        .unwrap()
        .expect("primary copy");
    let mirror = h
        .store
        .get(&product_mirror("U1", "C1", &product.id))
        .await
        .unwrap()
        .expect("mirror copy");

    assert_eq!(primary.fields(), mirror.fields());
    assert_eq!(primary.get::<String>("name").unwrap(), "Dark roast");
    assert_eq!(primary.get::<String>("lower").unwrap(), "dark roast");
    assert_eq!(primary.fields(), &product.to_document().unwrap());
}

#[tokio::test]
async fn test_update_keeps_copies_in_agreement() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    let mut category = Category::new(categories.new_id(), "Tea", "U1");
    categories.save(&mut category).await.unwrap();

    let mut loaded = categories.find_by_id(&category.id).await.unwrap().unwrap();
    categories
        .update(
            &mut loaded,
            CategoryPatch {
                name: Some("  green   TEA".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mirror_path = loaded.mirror_path(&h.ctx.config.collections).unwrap();
    let mirror = h.store.get(&mirror_path).await.unwrap().unwrap();
    let mirrored = Category::from_document(mirror).unwrap();

    assert_eq!(mirrored, loaded);
    assert_eq!(mirrored.name, "Green tea");
    assert_eq!(mirrored.lower, "green tea");
}

#[tokio::test]
async fn test_mirror_failure_after_primary_is_reported_and_visible() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    let mut category = Category::new(categories.new_id(), "Tea", "U1");
    categories.save(&mut category).await.unwrap();

    h.store.fail_writes_under("users/");
    let err = categories
        .update(
            &mut category,
            CategoryPatch {
                name: Some("Herbal".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(err.is_mirror_divergence());
    match &err {
        AppError::MirrorDiverged { primary, mirror, .. } => {
            assert_eq!(primary, &format!("categories/{}", category.id));
            assert_eq!(mirror, &format!("users/U1/categories/{}", category.id));
        }
        other => panic!("unexpected error: {other}"),
    }

    // primary shows the new values, mirror still the old ones
    let primary = categories.find_by_id(&category.id).await.unwrap().unwrap();
    assert_eq!(primary.name, "Herbal");
    let mirror_path = category.mirror_path(&h.ctx.config.collections).unwrap();
    let mirror = h.store.get(&mirror_path).await.unwrap().unwrap();
    assert_eq!(mirror.get::<String>("name").unwrap(), "Tea");

    // reconciliation repairs the mirror once the store recovers
    h.store.heal();
    let outcome = categories.reconcile(&category.id).await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Repaired {
            mirror: mirror_path.to_string()
        }
    );
    let mirror = h.store.get(&mirror_path).await.unwrap().unwrap();
    assert_eq!(mirror.get::<String>("name").unwrap(), "Herbal");
    assert_eq!(
        categories.reconcile(&category.id).await.unwrap(),
        ReconcileOutcome::InSync
    );
}

#[tokio::test]
async fn test_failed_primary_write_leaves_mirror_untouched() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    let mut category = Category::new(categories.new_id(), "Tea", "U1");
    h.store.fail_writes_under("categories/");
    let err = categories.save(&mut category).await.unwrap_err();

    assert!(!err.is_mirror_divergence());
    let mirror_path = category.mirror_path(&h.ctx.config.collections).unwrap();
    assert!(h.store.get(&mirror_path).await.unwrap().is_none());
}

#[tokio::test]
async fn test_soft_delete_is_idempotent() {
    let h = harness();
    let products: ProductRepository = h.ctx.resolve();

    let mut product = Product::new(products.new_id(), "Beans", "U1", "C1");
    products.save(&mut product).await.unwrap();

    products.soft_delete(&mut product).await.unwrap();
    let once = h
        .store
        .get(&product_mirror("U1", "C1", &product.id))
        .await
        .unwrap()
        .unwrap();

    products.soft_delete(&mut product).await.unwrap();
    let twice = h
        .store
        .get(&product_mirror("U1", "C1", &product.id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(once, twice);
    assert!(!twice.get::<bool>("state").unwrap());
    let primary = products.find_by_id(&product.id).await.unwrap().unwrap();
    assert!(!primary.state);
}

#[tokio::test]
async fn test_category_change_moves_product_mirror() {
    let h = harness();
    let products: ProductRepository = h.ctx.resolve();

    let mut product = Product::new(products.new_id(), "Beans", "U1", "C1");
    products.save(&mut product).await.unwrap();

    products
        .update(
            &mut product,
            ProductPatch {
                category: Some("C2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(h
        .store
        .get(&product_mirror("U1", "C1", &product.id))
        .await
        .unwrap()
        .is_none());
    let moved = h
        .store
        .get(&product_mirror("U1", "C2", &product.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.get::<String>("category").unwrap(), "C2");

    assert!(products.products_of("U1", "C1").await.unwrap().is_empty());
    assert_eq!(products.products_of("U1", "C2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_by_id_and_update() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    let absent = categories
        .find_by_id_and_update("missing", CategoryPatch::default())
        .await
        .unwrap();
    assert!(absent.is_none());

    let mut category = Category::new(categories.new_id(), "Tea", "U1");
    categories.save(&mut category).await.unwrap();

    let updated = categories
        .find_by_id_and_update(
            &category.id,
            CategoryPatch {
                name: Some("mate".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Mate");

    let user = User::new("U1".into(), "Ana", "ana@example.com", "USER_ROLE");
    let mirrored = categories.categories_of(&user).await.unwrap();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].name, "Mate");
}

#[tokio::test]
async fn test_update_of_loaded_mirror_copy_targets_primary() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    let mut category = Category::new(categories.new_id(), "Tea", "U1");
    categories.save(&mut category).await.unwrap();

    let user = User::new("U1".into(), "Ana", "ana@example.com", "USER_ROLE");
    let mut from_mirror = categories.categories_of(&user).await.unwrap().remove(0);
    categories
        .update(
            &mut from_mirror,
            CategoryPatch {
                name: Some("Rooibos".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let primary = categories.find_by_id(&category.id).await.unwrap().unwrap();
    assert_eq!(primary.name, "Rooibos");
}

#[tokio::test]
async fn test_update_of_missing_document_fails() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    let mut never_saved = Category::new(categories.new_id(), "Tea", "U1");
    let err = categories
        .update(&mut never_saved, CategoryPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DocumentNotFound(_)));
}

#[tokio::test]
async fn test_reconcile_all_reports_repairs() {
    let h = harness();
    let products: ProductRepository = h.ctx.resolve();

    let mut kept = Product::new(products.new_id(), "Beans", "U1", "C1");
    products.save(&mut kept).await.unwrap();

    let mut lost = Product::new(products.new_id(), "Tea bags", "U1", "C1");
    h.store.fail_writes_under("users/");
    assert!(products.save(&mut lost).await.unwrap_err().is_mirror_divergence());
    h.store.heal();

    let report = products.reconcile_all().await.unwrap();
    assert_eq!(report.collection, "products");
    assert_eq!(report.scanned, 2);
    assert_eq!(report.in_sync, 1);
    assert_eq!(
        report.repaired,
        vec![product_mirror("U1", "C1", &lost.id).to_string()]
    );
    assert!(report.finished_at >= report.started_at);

    assert_eq!(
        products.reconcile("missing").await.unwrap(),
        ReconcileOutcome::MissingPrimary
    );
}

#[tokio::test]
async fn test_users_have_no_mirror() {
    let h = harness();
    let users: UserRepository = h.ctx.resolve();

    let mut user = User::new(users.new_id(), "ana", "ana@example.com", "USER_ROLE");
    users.save(&mut user).await.unwrap();

    assert_eq!(h.store.count(&CollectionPath::root("users")), 1);
    assert_eq!(
        users.reconcile(&user.id).await.unwrap(),
        ReconcileOutcome::InSync
    );
}

#[tokio::test]
async fn test_unserializable_product_writes_neither_copy() {
    let h = harness();
    let products: ProductRepository = h.ctx.resolve();

    let mut product = Product::new(products.new_id(), "Beans", "U1", "C1");
    product.price = f64::INFINITY;
    let err = products.save(&mut product).await.unwrap_err();

    assert!(matches!(err, AppError::Serialization(_)));
    assert!(!err.is_mirror_divergence());
    assert_eq!(h.store.count(&CollectionPath::root("products")), 0);
    assert!(h
        .store
        .get(&product_mirror("U1", "C1", &product.id))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_ambiguous_ids_are_rejected_at_the_repository() {
    let h = harness();
    let categories: CategoryRepository = h.ctx.resolve();

    for id in ["", "a/b"] {
        let err = categories.find_by_id(id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)), "id {:?}", id);

        let err = categories.reconcile(id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)), "id {:?}", id);

        let err = categories
            .find_by_id_and_update(id, CategoryPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)), "id {:?}", id);
    }
}
