// tests/catalog_tests.rs
mod common;

use common::*;
use storefront_core::catalog::{
  create_category, create_product, create_review, delete_product, delete_review, get_category, get_review,
  list_categories, list_products, list_reviews, owned_product, update_product, update_review,
};
use storefront_core::models::{NewCategory, NewProduct, NewReview, ProductPatch, ReviewPatch};
use storefront_core::workflow::{get_order, save_order};
use storefront_core::ShopError;

fn new_product(name: &str, price: &str, categories: Vec<i64>) -> NewProduct {
  NewProduct {
    name: name.to_string(),
    description: format!("{} description", name),
    price: dec(price),
    stock_quantity: 10,
    categories,
  }
}

fn category(name: &str, parent_id: Option<i64>) -> NewCategory {
  NewCategory {
    parent_id,
    name: name.to_string(),
    description: String::new(),
  }
}

#[tokio::test]
async fn products_are_scoped_to_their_creator() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let bob = shop.user("bob").await;

  let lamp = create_product(shop.store.as_ref(), alice.id, new_product("Lamp", "19.9", vec![]))
    .await
    .unwrap();
  assert_eq!(lamp.price.to_string(), "19.90");
  assert_eq!(lamp.owner(), Some(alice.id));

  assert_eq!(list_products(shop.store.as_ref(), alice.id).await.unwrap().len(), 1);
  assert!(list_products(shop.store.as_ref(), bob.id).await.unwrap().is_empty());

  assert!(matches!(
    owned_product(shop.store.as_ref(), bob.id, lamp.id).await,
    Err(ShopError::PermissionDenied(_))
  ));
  assert!(matches!(
    owned_product(shop.store.as_ref(), alice.id, lamp.id + 100).await,
    Err(ShopError::NotFound(_))
  ));
  assert!(matches!(
    delete_product(shop.store.as_ref(), bob.id, lamp.id).await,
    Err(ShopError::PermissionDenied(_))
  ));
}

#[tokio::test]
async fn product_patch_changes_only_given_fields() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let lamp = create_product(shop.store.as_ref(), alice.id, new_product("Lamp", "10.00", vec![]))
    .await
    .unwrap();

  let patched = update_product(
    shop.store.as_ref(),
    alice.id,
    lamp.id,
    ProductPatch {
      price: Some(dec("12.5")),
      ..Default::default()
    },
  )
  .await
  .unwrap();

  assert_eq!(patched.price, dec("12.50"));
  assert_eq!(patched.name, "Lamp");
  assert_eq!(patched.description, lamp.description);
  assert_eq!(patched.stock_quantity, 10);
  assert_eq!(patched.audit.created_at, lamp.audit.created_at);

  let err = update_product(
    shop.store.as_ref(),
    alice.id,
    lamp.id,
    ProductPatch {
      stock_quantity: Some(-1),
      ..Default::default()
    },
  )
  .await
  .unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));
}

#[tokio::test]
async fn rename_after_an_order_keeps_the_drawn_stock() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let lamp = shop.product(&alice, "Lamp", "10.00", 10).await;

  // Read before the order commits, renamed after.
  let before = owned_product(shop.store.as_ref(), alice.id, lamp.id).await.unwrap();
  assert_eq!(before.stock_quantity, 10);
  save_order(&shop.workflows, shop.store.clone(), alice.id, None, items(&[(lamp.id, 4)]))
    .await
    .unwrap();

  let renamed = update_product(
    shop.store.as_ref(),
    alice.id,
    lamp.id,
    ProductPatch {
      name: Some("Desk Lamp".to_string()),
      ..Default::default()
    },
  )
  .await
  .unwrap();

  assert_eq!(renamed.name, "Desk Lamp");
  assert_eq!(renamed.stock_quantity, 6);
  assert_eq!(shop.stock_of(&lamp).await, 6);
}

#[tokio::test]
async fn invalid_products_are_rejected() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;

  for bad in [
    new_product("", "1.00", vec![]),
    new_product("Lamp", "-1.00", vec![]),
    new_product("Lamp", "1.001", vec![]),
    new_product("Lamp", "1.00", vec![42]),
  ] {
    let err = create_product(shop.store.as_ref(), alice.id, bad).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation(_)), "got {:?}", err);
  }
  assert!(list_products(shop.store.as_ref(), alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn categories_nest_and_link_products() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;

  let home = create_category(shop.store.as_ref(), alice.id, category("Home", None)).await.unwrap();
  let lighting = create_category(shop.store.as_ref(), alice.id, category("Lighting", Some(home.id)))
    .await
    .unwrap();
  assert_eq!(lighting.parent_id, Some(home.id));

  let err = create_category(shop.store.as_ref(), alice.id, category("Orphan", Some(999)))
    .await
    .unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));
  let err = create_category(shop.store.as_ref(), alice.id, category("  ", None)).await.unwrap_err();
  assert!(matches!(err, ShopError::Validation(_)));

  assert_eq!(list_categories(shop.store.as_ref()).await.unwrap().len(), 2);
  assert_eq!(get_category(shop.store.as_ref(), home.id).await.unwrap().name, "Home");
  assert!(matches!(
    get_category(shop.store.as_ref(), 999).await,
    Err(ShopError::NotFound(_))
  ));

  let lamp = create_product(
    shop.store.as_ref(),
    alice.id,
    new_product("Lamp", "10.00", vec![lighting.id, home.id, lighting.id]),
  )
  .await
  .unwrap();
  assert_eq!(lamp.categories, vec![home.id, lighting.id]);
}

#[tokio::test]
async fn reviews_are_public_but_author_owned() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let bob = shop.user("bob").await;
  let lamp = shop.product(&alice, "Lamp", "10.00", 3).await;

  let review = create_review(
    shop.store.as_ref(),
    bob.id,
    lamp.id,
    NewReview {
      text: "Bright enough.".to_string(),
      rating: 4,
    },
  )
  .await
  .unwrap();
  assert_eq!(review.user_id, bob.id);
  assert_eq!(review.product_id, lamp.id);

  // Anyone can read.
  assert_eq!(list_reviews(shop.store.as_ref(), lamp.id).await.unwrap(), vec![review.clone()]);
  assert_eq!(get_review(shop.store.as_ref(), lamp.id, review.id).await.unwrap(), review);

  // Only the author writes.
  let err = update_review(
    shop.store.as_ref(),
    alice.id,
    lamp.id,
    review.id,
    ReviewPatch {
      rating: Some(1),
      ..Default::default()
    },
  )
  .await
  .unwrap_err();
  assert!(matches!(err, ShopError::PermissionDenied(_)));
  assert!(matches!(
    delete_review(shop.store.as_ref(), alice.id, lamp.id, review.id).await,
    Err(ShopError::PermissionDenied(_))
  ));

  let updated = update_review(
    shop.store.as_ref(),
    bob.id,
    lamp.id,
    review.id,
    ReviewPatch {
      rating: Some(5),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(updated.rating, 5);
  assert_eq!(updated.text, "Bright enough.");

  delete_review(shop.store.as_ref(), bob.id, lamp.id, review.id).await.unwrap();
  assert!(matches!(
    get_review(shop.store.as_ref(), lamp.id, review.id).await,
    Err(ShopError::NotFound(_))
  ));
}

#[tokio::test]
async fn review_rating_must_be_one_to_five() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let lamp = shop.product(&alice, "Lamp", "10.00", 3).await;

  for rating in [0, 6] {
    let err = create_review(
      shop.store.as_ref(),
      alice.id,
      lamp.id,
      NewReview {
        text: "Meh".to_string(),
        rating,
      },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ShopError::Validation(_)));
  }
  assert!(list_reviews(shop.store.as_ref(), lamp.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reviews_of_a_missing_product_are_not_found() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;

  assert!(matches!(list_reviews(shop.store.as_ref(), 77).await, Err(ShopError::NotFound(_))));
  let err = create_review(
    shop.store.as_ref(),
    alice.id,
    77,
    NewReview {
      text: "Where is it?".to_string(),
      rating: 3,
    },
  )
  .await
  .unwrap_err();
  assert!(matches!(err, ShopError::NotFound(_)));
}

#[tokio::test]
async fn review_is_addressed_through_its_product() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let lamp = shop.product(&alice, "Lamp", "10.00", 3).await;
  let desk = shop.product(&alice, "Desk", "90.00", 1).await;

  let review = create_review(
    shop.store.as_ref(),
    alice.id,
    lamp.id,
    NewReview {
      text: "Nice".to_string(),
      rating: 5,
    },
  )
  .await
  .unwrap();

  assert!(matches!(
    get_review(shop.store.as_ref(), desk.id, review.id).await,
    Err(ShopError::NotFound(_))
  ));
}

#[tokio::test]
async fn deleting_a_product_cascades_to_reviews_and_order_lines() {
  let shop = Shop::new();
  let alice = shop.user("alice").await;
  let lamp = shop.product(&alice, "Lamp", "10.00", 3).await;
  let desk = shop.product(&alice, "Desk", "90.00", 2).await;

  create_review(
    shop.store.as_ref(),
    alice.id,
    lamp.id,
    NewReview {
      text: "Nice".to_string(),
      rating: 5,
    },
  )
  .await
  .unwrap();
  let order = save_order(
    &shop.workflows,
    shop.store.clone(),
    alice.id,
    None,
    items(&[(lamp.id, 1), (desk.id, 1)]),
  )
  .await
  .unwrap();

  delete_product(shop.store.as_ref(), alice.id, lamp.id).await.unwrap();

  assert!(matches!(list_reviews(shop.store.as_ref(), lamp.id).await, Err(ShopError::NotFound(_))));
  let reloaded = get_order(shop.store.as_ref(), alice.id, order.order.id).await.unwrap();
  assert_eq!(reloaded.order_items.len(), 1);
  assert_eq!(reloaded.order_items[0].product.id, desk.id);
}
