use uuid::Uuid;

use vitrin_store::domain::types::CartItem;
use vitrin_store::error::StoreServiceError;
use vitrin_store::usecase::cart::{
    AddItemInput, AddItemUseCase, ClearCartUseCase, ListCartUseCase, RemoveItemUseCase,
    UpdateItemUseCase, repair_cart,
};

use crate::helpers::{MockCartRepo, make_item};

fn add_input(product_id: Uuid, variant: &str, quantity: i32) -> AddItemInput {
    AddItemInput {
        product_id,
        variant: variant.to_owned(),
        quantity,
        product_name: "Linen Shirt".to_owned(),
        product_price_cents: 5200,
        product_image: Some("https://cdn.shop.test/linen-shirt-v2.webp".to_owned()),
    }
}

// ── ListCart / merge-on-read ─────────────────────────────────────────────────

#[tokio::test]
async fn should_conserve_quantity_across_duplicate_rows() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![
        make_item(user_id, Some(product), "M", 2, 0),
        make_item(user_id, Some(product), "M", 3, 60),
        make_item(user_id, Some(product), "M", 5, 120),
    ]);

    let uc = ListCartUseCase { repo: repo.clone() };
    let out = uc.execute(user_id).await.unwrap();

    assert_eq!(out.items.len(), 1);
    assert_eq!(out.items[0].quantity, 10);
    assert_eq!(out.repairs.len(), 1);
}

#[tokio::test]
async fn should_repair_idempotently() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![
        make_item(user_id, Some(product), "M", 2, 0),
        make_item(user_id, Some(product), "M", 3, 60),
    ]);

    let uc = ListCartUseCase { repo: repo.clone() };
    let first = uc.execute(user_id).await.unwrap();
    assert_eq!(first.items[0].quantity, 5);

    repair_cart(&repo, user_id, first.repairs).await;

    // Duplicates are physically gone and the survivor carries the sum.
    {
        let rows = repo.rows_handle();
        let rows = rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 5);
    }

    // A second read sees the same logical view and nothing left to repair.
    let second = uc.execute(user_id).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].quantity, 5);
    assert!(second.repairs.is_empty());
}

#[tokio::test]
async fn should_return_merged_view_even_when_repair_write_fails() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![
        make_item(user_id, Some(product), "M", 2, 0),
        make_item(user_id, Some(product), "M", 3, 60),
    ])
    .with_failing_repairs();

    let uc = ListCartUseCase { repo: repo.clone() };
    let out = uc.execute(user_id).await.unwrap();
    assert_eq!(out.items[0].quantity, 5);

    // Best-effort: the failure is swallowed, the store keeps its duplicates.
    repair_cart(&repo, user_id, out.repairs).await;
    assert_eq!(repo.rows_handle().lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_not_see_other_users_items() {
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![
        make_item(user_a, Some(Uuid::new_v4()), "M", 1, 0),
        make_item(user_b, Some(Uuid::new_v4()), "L", 2, 0),
    ]);

    let uc = ListCartUseCase { repo: repo.clone() };
    let out = uc.execute(user_a).await.unwrap();
    assert_eq!(out.items.len(), 1);
    assert_eq!(out.items[0].user_id, user_a);
}

// ── AddItem ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_insert_new_row_on_first_add() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    let repo = MockCartRepo::new();

    let uc = AddItemUseCase { repo: repo.clone() };
    let item = uc.execute(user_id, add_input(product, "M", 2)).await.unwrap();

    assert_eq!(item.quantity, 2);
    assert_eq!(item.product_id, Some(product));
    assert_eq!(repo.rows_handle().lock().unwrap().len(), 1);
    assert_eq!(repo.insert_calls(), 1);
}

#[tokio::test]
async fn should_add_quantities_when_row_already_exists() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![make_item(user_id, Some(product), "M", 2, 60)]);

    let uc = AddItemUseCase { repo: repo.clone() };
    let item = uc.execute(user_id, add_input(product, "M", 3)).await.unwrap();

    // One row, additive quantity — not two rows, not quantity 3.
    assert_eq!(item.quantity, 5);
    let rows = repo.rows_handle();
    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 5);
    // The conflict path refreshes the denormalized snapshot.
    assert_eq!(rows[0].product_price_cents, 5200);
    assert_eq!(
        rows[0].product_image.as_deref(),
        Some("https://cdn.shop.test/linen-shirt-v2.webp")
    );
}

#[tokio::test]
async fn should_keep_separate_rows_per_variant() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![make_item(user_id, Some(product), "M", 1, 60)]);

    let uc = AddItemUseCase { repo: repo.clone() };
    uc.execute(user_id, add_input(product, "L", 1)).await.unwrap();

    assert_eq!(repo.rows_handle().lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_retry_insert_when_conflicting_row_vanished() {
    let user_id = Uuid::new_v4();
    let product = Uuid::new_v4();
    // First insert conflicts although no row is visible — the racing row was
    // deleted in between. The retry insert must succeed.
    let repo = MockCartRepo::new().with_conflict_once();

    let uc = AddItemUseCase { repo: repo.clone() };
    let item = uc.execute(user_id, add_input(product, "M", 2)).await.unwrap();

    assert_eq!(item.quantity, 2);
    assert_eq!(repo.insert_calls(), 2);
    assert_eq!(repo.rows_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_fail_cleanly_after_retry_bound() {
    let user_id = Uuid::new_v4();
    let repo = MockCartRepo::new().with_always_conflict();

    let uc = AddItemUseCase { repo: repo.clone() };
    let result = uc.execute(user_id, add_input(Uuid::new_v4(), "M", 1)).await;

    assert!(matches!(result, Err(StoreServiceError::Conflict)));
    // Bounded: exactly one retry round, not an unbounded loop.
    assert_eq!(repo.insert_calls(), 2);
}

#[tokio::test]
async fn should_reject_non_positive_quantity_before_any_store_call() {
    let user_id = Uuid::new_v4();
    let repo = MockCartRepo::new();

    let uc = AddItemUseCase { repo: repo.clone() };
    let result = uc.execute(user_id, add_input(Uuid::new_v4(), "M", 0)).await;

    assert!(matches!(result, Err(StoreServiceError::InvalidQuantity)));
    assert_eq!(repo.insert_calls(), 0);
    assert!(repo.rows_handle().lock().unwrap().is_empty());
}

// ── UpdateItem ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_set_quantity_on_owned_item() {
    let user_id = Uuid::new_v4();
    let row = make_item(user_id, Some(Uuid::new_v4()), "M", 1, 0);
    let row_id = row.id;
    let repo = MockCartRepo::seeded(vec![row]);

    let uc = UpdateItemUseCase { repo: repo.clone() };
    uc.execute(user_id, row_id, 4).await.unwrap();

    let rows = repo.rows_handle();
    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].quantity, 4);
}

#[tokio::test]
async fn should_not_touch_or_reveal_items_of_other_users() {
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let row = make_item(owner, Some(Uuid::new_v4()), "M", 2, 0);
    let row_id = row.id;
    let repo = MockCartRepo::seeded(vec![row]);

    let uc = UpdateItemUseCase { repo: repo.clone() };
    // Zero rows affected, and no error that would leak existence.
    uc.execute(intruder, row_id, 5).await.unwrap();

    let rows = repo.rows_handle();
    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].quantity, 2);
}

#[tokio::test]
async fn should_reject_update_to_quantity_below_one() {
    let user_id = Uuid::new_v4();
    let row = make_item(user_id, Some(Uuid::new_v4()), "M", 2, 0);
    let row_id = row.id;
    let repo = MockCartRepo::seeded(vec![row]);

    let uc = UpdateItemUseCase { repo: repo.clone() };
    let result = uc.execute(user_id, row_id, 0).await;

    assert!(matches!(result, Err(StoreServiceError::InvalidQuantity)));
    let rows = repo.rows_handle();
    let rows = rows.lock().unwrap();
    assert_eq!(rows[0].quantity, 2);
}

// ── RemoveItem / ClearCart ───────────────────────────────────────────────────

#[tokio::test]
async fn should_remove_owned_item() {
    let user_id = Uuid::new_v4();
    let row = make_item(user_id, Some(Uuid::new_v4()), "M", 1, 0);
    let row_id = row.id;
    let repo = MockCartRepo::seeded(vec![row]);

    let uc = RemoveItemUseCase { repo: repo.clone() };
    uc.execute(user_id, row_id).await.unwrap();

    assert!(repo.rows_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_remove_absent_item_silently() {
    let user_id = Uuid::new_v4();
    let repo = MockCartRepo::new();

    let uc = RemoveItemUseCase { repo: repo.clone() };
    uc.execute(user_id, Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn should_clear_only_the_callers_cart() {
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let repo = MockCartRepo::seeded(vec![
        make_item(user_a, Some(Uuid::new_v4()), "M", 1, 0),
        make_item(user_a, Some(Uuid::new_v4()), "L", 2, 0),
        make_item(user_b, Some(Uuid::new_v4()), "S", 3, 0),
    ]);

    let uc = ClearCartUseCase { repo: repo.clone() };
    uc.execute(user_a).await.unwrap();

    let rows: Vec<CartItem> = repo.rows_handle().lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, user_b);
}
