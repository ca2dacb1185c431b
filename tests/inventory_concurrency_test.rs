//! Oversell protection under concurrent checkouts. Stock is consumed only
//! through the conditioned decrement, so no interleaving of attempts can
//! commit more units than existed.

mod common;

use common::{checkout_input, cod_payment, snapshot_line, TestContext};
use salonmart_api::entities::{Order, OrderItem};
use sea_orm::EntityTrait;
use uuid::Uuid;

#[tokio::test]
async fn concurrent_checkouts_never_oversell() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Limited Edition Palette", 3_000, 0, 10).await;

    // 20 customers race for 10 units, one unit each
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let checkout = ctx.services.checkout.clone();
        let line = snapshot_line(&product, 1);
        tasks.push(tokio::spawn(async move {
            let input = checkout_input(Uuid::new_v4(), vec![line], cod_payment());
            checkout.process_checkout(input).await.is_ok()
        }));
    }

    let mut committed = 0;
    for task in tasks {
        if task.await.expect("task completes") {
            committed += 1;
        }
    }

    assert_eq!(
        committed, 10,
        "exactly 10 checkouts should commit; got {}",
        committed
    );
    assert_eq!(
        ctx.services
            .inventory
            .available_quantity(product.id)
            .await
            .unwrap(),
        0
    );
    assert_eq!(Order::find().all(ctx.db.as_ref()).await.unwrap().len(), 10);
    assert_eq!(
        OrderItem::find().all(ctx.db.as_ref()).await.unwrap().len(),
        10
    );
}

#[tokio::test]
async fn two_buyers_race_for_the_last_unit() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Final Sample Jar", 5_000, 0, 1).await;

    let first = {
        let checkout = ctx.services.checkout.clone();
        let line = snapshot_line(&product, 1);
        tokio::spawn(async move {
            checkout
                .process_checkout(checkout_input(Uuid::new_v4(), vec![line], cod_payment()))
                .await
        })
    };
    let second = {
        let checkout = ctx.services.checkout.clone();
        let line = snapshot_line(&product, 1);
        tokio::spawn(async move {
            checkout
                .process_checkout(checkout_input(Uuid::new_v4(), vec![line], cod_payment()))
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();

    assert_eq!(wins, 1, "exactly one buyer gets the last unit");
    assert_eq!(
        ctx.services
            .inventory
            .available_quantity(product.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn failed_attempts_leave_stock_untouched() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Bamboo Brush Set", 1_800, 0, 3).await;

    // Burn through the stock with oversized requests that must all fail
    for _ in 0..5 {
        let input = checkout_input(
            Uuid::new_v4(),
            vec![snapshot_line(&product, 4)],
            cod_payment(),
        );
        ctx.services
            .checkout
            .process_checkout(input)
            .await
            .expect_err("requesting 4 of 3 must fail");
    }

    assert_eq!(
        ctx.services
            .inventory
            .available_quantity(product.id)
            .await
            .unwrap(),
        3
    );
    assert!(Order::find().all(ctx.db.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn restock_is_the_only_way_up() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Lavender Bath Salts", 900, 0, 2).await;

    // Sell out
    let input = checkout_input(
        Uuid::new_v4(),
        vec![snapshot_line(&product, 2)],
        cod_payment(),
    );
    ctx.services
        .checkout
        .process_checkout(input)
        .await
        .expect("sell out");
    assert_eq!(
        ctx.services
            .inventory
            .available_quantity(product.id)
            .await
            .unwrap(),
        0
    );

    // Sold out means no further sales
    let input = checkout_input(
        Uuid::new_v4(),
        vec![snapshot_line(&product, 1)],
        cod_payment(),
    );
    ctx.services
        .checkout
        .process_checkout(input)
        .await
        .expect_err("sold out");

    // Explicit restock reopens sales
    let restocked = ctx
        .services
        .inventory
        .restock(product.id, 5)
        .await
        .expect("restock");
    assert_eq!(restocked.available_quantity, 5);

    let input = checkout_input(
        Uuid::new_v4(),
        vec![snapshot_line(&product, 1)],
        cod_payment(),
    );
    ctx.services
        .checkout
        .process_checkout(input)
        .await
        .expect("back in stock");
}
