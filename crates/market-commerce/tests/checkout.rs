//! End-to-end checkout through the `Marketplace` API.

use market_commerce::prelude::*;

fn seeded(stock_7: i64, stock_9: i64) -> (Marketplace, UserId) {
    let market = Marketplace::default();
    let seller = UserId::new("seller");
    let notebook = Product::with_id(
        ProductId::new("7"),
        seller.clone(),
        "Notebook",
        Money::from_decimal(10.00, Currency::USD),
        stock_7,
    )
    .unwrap();
    let lamp = Product::with_id(
        ProductId::new("9"),
        seller,
        "Desk Lamp",
        Money::from_decimal(25.00, Currency::USD),
        stock_9,
    )
    .unwrap()
    .with_description("Adjustable LED lamp");
    market.list_product(notebook).unwrap();
    market.list_product(lamp).unwrap();

    let buyer = UserId::new("alice");
    market.add_to_cart(&buyer, &ProductId::new("7"), 3).unwrap();
    market.add_to_cart(&buyer, &ProductId::new("9"), 1).unwrap();
    (market, buyer)
}

#[test]
fn checkout_decrements_stock_and_clears_cart() {
    let (market, buyer) = seeded(5, 1);

    let order = market.checkout(&buyer).unwrap();

    assert_eq!(order.total.display(), "$55.00");
    assert_eq!(order.item_count, 4);
    assert_eq!(order.user_id, buyer);
    assert_eq!(order.lines[0].product_name, "Notebook");
    assert_eq!(order.lines[0].subtotal.display(), "$30.00");
    assert_eq!(market.stock(&ProductId::new("7")).unwrap(), 2);
    assert_eq!(market.stock(&ProductId::new("9")).unwrap(), 0);
    assert!(market.view_cart(&buyer).unwrap().is_empty());
}

#[test]
fn short_stock_aborts_without_touching_anything() {
    let (market, buyer) = seeded(5, 0);
    let before = market.view_cart(&buyer).unwrap();

    let err = market.checkout(&buyer).unwrap_err();

    match err {
        CommerceError::InsufficientStock {
            product_id,
            requested,
            available,
            ..
        } => {
            assert_eq!(product_id, ProductId::new("9"));
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(market.stock(&ProductId::new("7")).unwrap(), 5);
    assert_eq!(market.view_cart(&buyer).unwrap(), before);
}

#[test]
fn restock_lets_a_failed_checkout_be_retried() {
    let (market, buyer) = seeded(5, 0);
    assert!(market.checkout(&buyer).is_err());

    market.restock(&ProductId::new("9"), 2).unwrap();
    let order = market.checkout(&buyer).unwrap();

    assert_eq!(order.item_count, 4);
    assert_eq!(market.stock(&ProductId::new("9")).unwrap(), 1);
}

#[test]
fn empty_cart_checkout_mutates_nothing() {
    let (market, _) = seeded(5, 1);
    let bob = UserId::new("bob");

    assert_eq!(market.checkout(&bob).unwrap_err(), CommerceError::EmptyCart(bob));
    assert_eq!(market.stock(&ProductId::new("7")).unwrap(), 5);
    assert_eq!(market.stock(&ProductId::new("9")).unwrap(), 1);
}

#[test]
fn clear_cart_twice_equals_once() {
    let (market, buyer) = seeded(5, 1);

    assert_eq!(market.clear_cart(&buyer), 2);
    assert_eq!(market.clear_cart(&buyer), 0);
    assert_eq!(market.item_count(&buyer).unwrap(), 0);
    assert!(market.cart_total(&buyer).unwrap().is_zero());
}

#[test]
fn search_finds_listed_products() {
    let (market, _) = seeded(5, 0);

    assert_eq!(market.search("led", false).len(), 1);
    assert!(market.search("led", true).is_empty());
    assert_eq!(market.products_by_seller(&UserId::new("seller")).len(), 2);
}
