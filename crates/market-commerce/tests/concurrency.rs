//! Checkout behaviour under concurrent workers.

use std::sync::{Arc, Barrier};
use std::thread;

use market_commerce::prelude::*;

fn market_with(products: &[(&str, i64, i64)]) -> Arc<Marketplace> {
    let market = Marketplace::default();
    for (id, cents, stock) in products {
        let product = Product::with_id(
            ProductId::new(*id),
            UserId::new("seller"),
            format!("Product {id}"),
            Money::new(*cents, Currency::USD),
            *stock,
        )
        .unwrap();
        market.list_product(product).unwrap();
    }
    Arc::new(market)
}

/// Run `f(i)` on `n` threads released together.
fn race<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(n));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..n)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn last_unit_is_sold_exactly_once() {
    let market = market_with(&[("9", 2500, 1)]);
    let a = UserId::new("a");
    let b = UserId::new("b");
    market.add_to_cart(&a, &ProductId::new("9"), 1).unwrap();
    market.add_to_cart(&b, &ProductId::new("9"), 1).unwrap();

    let users = [a, b];
    let results = {
        let market = Arc::clone(&market);
        race(2, move |i| market.checkout(&users[i]))
    };

    let committed = results.iter().filter(|r| r.is_ok()).count();
    let rejected: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(committed, 1);
    assert_eq!(rejected.len(), 1);
    assert!(matches!(
        rejected[0],
        CommerceError::InsufficientStock { requested: 1, available: 0, .. }
    ));
    assert_eq!(market.stock(&ProductId::new("9")).unwrap(), 0);

    let metrics = market.metrics().snapshot();
    assert_eq!(metrics.committed, 1);
    assert_eq!(metrics.aborted.insufficient_stock, 1);
}

#[test]
fn many_buyers_never_oversell() {
    const STOCK: i64 = 25;
    const BUYERS: usize = 64;

    let market = market_with(&[("hot", 500, STOCK)]);
    for i in 0..BUYERS {
        market
            .add_to_cart(&UserId::new(format!("buyer-{i}")), &ProductId::new("hot"), 1)
            .unwrap();
    }

    let results = {
        let market = Arc::clone(&market);
        race(BUYERS, move |i| market.checkout(&UserId::new(format!("buyer-{i}"))))
    };

    let committed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed as i64, STOCK);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, CommerceError::InsufficientStock { .. })));
    assert_eq!(market.stock(&ProductId::new("hot")).unwrap(), 0);

    // Winners have empty carts, losers keep theirs.
    for (i, result) in results.iter().enumerate() {
        let cart_empty = market.carts().is_empty(&UserId::new(format!("buyer-{i}")));
        assert_eq!(cart_empty, result.is_ok());
    }
}

#[test]
fn overlapping_multi_product_carts_do_not_deadlock() {
    let market = market_with(&[("a", 100, 1000), ("b", 100, 1000), ("c", 100, 1000)]);
    let orders = [["a", "b", "c"], ["c", "b", "a"], ["b", "c", "a"], ["a", "c", "b"]];
    const ROUNDS: usize = 50;

    let results = {
        let market = Arc::clone(&market);
        race(orders.len(), move |i| {
            let user = UserId::new(format!("user-{i}"));
            let mut sold = 0;
            for _ in 0..ROUNDS {
                for product in orders[i] {
                    market.add_to_cart(&user, &ProductId::new(product), 1).unwrap();
                }
                sold += market.checkout(&user).unwrap().item_count;
            }
            sold
        })
    };

    let sold: i64 = results.iter().sum();
    assert_eq!(sold, (orders.len() * ROUNDS * 3) as i64);
    for id in ["a", "b", "c"] {
        assert_eq!(
            market.stock(&ProductId::new(id)).unwrap(),
            1000 - (orders.len() * ROUNDS) as i64
        );
    }
}

#[test]
fn stock_stays_non_negative_with_restocks_and_checkouts() {
    let market = market_with(&[("p", 100, 3)]);
    const WORKERS: usize = 8;

    let results = {
        let market = Arc::clone(&market);
        race(WORKERS, move |i| {
            let id = ProductId::new("p");
            let user = UserId::new(format!("user-{i}"));
            let mut committed = 0_i64;
            for round in 0..40 {
                if i % 4 == 0 && round % 5 == 0 {
                    market.restock(&id, 1).unwrap();
                }
                market.add_to_cart(&user, &id, 2).unwrap();
                match market.checkout(&user) {
                    Ok(order) => committed += order.item_count,
                    Err(CommerceError::InsufficientStock { .. }) => {
                        market.clear_cart(&user);
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
                assert!(market.stock(&id).unwrap() >= 0);
            }
            committed
        })
    };

    let sold: i64 = results.iter().sum();
    let restocked = (WORKERS / 4) as i64 * 8;
    assert_eq!(market.stock(&ProductId::new("p")).unwrap(), 3 + restocked - sold);
}

#[test]
fn add_to_cart_racing_checkout_is_either_bought_or_kept() {
    let market = market_with(&[("x", 100, 1000), ("y", 100, 1000)]);
    let user = UserId::new("alice");
    market.add_to_cart(&user, &ProductId::new("x"), 1).unwrap();

    let results = {
        let market = Arc::clone(&market);
        let user = user.clone();
        race(2, move |i| {
            if i == 0 {
                market.checkout(&user).map(|o| o.item_count).unwrap_or(0)
            } else {
                market.add_to_cart(&user, &ProductId::new("y"), 1).unwrap();
                0
            }
        })
    };

    // The added line either made it into the order or is still in the cart.
    let bought = results[0];
    let y_stock = market.stock(&ProductId::new("y")).unwrap();
    let y_in_cart = market
        .carts()
        .lines(&user)
        .iter()
        .any(|l| l.product_id == ProductId::new("y"));
    assert_eq!(market.stock(&ProductId::new("x")).unwrap(), 999);
    if bought == 2 {
        assert_eq!(y_stock, 999);
        assert!(!y_in_cart);
    } else {
        assert_eq!(bought, 1);
        assert_eq!(y_stock, 1000);
        assert!(y_in_cart);
    }
}
