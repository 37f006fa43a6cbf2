//! Engine Integration Tests
//!
//! Drives the full tick cycle over synthetic markets:
//! - Position limits hold after full fills on every tick
//! - Same input and state give the same candidates
//! - A crossed book only costs its own product
//! - State survives the string round trip
//! - Mirror positions unwind without confirmation
//! - A fresh session starts without strategy memory
//! - The mirror leaves basket hedges in a shared product alone
//! - Basket legs trade together or not at all
//! - Rolling windows stay bounded

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tidewater_core::{MarketTrade, Observation, OrderBookSnapshot, ProductId, Quantity};
use tidewater_runner::{EngineState, TickInput, TickOutput, TradingEngine, load_config_from_str};
use tidewater_strategy::{BasketState, MirrorState, StrategyState};

const STRIKES: [i64; 5] = [9500, 9750, 10000, 10250, 10500];

/// Two levels a side around `mid`, one tick wide
fn book(product: &str, mid: f64, qty: Quantity) -> OrderBookSnapshot {
    let m = mid.round() as i64;
    OrderBookSnapshot::from_levels(
        product,
        [(Decimal::from(m - 1), qty), (Decimal::from(m - 3), qty * 2)],
        [(Decimal::from(m + 1), qty), (Decimal::from(m + 3), qty * 2)],
    )
}

fn wave(t: i64, period: f64, amplitude: f64) -> f64 {
    amplitude * (t as f64 / period).sin()
}

/// Every product of the default config, moving deterministically
fn market(t: i64, positions: &BTreeMap<ProductId, Quantity>) -> TickInput {
    let mut books = BTreeMap::new();
    let mut put = |product: &str, book: OrderBookSnapshot| {
        books.insert(product.to_string(), book);
    };

    let mut resin = OrderBookSnapshot::from_levels(
        "RAINFOREST_RESIN",
        [(dec!(9998), 2), (dec!(9995), 25)],
        [(dec!(10002), 2), (dec!(10005), 25)],
    );
    if t % 5 == 0 {
        resin.set_ask(dec!(9999), 5);
    } else if t % 7 == 0 {
        resin.set_bid(dec!(10001), 4);
    }
    put("RAINFOREST_RESIN", resin);

    let spike = if t % 40 == 39 { 20.0 } else { 0.0 };
    put("KELP", book("KELP", 2030.0 + wave(t, 5.0, 6.0), 20));
    put("SQUID_INK", book("SQUID_INK", 2000.0 + wave(t, 3.0, 3.0) + spike, 20));

    let rock = 10000.0 + wave(t, 20.0, 80.0);
    put("VOLCANIC_ROCK", book("VOLCANIC_ROCK", rock, 40));
    for strike in STRIKES {
        let product = format!("VOLCANIC_ROCK_VOUCHER_{}", strike);
        let mid = (rock - strike as f64).max(0.0) + 40.0 + wave(t, 7.0, 10.0);
        put(&product, book(&product, mid, 20));
    }

    let croissants = 4300.0 + wave(t, 9.0, 5.0);
    let jams = 6550.0 + wave(t, 11.0, 15.0);
    let djembes = 13400.0 + wave(t, 6.0, 10.0);
    put("CROISSANTS", book("CROISSANTS", croissants, 60));
    put("JAMS", book("JAMS", jams, 60));
    put("DJEMBES", book("DJEMBES", djembes, 30));
    put(
        "PICNIC_BASKET1",
        book(
            "PICNIC_BASKET1",
            6.0 * croissants + 3.0 * jams + djembes + wave(t, 10.0, 120.0),
            10,
        ),
    );
    put(
        "PICNIC_BASKET2",
        book("PICNIC_BASKET2", 4.0 * croissants + 2.0 * jams + wave(t, 8.0, 80.0), 10),
    );
    put("MAGNIFICENT_MACARONS", book("MAGNIFICENT_MACARONS", 600.0 + wave(t, 15.0, 30.0), 30));

    let mut market_trades = Vec::new();
    if t % 30 == 3 {
        market_trades.push(MarketTrade::new("CROISSANTS", dec!(4301), 5).with_buyer("Olivia"));
    } else if t % 30 == 18 {
        market_trades.push(MarketTrade::new("CROISSANTS", dec!(4299), 5).with_seller("Olivia"));
    }

    TickInput {
        timestamp: t * 100,
        books,
        market_trades,
        observations: BTreeMap::from([(
            "MAGNIFICENT_MACARONS".to_string(),
            Observation::sunlight(50.0 + wave(t, 25.0, 10.0)),
        )]),
        positions: positions.clone(),
    }
}

/// Assume every order fills in full
fn fill(positions: &mut BTreeMap<ProductId, Quantity>, output: &TickOutput) {
    for (product, orders) in &output.orders {
        for order in orders {
            *positions.entry(product.clone()).or_default() += order.quantity;
        }
    }
}

#[test]
fn test_limits_hold_under_full_fills() {
    let _ = env_logger::try_init();
    let mut engine = TradingEngine::with_default_config().unwrap();
    let limits = engine.config().limits();
    let mut state = engine.initial_state();
    let mut positions = BTreeMap::new();
    let mut traded = 0;

    for t in 0..300 {
        let output = engine.run_tick(&market(t, &positions), state);
        traded += output.order_count();
        fill(&mut positions, &output);

        for (product, position) in &positions {
            let limit = limits[product];
            assert!(
                position.abs() <= limit,
                "tick {}: {} at {} breaches limit {}",
                t,
                product,
                position,
                limit
            );
        }
        state = output.state;
    }

    assert!(traded > 0, "the engine never traded");
    assert_eq!(state.ticks, 300);
}

#[test]
fn test_same_input_same_candidates() {
    let mut engine = TradingEngine::with_default_config().unwrap();
    let mut state = engine.initial_state();
    let mut positions = BTreeMap::new();
    for t in 0..60 {
        let output = engine.run_tick(&market(t, &positions), state);
        fill(&mut positions, &output);
        state = output.state;
    }

    let input = market(60, &positions);
    let first = engine.run_tick(&input, state.clone());
    let second = engine.run_tick(&input, state);

    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.orders, second.orders);
    assert_eq!(first.state, second.state);
}

#[test]
fn test_state_string_round_trip_preserves_decisions() {
    let mut direct = TradingEngine::with_default_config().unwrap();
    let mut encoded = TradingEngine::with_default_config().unwrap();
    let mut direct_state = direct.initial_state();
    let mut trader_data = String::new();
    let mut positions = BTreeMap::new();

    for t in 0..80 {
        let input = market(t, &positions);
        let a = direct.run_tick(&input, direct_state);
        let b = encoded.run_tick(&input, EngineState::decode_or_fresh(&trader_data));

        assert_eq!(a.orders, b.orders, "tick {} diverged", t);
        fill(&mut positions, &a);
        direct_state = a.state;
        trader_data = b.state.encode().unwrap();
    }
}

fn small_engine() -> TradingEngine {
    let config = load_config_from_str(
        r#"{
            "products": {
                "RAINFOREST_RESIN": {
                    "limit": 50,
                    "fair_value": {"policy": "wall_anchored", "wall_multiplier": "2"},
                    "strategy": {"kind": "market_making"}
                },
                "KELP": {
                    "limit": 50,
                    "window": 20,
                    "strategy": {"kind": "bollinger_reversion"}
                }
            }
        }"#,
    )
    .unwrap();
    TradingEngine::new(config).unwrap()
}

#[test]
fn test_crossed_book_skips_only_its_product() {
    let mut engine = small_engine();
    let mut input = market(1, &BTreeMap::new());
    input.books.insert(
        "KELP".to_string(),
        OrderBookSnapshot::from_levels("KELP", [(dec!(2035), 5)], [(dec!(2030), 5)]),
    );

    let state = engine.initial_state();
    let output = engine.run_tick(&input, state);

    assert!(output.orders_for("KELP").is_empty());
    assert!(!output.orders_for("RAINFOREST_RESIN").is_empty());
    assert!(output.state.stats.history("KELP").is_none());
    assert!(output.state.stats.history("RAINFOREST_RESIN").is_some());
}

#[test]
fn test_rolling_window_bound() {
    let mut engine = small_engine();
    let mut state = engine.initial_state();

    for t in 0..5 {
        state = engine.run_tick(&market(t, &BTreeMap::new()), state).state;
    }
    assert_eq!(state.stats.history("KELP").map(|h| h.len()), Some(5));

    for t in 5..45 {
        state = engine.run_tick(&market(t, &BTreeMap::new()), state).state;
    }
    assert_eq!(state.stats.history("KELP").map(|h| h.len()), Some(20));
    assert_eq!(state.stats.history("RAINFOREST_RESIN").map(|h| h.len()), Some(20));
}

#[test]
fn test_mirror_unwinds_without_confirmation() {
    let config = load_config_from_str(
        r#"{
            "products": {
                "CROISSANTS": {
                    "limit": 250,
                    "strategy": {"kind": "informed_mirror", "mirror_size": 10, "decay_ticks": 20}
                }
            }
        }"#,
    )
    .unwrap();
    let mut engine = TradingEngine::new(config).unwrap();
    let mut state = engine.initial_state();
    let mut positions = BTreeMap::new();

    let tick = |t: i64, positions: &BTreeMap<ProductId, Quantity>, olivia: bool| TickInput {
        timestamp: t * 100,
        books: BTreeMap::from([("CROISSANTS".to_string(), book("CROISSANTS", 4300.0, 50))]),
        market_trades: if olivia {
            vec![MarketTrade::new("CROISSANTS", dec!(4301), 5).with_buyer("Olivia")]
        } else {
            Vec::new()
        },
        positions: positions.clone(),
        ..Default::default()
    };

    let output = engine.run_tick(&tick(0, &positions, true), state);
    fill(&mut positions, &output);
    state = output.state;
    assert_eq!(positions["CROISSANTS"], 10);

    for t in 1..=20 {
        let output = engine.run_tick(&tick(t, &positions, false), state);
        fill(&mut positions, &output);
        state = output.state;
        if t == 10 {
            assert_eq!(positions["CROISSANTS"], 5);
        }
    }

    assert_eq!(positions["CROISSANTS"], 0);
}

fn basket_engine() -> TradingEngine {
    let config = load_config_from_str(
        r#"{
            "products": {
                "PICNIC_BASKET2": {
                    "limit": 100,
                    "strategy": {
                        "kind": "basket_arbitrage",
                        "components": [
                            {"product": "CROISSANTS", "weight": 4},
                            {"product": "JAMS", "weight": 2}
                        ],
                        "threshold": 30.0,
                        "max_units": 2
                    }
                },
                "CROISSANTS": { "limit": 250 },
                "JAMS": { "limit": 350 }
            }
        }"#,
    )
    .unwrap();
    TradingEngine::new(config).unwrap()
}

fn rich_basket(positions: BTreeMap<ProductId, Quantity>) -> TickInput {
    TickInput {
        timestamp: 0,
        books: BTreeMap::from([
            ("PICNIC_BASKET2".to_string(), book("PICNIC_BASKET2", 30401.0, 10)),
            ("CROISSANTS".to_string(), book("CROISSANTS", 4300.0, 100)),
            ("JAMS".to_string(), book("JAMS", 6550.0, 100)),
        ]),
        positions,
        ..Default::default()
    }
}

#[test]
fn test_basket_trades_every_leg() {
    let mut engine = basket_engine();
    let state = engine.initial_state();

    let output = engine.run_tick(&rich_basket(BTreeMap::new()), state);

    assert_eq!(output.orders_for("PICNIC_BASKET2")[0].quantity, -2);
    assert_eq!(output.orders_for("CROISSANTS")[0].quantity, 8);
    assert_eq!(output.orders_for("JAMS")[0].quantity, 4);
}

#[test]
fn test_basket_zero_capacity_leg_zeroes_all() {
    let mut engine = basket_engine();
    let state = engine.initial_state();
    let full = BTreeMap::from([("CROISSANTS".to_string(), 250)]);

    let output = engine.run_tick(&rich_basket(full), state);

    assert_eq!(output.order_count(), 0);
}

fn croissants_tick(t: i64, positions: &BTreeMap<ProductId, Quantity>, olivia: bool) -> TickInput {
    TickInput {
        timestamp: t * 100,
        books: BTreeMap::from([("CROISSANTS".to_string(), book("CROISSANTS", 4300.0, 50))]),
        market_trades: if olivia {
            vec![MarketTrade::new("CROISSANTS", dec!(4301), 5).with_buyer("Olivia")]
        } else {
            Vec::new()
        },
        positions: positions.clone(),
        ..Default::default()
    }
}

#[test]
fn test_fresh_session_forgets_previous_ticks() {
    let mut reused = TradingEngine::with_default_config().unwrap();
    let state = reused.initial_state();
    let first = reused.run_tick(&croissants_tick(0, &BTreeMap::new(), true), state);
    assert_eq!(first.orders_for("CROISSANTS").len(), 1);

    let quiet = croissants_tick(1, &BTreeMap::new(), false);
    let state = reused.initial_state();
    let again = reused.run_tick(&quiet, state);
    let mut fresh = TradingEngine::with_default_config().unwrap();
    let state = fresh.initial_state();
    let expected = fresh.run_tick(&quiet, state);

    assert!(again.orders_for("CROISSANTS").is_empty());
    assert_eq!(again.orders, expected.orders);
    assert_eq!(again.state.strategies, expected.state.strategies);
    assert_eq!(
        again.state.strategies.get("CROISSANTS"),
        Some(&StrategyState::Mirror(MirrorState::default()))
    );
}

#[test]
fn test_mirror_ignores_position_it_did_not_build() {
    let mut engine = TradingEngine::with_default_config().unwrap();
    let positions = BTreeMap::from([("CROISSANTS".to_string(), 24)]);

    let state = engine.initial_state();
    let output = engine.run_tick(&croissants_tick(0, &positions, false), state);

    assert!(output.orders_for("CROISSANTS").is_empty());
}

#[test]
fn test_mirror_keeps_clock_while_book_crossed() {
    let mut engine = TradingEngine::with_default_config().unwrap();
    let state = engine.initial_state();
    let mut positions = BTreeMap::new();
    let first = engine.run_tick(&croissants_tick(0, &positions, true), state);
    fill(&mut positions, &first);

    let mut crossed = croissants_tick(1, &positions, false);
    crossed.books.insert(
        "CROISSANTS".to_string(),
        OrderBookSnapshot::from_levels("CROISSANTS", [(dec!(4303), 5)], [(dec!(4301), 5)]),
    );
    let second = engine.run_tick(&crossed, first.state);

    assert_eq!(second.order_count(), 0);
    assert_eq!(
        second.state.strategies.get("CROISSANTS"),
        Some(&StrategyState::Mirror(MirrorState {
            direction: 1,
            ticks_since: 1,
            held: 10
        }))
    );
}

#[test]
fn test_basket_hedge_survives_mirror() {
    let config = load_config_from_str(
        r#"{
            "products": {
                "PICNIC_BASKET2": {
                    "limit": 100,
                    "strategy": {
                        "kind": "basket_arbitrage",
                        "components": [
                            {"product": "CROISSANTS", "weight": 4},
                            {"product": "JAMS", "weight": 2}
                        ],
                        "threshold": 30.0,
                        "max_units": 2
                    }
                },
                "CROISSANTS": {
                    "limit": 250,
                    "strategy": {"kind": "informed_mirror", "mirror_size": 10, "decay_ticks": 20}
                },
                "JAMS": { "limit": 350 }
            }
        }"#,
    )
    .unwrap();
    let mut engine = TradingEngine::new(config).unwrap();
    let mut positions = BTreeMap::new();

    let state = engine.initial_state();
    let first = engine.run_tick(&rich_basket(positions.clone()), state);
    assert_eq!(first.orders_for("CROISSANTS")[0].quantity, 8);
    fill(&mut positions, &first);

    // Spread back inside costs, no Olivia trades
    let mut calm = rich_basket(positions.clone());
    calm.books.insert(
        "PICNIC_BASKET2".to_string(),
        book("PICNIC_BASKET2", 30330.0, 10),
    );
    let second = engine.run_tick(&calm, first.state);

    assert_eq!(second.order_count(), 0);
    assert_eq!(positions["CROISSANTS"], 8);
    match second.state.strategies.get("PICNIC_BASKET2") {
        Some(StrategyState::Basket(BasketState { hedge, pending, .. })) => {
            assert_eq!(hedge.get("CROISSANTS"), Some(&8));
            assert_eq!(hedge.get("JAMS"), Some(&4));
            assert!(pending.is_none());
        }
        other => panic!("unexpected basket state {:?}", other),
    }
}
