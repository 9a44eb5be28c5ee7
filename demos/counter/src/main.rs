//! Counter example binary
//!
//! Demonstrates the Flux dispatcher with a counter and its history.

use counter::{CounterState, COUNTER, HISTORY, actions, register};
use flux_runtime::{DispatchError, Dispatcher};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DispatchError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,flux_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Example: Flux Dispatcher ===\n");

    let local = tokio::task::LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), DispatchError> {
    let dispatcher = Dispatcher::new();
    let (counter, history) = register(&dispatcher)?;

    // Called once now, then after every change to the counter
    let _counter_view = dispatcher.observe_stores(&[counter], |state| {
        let count = state.get::<CounterState>(COUNTER).map_or(0, |state| state.count);
        println!("  [counter view] count = {count}");
    })?;
    let history_view = dispatcher.observe_stores(&[history], |state| {
        let entries = state.get::<Vec<String>>(HISTORY).map_or(0, |history| history.len());
        println!("  [history view] {entries} entries");
    })?;

    let increment = dispatcher.wrap_action_creator(actions::increment);
    let decrement = dispatcher.wrap_action_creator(actions::decrement);
    let add = dispatcher.wrap_action_creator(actions::add);
    let reset = dispatcher.wrap_action_creator(actions::reset);
    let increment_if_odd = dispatcher.wrap_action_creator(actions::increment_if_odd);
    let increment_later = dispatcher.wrap_action_creator(actions::increment_later);

    println!("\n>>> increment");
    increment(())?;

    println!("\n>>> increment_if_odd (count is odd)");
    increment_if_odd(())?;

    println!("\n>>> increment_if_odd (count is even, nothing happens)");
    increment_if_odd(())?;

    println!("\n>>> add(10)");
    add(10)?;

    println!("\n>>> decrement");
    decrement(())?;

    println!("\n>>> unsubscribe history view, then reset");
    history_view.unsubscribe();
    reset(())?;

    println!("\n>>> increment_later(50ms)");
    increment_later(Duration::from_millis(50))?;
    println!("  (dispatched nothing yet)");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let count = dispatcher.state().get::<CounterState>(COUNTER).map_or(0, |state| state.count);
    let history = dispatcher.state().get::<Vec<String>>(HISTORY).unwrap_or_default();
    println!("\nFinal count: {count}");
    println!("History: {}", history.join(", "));

    println!("\n=== Demonstration Complete ===");
    Ok(())
}
