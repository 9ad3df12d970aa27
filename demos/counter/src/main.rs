//! Counter demo binary
//!
//! Without arguments, walks through the reference scenarios: initial state,
//! adding twice, subtracting, and resetting. With arguments, parses each one
//! as a JSON action (`'{"type":"ADD"}'`) and dispatches them in order.

use anyhow::{Context, bail};
use counter::{CounterAction, CounterReducer, CounterState, parse_action};
use tally_runtime::{Store, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One scripted scenario: actions to dispatch and the count expected afterwards.
struct Scenario {
    title: &'static str,
    actions: &'static [CounterAction],
    expected: i64,
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        title: "Initial state",
        actions: &[],
        expected: 0,
    },
    Scenario {
        title: "Incrementing the counter",
        actions: &[CounterAction::Add, CounterAction::Add],
        expected: 2,
    },
    Scenario {
        title: "Decrementing the counter",
        actions: &[CounterAction::Subtract],
        expected: 1,
    },
    Scenario {
        title: "Resetting the counter",
        actions: &[CounterAction::Reset],
        expected: 0,
    },
];

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=info,tally_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Store::with_config(CounterReducer, None, StoreConfig::new("counter"))?;
    store.subscribe(|state: &CounterState| {
        tracing::info!(count = state.count, "State updated");
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        run_scenarios(&store)
    } else {
        run_actions(&store, &args)
    }
}

fn run_scenarios(store: &Store<CounterReducer>) -> anyhow::Result<()> {
    let mut failed = 0usize;

    for (number, scenario) in SCENARIOS.iter().enumerate() {
        tracing::info!(scenario = number + 1, "{}", scenario.title);

        for action in scenario.actions {
            store.dispatch(*action)?;
        }

        let count = store.get_state().count;
        if count == scenario.expected {
            tracing::info!(count, "Scenario passed");
        } else {
            failed += 1;
            tracing::error!(count, expected = scenario.expected, "Scenario failed");
        }
    }

    if failed > 0 {
        bail!("{failed} of {} scenarios failed", SCENARIOS.len());
    }
    tracing::info!(scenarios = SCENARIOS.len(), "All scenarios passed");
    Ok(())
}

fn run_actions(store: &Store<CounterReducer>, args: &[String]) -> anyhow::Result<()> {
    for arg in args {
        let action = parse_action(arg).with_context(|| format!("Invalid action: {arg}"))?;
        store.dispatch(action)?;
    }

    println!("{}", serde_json::to_string(&*store.get_state())?);
    Ok(())
}
