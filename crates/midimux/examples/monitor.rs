//! Opens every input and prints decoded events until interrupted.
//!
//! ```sh
//! cargo run --example monitor [name-pattern]
//! ```

use std::time::Duration;

use midimux::{MidiEngine, PortFilter, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let pattern = std::env::args().nth(1).unwrap_or_default();
    let engine = MidiEngine::builder().client_name("midimux-monitor").build()?;

    let inputs = engine.open_inputs_matching(&pattern)?;
    if inputs.is_empty() {
        println!("no inputs matching '{pattern}'");
        return Ok(());
    }
    for input in &inputs {
        println!("monitoring {} ({})", input.name(), input.id());
    }

    engine.subscribe(PortFilter::All, |event| {
        println!("{} @{:>12}us  {:?}", event.port, event.timestamp_us, event.message);
    });

    loop {
        std::thread::sleep(Duration::from_secs(60));
        for input in &inputs {
            let stats = input.stats();
            if stats.malformed > 0 {
                eprintln!(
                    "{}: {} malformed sequences discarded",
                    input.name(),
                    stats.malformed
                );
            }
        }
    }
}
