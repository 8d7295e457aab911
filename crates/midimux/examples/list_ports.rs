//! Prints every MIDI port the platform backend can see.
//!
//! ```sh
//! cargo run --example list_ports
//! ```

use midimux::{MidiEngine, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let engine = MidiEngine::builder().client_name("midimux-list").build()?;
    println!("backend: {}", engine.backend_name());

    let inputs = engine.list_inputs()?;
    println!("inputs ({}):", inputs.len());
    for desc in &inputs {
        println!("  [{}] {}", desc.index(), desc.name);
    }

    let outputs = engine.list_outputs()?;
    println!("outputs ({}):", outputs.len());
    for desc in &outputs {
        println!("  [{}] {}", desc.index(), desc.name);
    }

    Ok(())
}
