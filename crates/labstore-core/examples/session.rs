//! Example of driving a labstore session directly from Rust.

use labstore_core::{timestamp_value, Emitter, FileFormat, Notify, Row, Store, StoreConfig, StoreEvent};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Announce every commit on stdout
    let mut emitter = Emitter::new();
    emitter.on(StoreEvent::Commit, |store| {
        println!("committed row {}", store.len() - 1);
        Ok(())
    });
    let mut store = Store::with_channel(StoreConfig::default(), emitter);

    // 2. Session-wide values set once, kept in the state
    store.set_value("participant", "p-001")?;

    // 3. Simulate trials: several components contribute to each row
    for trial in 0..5 {
        let mut stimulus = Row::new();
        stimulus.insert("sender".to_string(), json!("stimulus"));
        stimulus.insert("trial".to_string(), json!(trial));
        stimulus.insert("_render_frames".to_string(), json!(3));
        store.set_with(stimulus, Notify::Suppress)?;

        store.set_value("response", if trial % 2 == 0 { "left" } else { "right" })?;
        store.set_value("rt", 250 + trial * 40)?;
        store.set_value("timestamp", timestamp_value(&chrono::Utc::now()))?;
        store.commit()?;
    }

    // 4. Query and export
    println!("columns: {:?}", store.keys());
    println!("reaction times: {:?}", store.extract("rt", "stimulus"));

    let download = store.download(FileFormat::Csv)?;
    println!("{} ({}, {} bytes)", download.filename, download.blob.mime, download.blob.len());
    println!("{}", String::from_utf8(download.blob.bytes)?);

    Ok(())
}
