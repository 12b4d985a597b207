//! seed-runner: executes a block layout / seed payload for one worker.
//!
//! Usage:
//!   seed-runner --payload payload.json --data-dir ./data
//!   seed-runner --payload payload.json --event 42 --db ./data/events.db
//!
//! The worker's event number comes from --event, else CC_EVENT_NUMBER.

use anyhow::{Context, Result};
use seedgen_core::{
    action::{ActionContext, Payload},
    blob::BlobStore,
    store::SeedStore,
    types::EventIndex,
};
use std::env;

const EVENT_NUMBER_VAR: &str = "CC_EVENT_NUMBER";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let payload_path = string_arg(&args, "--payload").context("--payload <file> is required")?;
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let db = string_arg(&args, "--db")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{data_dir}/events.db"));
    let event_index = worker_event(&args)?;

    println!("seed-runner");
    println!("  payload:   {payload_path}");
    println!("  data_dir:  {data_dir}");
    println!("  db:        {db}");
    match event_index {
        Some(e) => println!("  event:     {e}"),
        None => println!("  event:     (none)"),
    }
    println!();

    let payload = Payload::load(payload_path)?;

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create data dir {data_dir}"))?;
    let store = SeedStore::open(&db)?;
    store.migrate()?;

    let ctx = ActionContext {
        blobs: BlobStore::new(data_dir),
        store,
        event_index,
    };

    for (action, outcome) in payload.actions.iter().zip(ctx.run_payload(&payload)?) {
        println!("  {:<28} {outcome}", action.type_name());
    }
    log::info!("compute complete");
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn worker_event(args: &[String]) -> Result<Option<EventIndex>> {
    let raw = match string_arg(args, "--event") {
        Some(v) => Some(v.to_string()),
        None => env::var(EVENT_NUMBER_VAR).ok(),
    };
    raw.map(|v| {
        v.trim()
            .parse::<EventIndex>()
            .with_context(|| format!("bad event number '{v}'"))
    })
    .transpose()
}
