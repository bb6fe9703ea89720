//! clipwatchd - pasteboard watcher daemon
//!
//! Watches the system pasteboard and prints each captured item to stdout as
//! a JSON line. History is persisted under the platform data directory.

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("clipwatchd starting...");

    clipwatch::load();

    let Some(events) = clipwatch::subscribe() else {
        log::error!("pasteboard watcher failed to start");
        std::process::exit(1);
    };

    for item in events {
        match serde_json::to_string(&item) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("failed to encode captured item: {}", e),
        }
    }
}
