use dom::NativeRegistry;
use mimalloc::MiMalloc;
use net::{ClientConfig, HttpTransport};
use registry::Registry;
use runtime::Runtime;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    env_logger::Builder::from_default_env().init();

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8000/".to_string());
    let config = match ClientConfig::parse(&base) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid base url {base:?}: {err}");
            std::process::exit(2);
        }
    };
    log::info!("connecting to {}", config.base);

    let transport = Arc::new(HttpTransport::new(config));
    let mut natives = NativeRegistry::new();
    graphview::register(&mut natives);

    let mut runtime = Runtime::new(transport, Registry::with_builtins(), natives);
    runtime.start();
    runtime.run();
}
