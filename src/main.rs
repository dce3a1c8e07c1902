use std::io::stdout;

use talon::engine::Engine;

fn main() -> anyhow::Result<()> {
    talon::init_logging();
    log::info!("{} {} starting up", talon::NAME, talon::VERSION);

    if std::env::args().nth(1).as_deref() == Some("bench") {
        talon::engine::bench();
        return Ok(());
    }

    let mut out = stdout().lock();
    let mut engine = Engine::new(&mut out);
    engine.uci_loop()
}
