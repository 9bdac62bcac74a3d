use anyhow::Result;

use engine::Engine;

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Engine::new() {
        Err(err) => println!("{}", err),
        Ok(engine) => engine.run()?,
    }

    Ok(())
}
