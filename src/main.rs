use constellation::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(400);

    log::info!("Space / Enter / right click: align or scatter. P: pause. Drag: orbit.");

    let result = Constellation::new()
        .with_particle_count(count)
        .with_celebration(|burst| {
            log::info!(
                "Celebration: {} sparks, {} degree spread",
                burst.particle_count,
                burst.spread
            )
        })
        .run();

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
