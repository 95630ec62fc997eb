//! Headless run of the two-particle pendulum scenario from spec.md §8,
//! printing frame stats instead of drawing anything.
use glam::DVec2;
use maze_engine::{EngineConfig, Facade, Particle};

fn main() {
    tracing_subscriber::fmt::init();

    let config = EngineConfig::default();
    let field = maze_engine::ParameterField::new(
        2,
        2,
        DVec2::new(-500.0, -500.0),
        DVec2::new(500.0, 500.0),
        0.0,
    );
    let mut facade = Facade::new(config, 1, field);

    let anchor = facade.add_particle(Particle::locked(DVec2::new(100.0, 100.0)));
    let bob = facade.add_particle(Particle::new(DVec2::new(140.0, 100.0)));
    facade.add_constraint(anchor, bob, Some(40.0)).unwrap();
    facade.save_state();

    for frame in 0..600 {
        facade.tick();
        if frame % 60 == 0 {
            let stats = facade.frame_stats();
            println!(
                "frame {frame}: bob at {:?}, entities={}, links={}",
                facade.grid.particles[1].pos, stats.entity_count, stats.link_count
            );
        }
    }
}
