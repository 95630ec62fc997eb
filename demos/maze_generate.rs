//! Headless run of the curve-evolution engine: seeds a closed circular
//! curve, ticks it, and prints how resampling changes its sample count.
use glam::DVec2;
use maze_engine::{Curve, CurveEvolver, CurveKind, CurveParams, ParameterField};
use std::f64::consts::PI;

fn circle(n: usize, radius: f64) -> Vec<DVec2> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (n as f64);
            DVec2::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

fn main() {
    tracing_subscriber::fmt::init();

    let world_min = DVec2::new(-400.0, -400.0);
    let world_max = DVec2::new(400.0, 400.0);
    let mut evolver = CurveEvolver::new(7, 32.0, ParameterField::new(4, 4, world_min, world_max, 0.0));

    let f_b = evolver.add_field({
        let mut f = ParameterField::new(4, 4, world_min, world_max, 0.3);
        f.fill_procedural(|_, _| 0.3);
        f
    });
    let f_f = evolver.add_field({
        let mut f = ParameterField::new(4, 4, world_min, world_max, 0.5);
        f.fill_procedural(|_, _| 0.5);
        f
    });
    let f_a = evolver.add_field({
        let mut f = ParameterField::new(4, 4, world_min, world_max, 1.0);
        f.fill_procedural(|_, _| 1.0);
        f
    });

    let params = CurveParams {
        f_b,
        f_f,
        f_a,
        d: 20.0,
        kmin: 0.2,
        kmax: 1.2,
        nmin: 2,
    };
    evolver.add_curve(Curve::from_positions(1, circle(40, 100.0), 1.0, true, CurveKind::Labyrinth, params));

    for tick in 0..200 {
        evolver.tick(1.0 / 60.0);
        if tick % 20 == 0 {
            println!("tick {tick}: samples={}", evolver.curves[0].len());
        }
    }
}
