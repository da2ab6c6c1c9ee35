use grid_util::point::Point;
use pathfinding_fx::{EngineConfig, PathfindingEngine, RandomReachableGoal, WalkerEvent};
use rand::prelude::*;

// Three walkers roam a random 25x25 map, each picking a new random reachable target whenever it
// arrives. Every simulated second the map is printed with walkers as digits and targets as
// letters.
const SIZE: usize = 25;

fn random_free_cell(engine: &PathfindingEngine, rng: &mut StdRng) -> Point {
    loop {
        let p = Point::new(
            rng.gen_range(0..SIZE as i32),
            rng.gen_range(0..SIZE as i32),
        );
        if engine.is_passable(p) && !engine.is_occupied(p) {
            return p;
        }
    }
}

fn print_map(engine: &PathfindingEngine) {
    let view = engine.view();
    for y in 0..view.height as i32 {
        let line = (0..view.width as i32)
            .map(|x| {
                let p = Point::new(x, y);
                for (i, w) in view.walkers.iter().enumerate() {
                    if w.cell == p {
                        return char::from(b'0' + i as u8);
                    }
                    if w.target == p && w.target_visible {
                        return char::from(b'a' + i as u8);
                    }
                }
                if !engine.is_passable(p) {
                    '#'
                } else if view.walkers.iter().any(|w| w.path.contains(&p)) {
                    '*'
                } else {
                    '.'
                }
            })
            .collect::<String>();
        println!("{line}");
    }
    println!();
}

fn main() {
    let mut rng = StdRng::seed_from_u64(3);
    let rows = (0..SIZE)
        .map(|_| {
            (0..SIZE)
                .map(|_| if rng.gen_bool(0.2) { 0u8 } else { 1u8 })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let mut engine = PathfindingEngine::new(&rows, EngineConfig::default())
        .unwrap()
        .with_goal_policy(Box::new(RandomReachableGoal::seeded(4)));
    for speed in [100.0, 50.0, 200.0] {
        let from = random_free_cell(&engine, &mut rng);
        let to = random_free_cell(&engine, &mut rng);
        engine.add_walker(from, to, Some(speed)).unwrap();
    }

    let frame_ms = 1000.0 / 60.0;
    for frame in 0..=600 {
        engine.frame(frame as f64 * frame_ms);
        for event in engine.drain_events() {
            match event {
                WalkerEvent::PathEnd { walker, cell } => println!("{walker:?} arrived at {cell}"),
                WalkerEvent::Trapped { walker, cell } => println!("{walker:?} is trapped at {cell}"),
                _ => {}
            }
        }
        if frame % 60 == 0 {
            print_map(&engine);
        }
    }
}
