use grid_util::point::Point;
use pathfinding_fx::{AstarSolver, Heuristic, SearchOptions, WeightGrid};

// Prints the order in which A* expands cells on its way from S to G, once stopping at the goal
// and once draining the whole open set. Cells are labelled with their expansion index modulo 36.
const W: i32 = 16;
const H: i32 = 10;

fn label(i: usize) -> char {
    let i = (i % 36) as u32;
    char::from_digit(i, 36).unwrap_or('?')
}

fn main() {
    let mut grid = WeightGrid::new(W as usize, H as usize, 1.0).unwrap();
    for x in 6..8 {
        for y in 1..8 {
            grid.set_weight(Point::new(x, y), 0.0).unwrap();
        }
    }
    // a swamp the search prefers to go around
    for y in 6..H {
        grid.set_weight(Point::new(10, y), 5.0).unwrap();
    }
    grid.update();
    let start = Point::new(1, 4);
    let goal = Point::new(13, 4);
    let solver = AstarSolver::new(SearchOptions::new(Heuristic::Euclidean, true));

    for greedy in [true, false] {
        let flood = solver.find_flood(&grid, start, goal, greedy).unwrap();
        println!("greedy = {greedy}: {} cells expanded", flood.len());
        for y in 0..H {
            let line = (0..W)
                .map(|x| {
                    let p = Point::new(x, y);
                    if p == start {
                        'S'
                    } else if p == goal {
                        'G'
                    } else if !grid.is_passable(p) {
                        '#'
                    } else {
                        flood
                            .iter()
                            .position(|c| c.position == p)
                            .map(label)
                            .unwrap_or(' ')
                    }
                })
                .collect::<String>();
            println!("{line}");
        }
        println!();
    }
    let path = solver.find_path(&grid, start, goal).unwrap();
    println!(
        "path of {} cells, cost {:.2}",
        path.len(),
        solver.path_cost(&grid, &path)
    );
}
