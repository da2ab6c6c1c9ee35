use grid_util::point::Point;
use smallvec::SmallVec;

use crate::matrix::SearchMatrix;
use crate::N_SMALLVEC_SIZE;

/// Enumerates the passable neighbours of `cell` from its Moore neighbourhood, or its von
/// Neumann neighbourhood without `allow_diagonal`.
pub fn neighbors(
    matrix: &SearchMatrix,
    cell: Point,
    allow_diagonal: bool,
) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
    let candidates = if allow_diagonal {
        cell.moore_neighborhood()
    } else {
        cell.neumann_neighborhood()
    };
    candidates
        .into_iter()
        .filter(|n| can_move_to(matrix, *n, cell))
        .collect()
}

/// Whether a single step from `start` onto `pos` is allowed. A diagonal step also needs both
/// cells it shares a corner with, so a path never clips through the corner of a wall.
pub fn can_move_to(matrix: &SearchMatrix, pos: Point, start: Point) -> bool {
    matrix.passable(pos)
        && (!is_diagonal(&start, &pos)
            || (matrix.passable(Point::new(start.x, pos.y))
                && matrix.passable(Point::new(pos.x, start.y))))
}

/// Whether two neighbouring cells differ on both axes.
pub fn is_diagonal(p1: &Point, p2: &Point) -> bool {
    p1.x != p2.x && p1.y != p2.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight_grid::WeightGrid;

    #[test]
    fn open_field_has_eight() {
        let grid = WeightGrid::new(3, 3, 1.0).unwrap();
        let matrix = SearchMatrix::build(&grid);
        assert_eq!(neighbors(&matrix, Point::new(1, 1), true).len(), 8);
        assert_eq!(neighbors(&matrix, Point::new(1, 1), false).len(), 4);
        assert_eq!(neighbors(&matrix, Point::new(0, 0), true).len(), 3);
    }

    #[test]
    fn no_corner_cutting() {
        // |.#|
        // |..|
        let rows = vec![vec![1u8, 0], vec![1, 1]];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        let matrix = SearchMatrix::build(&grid);
        let n = neighbors(&matrix, Point::new(0, 1), true);
        assert!(n.contains(&Point::new(0, 0)));
        assert!(n.contains(&Point::new(1, 1)));
        // (1, 0) is a wall, and the diagonal from (0, 0) to (1, 1) cuts its corner
        assert!(!n.contains(&Point::new(1, 0)));
        let n = neighbors(&matrix, Point::new(0, 0), true);
        assert!(!n.contains(&Point::new(1, 1)));
    }

    #[test]
    fn orthogonal_order() {
        let grid = WeightGrid::new(3, 3, 1.0).unwrap();
        let matrix = SearchMatrix::build(&grid);
        let n = neighbors(&matrix, Point::new(1, 1), false);
        assert_eq!(n.as_slice(), Point::new(1, 1).neumann_neighborhood().as_slice());
    }

    #[test]
    fn diagonal_step_needs_both_corners() {
        // |..|
        // |#.|
        let rows = vec![vec![1u8, 1], vec![0, 1]];
        let grid = WeightGrid::from_rows(&rows).unwrap();
        let matrix = SearchMatrix::build(&grid);
        assert!(!can_move_to(&matrix, Point::new(1, 1), Point::new(0, 0)));
        assert!(!can_move_to(&matrix, Point::new(0, 0), Point::new(1, 1)));
        assert!(can_move_to(&matrix, Point::new(1, 1), Point::new(1, 0)));
        assert!(!can_move_to(&matrix, Point::new(2, 1), Point::new(1, 1)));
    }
}
