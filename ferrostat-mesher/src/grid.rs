use crate::{Face, Side, SPACEDIM};
use nalgebra::{Point3, Vector3};

/// A uniform, cell-centred box grid
///
/// Cell `(i, j, k)` with `0 <= i < n_cell[0]` etc. is a valid cell, negative indices
/// and indices beyond `n_cell` address ghost cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub(crate) n_cell: [usize; SPACEDIM],
    pub(crate) prob_lo: Point3<f64>,
    pub(crate) prob_hi: Point3<f64>,
    pub(crate) periodicity: [bool; SPACEDIM],
}

impl Grid {
    pub fn new(
        n_cell: [usize; SPACEDIM],
        prob_lo: Point3<f64>,
        prob_hi: Point3<f64>,
        periodicity: [bool; SPACEDIM],
    ) -> Self {
        Self {
            n_cell,
            prob_lo,
            prob_hi,
            periodicity,
        }
    }

    pub fn n_cell(&self) -> [usize; SPACEDIM] {
        self.n_cell
    }

    pub fn prob_lo(&self) -> &Point3<f64> {
        &self.prob_lo
    }

    pub fn prob_hi(&self) -> &Point3<f64> {
        &self.prob_hi
    }

    pub fn periodicity(&self) -> [bool; SPACEDIM] {
        self.periodicity
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodicity[axis]
    }

    /// The cell size along each axis
    pub fn dx(&self) -> Vector3<f64> {
        let extent = self.prob_hi - self.prob_lo;
        Vector3::new(
            extent.x / self.n_cell[0] as f64,
            extent.y / self.n_cell[1] as f64,
            extent.z / self.n_cell[2] as f64,
        )
    }

    /// Physical location of the centre of cell `(i, j, k)`, valid for ghost cells too
    pub fn cell_centre(&self, i: isize, j: isize, k: isize) -> Point3<f64> {
        let dx = self.dx();
        Point3::new(
            self.prob_lo.x + (i as f64 + 0.5) * dx.x,
            self.prob_lo.y + (j as f64 + 0.5) * dx.y,
            self.prob_lo.z + (k as f64 + 0.5) * dx.z,
        )
    }

    /// Whether `(i, j, k)` is a valid (non-ghost) cell
    pub fn contains(&self, i: isize, j: isize, k: isize) -> bool {
        [i, j, k]
            .iter()
            .zip(self.n_cell.iter())
            .all(|(&idx, &n)| idx >= 0 && idx < n as isize)
    }

    pub fn number_of_cells(&self) -> usize {
        self.n_cell.iter().product()
    }

    /// Linear index of a valid cell, with `i` running fastest
    pub fn linear_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.n_cell[0] * (j + self.n_cell[1] * k)
    }

    /// Iterates the one-cell-deep ghost layer adjacent to `face`.
    ///
    /// The layer spans the valid range of the two tangential axes, it does not
    /// include edge or corner ghosts.
    pub fn ghost_layer(&self, face: Face) -> impl Iterator<Item = (isize, isize, isize)> + '_ {
        let normal_index = match face.side {
            Side::Low => -1,
            Side::High => self.n_cell[face.axis] as isize,
        };
        let ranges = (0..SPACEDIM)
            .map(|axis| {
                if axis == face.axis {
                    normal_index..normal_index + 1
                } else {
                    0..self.n_cell[axis] as isize
                }
            })
            .collect::<Vec<_>>();
        let (ri, rj, rk) = (ranges[0].clone(), ranges[1].clone(), ranges[2].clone());
        rk.flat_map(move |k| {
            let ri = ri.clone();
            rj.clone()
                .flat_map(move |j| ri.clone().map(move |i| (i, j, k)))
        })
    }
}

/// Creates a grid over the unit cube with `cells_per_dim` cells on each axis and no periodicity
pub fn create_unit_cube_grid(cells_per_dim: usize) -> Grid {
    Grid::new(
        [cells_per_dim; SPACEDIM],
        Point3::origin(),
        Point3::new(1., 1., 1.),
        [false; SPACEDIM],
    )
}

#[cfg(test)]
mod test {
    use super::{create_unit_cube_grid, Grid};
    use crate::{Face, Side};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn cell_centres_sit_half_a_cell_from_the_lower_bound() {
        let grid = Grid::new(
            [4, 2, 10],
            Point3::new(-1., 0., 0.),
            Point3::new(1., 1., 5.),
            [true, true, false],
        );
        let centre = grid.cell_centre(0, 0, 0);
        assert_relative_eq!(centre.x, -0.75);
        assert_relative_eq!(centre.y, 0.25);
        assert_relative_eq!(centre.z, 0.25);

        let ghost = grid.cell_centre(0, 0, -1);
        assert_relative_eq!(ghost.z, -0.25);
    }

    #[test]
    fn ghost_layer_covers_the_tangential_extent_of_the_face() {
        let grid = Grid::new(
            [3, 4, 5],
            Point3::origin(),
            Point3::new(3., 4., 5.),
            [false; 3],
        );
        let layer = grid
            .ghost_layer(Face::new(Side::High, 2))
            .collect::<Vec<_>>();
        assert_eq!(layer.len(), 12);
        assert!(layer.iter().all(|&(_, _, k)| k == 5));
        assert!(layer.iter().all(|&(i, j, k)| !grid.contains(i, j, k)));

        let layer = grid.ghost_layer(Face::new(Side::Low, 0)).count();
        assert_eq!(layer, 20);
    }

    #[test]
    fn unit_cube_has_equal_spacing() {
        let grid = create_unit_cube_grid(8);
        let dx = grid.dx();
        assert_relative_eq!(dx.x, 0.125);
        assert_relative_eq!(dx.y, dx.z);
        assert_eq!(grid.number_of_cells(), 512);
    }
}
