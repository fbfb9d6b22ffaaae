use crate::{Grid, SPACEDIM};
use nalgebra::Point3;

/// A grid whose z axis is divided into a stack of layers
///
/// `layer_of_slab[k]` is the index of the layer that owns the z-slab `k`.
#[derive(Clone, Debug)]
pub struct LayeredGrid {
    pub grid: Grid,
    layer_of_slab: Vec<usize>,
}

impl LayeredGrid {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The layer containing z-slab `k`, `None` for ghost slabs
    pub fn layer_at(&self, k: isize) -> Option<usize> {
        if k < 0 {
            return None;
        }
        self.layer_of_slab.get(k as usize).copied()
    }

    /// The layer containing the slab nearest to `k`, clamping ghost slabs onto the stack
    pub fn nearest_layer(&self, k: isize) -> usize {
        let last = self.layer_of_slab.len() as isize - 1;
        self.layer_of_slab[k.clamp(0, last) as usize]
    }

    pub fn number_of_layers(&self) -> usize {
        self.layer_of_slab.last().map(|&x| x + 1).unwrap_or(0)
    }
}

/// Creates a grid over a stack of layers grown along z.
///
/// Each layer of thickness `thickness[i]` (in units of `unit_length`) is meshed with
/// `thickness[i] * cells_per_unit` slabs, rounded to the nearest whole slab and never
/// fewer than one. The lateral extent is `lateral_size` units, divided into
/// `cells_xy` cells in each of x and y.
pub fn create_layered_grid(
    unit_length: f64,
    thickness: &[f64],
    cells_per_unit: usize,
    lateral_size: f64,
    cells_xy: [usize; 2],
    periodicity: [bool; SPACEDIM],
) -> LayeredGrid {
    assert!(!thickness.is_empty(), "a layered grid needs at least one layer");
    assert!(cells_per_unit > 0, "cells per unit must be positive");
    assert!(
        cells_xy.iter().all(|&n| n > 0),
        "lateral cell counts must be positive"
    );

    let layer_of_slab = thickness
        .iter()
        .enumerate()
        .flat_map(|(layer, &units)| {
            let slabs = ((units * cells_per_unit as f64).round() as usize).max(1);
            std::iter::repeat(layer).take(slabs)
        })
        .collect::<Vec<_>>();

    let n_z = layer_of_slab.len();
    let dz = unit_length / cells_per_unit as f64;
    let lateral = lateral_size * unit_length;

    let grid = Grid::new(
        [cells_xy[0], cells_xy[1], n_z],
        Point3::origin(),
        Point3::new(lateral, lateral, n_z as f64 * dz),
        periodicity,
    );

    LayeredGrid {
        grid,
        layer_of_slab,
    }
}

#[cfg(test)]
mod test {
    use super::create_layered_grid;
    use approx::assert_relative_eq;

    #[test]
    fn layers_are_stacked_along_z_without_gaps() {
        let stack = create_layered_grid(1e-9, &[5., 4., 10.], 2, 8., [4, 4], [true, true, false]);
        let grid = stack.grid();
        assert_eq!(grid.n_cell(), [4, 4, 38]);
        assert_relative_eq!(grid.dx().z, 0.5e-9);
        assert_relative_eq!(grid.prob_hi().z, 19e-9, epsilon = 1e-20);

        assert_eq!(stack.layer_at(0), Some(0));
        assert_eq!(stack.layer_at(9), Some(0));
        assert_eq!(stack.layer_at(10), Some(1));
        assert_eq!(stack.layer_at(17), Some(1));
        assert_eq!(stack.layer_at(18), Some(2));
        assert_eq!(stack.layer_at(38), None);
        assert_eq!(stack.layer_at(-1), None);
        assert_eq!(stack.nearest_layer(-1), 0);
        assert_eq!(stack.nearest_layer(38), 2);
        assert_eq!(stack.number_of_layers(), 3);
    }

    #[test]
    fn thin_layers_keep_at_least_one_slab() {
        let stack = create_layered_grid(1., &[0.1, 1.], 1, 1., [1, 1], [false; 3]);
        assert_eq!(stack.grid().n_cell()[2], 2);
        assert_eq!(stack.layer_at(0), Some(0));
        assert_eq!(stack.layer_at(1), Some(1));
    }
}
