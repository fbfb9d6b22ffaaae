//! Cell-centred scalar fields with ghost layers
//!
//! Storage is a dense `ndarray::Array3` covering the valid box grown by `n_ghost`
//! cells in every direction. All public accessors take signed cell indices, so
//! `(-1, 0, 0)` addresses the first ghost cell below the low-x face.

use crate::{Face, Side, StructuredMesh, SPACEDIM};
use ndarray::{s, Array3, ArrayView3, ArrayViewMut3, Axis, Zip};

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    n_cell: [usize; SPACEDIM],
    n_ghost: usize,
    data: Array3<f64>,
}

impl Field {
    /// A field of zeros over the valid cells of `mesh` with `n_ghost` ghost layers
    pub fn zeros<M: StructuredMesh>(mesh: &M, n_ghost: usize) -> Self {
        Self::from_element(mesh, n_ghost, 0.)
    }

    pub fn from_element<M: StructuredMesh>(mesh: &M, n_ghost: usize, value: f64) -> Self {
        let n_cell = mesh.n_cell();
        let shape = (
            n_cell[0] + 2 * n_ghost,
            n_cell[1] + 2 * n_ghost,
            n_cell[2] + 2 * n_ghost,
        );
        Self {
            n_cell,
            n_ghost,
            data: Array3::from_elem(shape, value),
        }
    }

    /// Builds a field by evaluating `f` on every valid cell, ghosts are zero
    pub fn from_fn<M, F>(mesh: &M, n_ghost: usize, f: F) -> Self
    where
        M: StructuredMesh,
        F: Fn(isize, isize, isize) -> f64 + Send + Sync,
    {
        let mut field = Self::zeros(mesh, n_ghost);
        field.fill_valid(f);
        field
    }

    /// A zeroed field with the same layout as `self`
    pub fn zeros_like(&self) -> Self {
        Self {
            n_cell: self.n_cell,
            n_ghost: self.n_ghost,
            data: Array3::zeros(self.data.raw_dim()),
        }
    }

    pub fn n_cell(&self) -> [usize; SPACEDIM] {
        self.n_cell
    }

    pub fn n_ghost(&self) -> usize {
        self.n_ghost
    }

    /// Whether two fields cover the same valid box
    pub fn same_box(&self, other: &Field) -> bool {
        self.n_cell == other.n_cell
    }

    #[inline]
    fn storage_index(&self, i: isize, j: isize, k: isize) -> [usize; 3] {
        let g = self.n_ghost as isize;
        [(i + g) as usize, (j + g) as usize, (k + g) as usize]
    }

    #[inline]
    pub fn get(&self, i: isize, j: isize, k: isize) -> f64 {
        self.data[self.storage_index(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: isize, j: isize, k: isize, value: f64) {
        let index = self.storage_index(i, j, k);
        self.data[index] = value;
    }

    pub fn valid(&self) -> ArrayView3<f64> {
        let (g, [nx, ny, nz]) = (self.n_ghost, self.n_cell);
        self.data.slice(s![g..g + nx, g..g + ny, g..g + nz])
    }

    pub fn valid_mut(&mut self) -> ArrayViewMut3<f64> {
        let (g, [nx, ny, nz]) = (self.n_ghost, self.n_cell);
        self.data.slice_mut(s![g..g + nx, g..g + ny, g..g + nz])
    }

    /// Sets every cell, ghosts included, to `value`
    pub fn set_val(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Overwrites every valid cell with `f(i, j, k)`.
    ///
    /// The closure is evaluated in parallel and must not depend on the order in which
    /// cells are visited.
    pub fn fill_valid<F>(&mut self, f: F)
    where
        F: Fn(isize, isize, isize) -> f64 + Send + Sync,
    {
        Zip::indexed(self.valid_mut()).par_for_each(|(i, j, k), value| {
            *value = f(i as isize, j as isize, k as isize);
        });
    }

    /// Copies the valid cells of `other` into `self`, ghosts are untouched
    pub fn copy_valid_from(&mut self, other: &Field) {
        debug_assert!(self.same_box(other));
        self.valid_mut().assign(&other.valid());
    }

    /// Adds `value` to every valid cell
    pub fn plus(&mut self, value: f64) {
        self.valid_mut().mapv_inplace(|x| x + value);
    }

    /// `a * x + b * y` over the valid cells, with zeroed ghosts
    pub fn lin_comb(a: f64, x: &Field, b: f64, y: &Field) -> Field {
        debug_assert!(x.same_box(y));
        let mut output = x.zeros_like();
        Zip::from(output.valid_mut())
            .and(x.valid())
            .and(y.valid())
            .par_for_each(|o, &x, &y| *o = a * x + b * y);
        output
    }

    /// The maximum absolute value over valid cells
    pub fn norm0(&self) -> f64 {
        self.valid().fold(0., |acc: f64, x| acc.max(x.abs()))
    }

    /// The sum of absolute values over valid cells
    pub fn norm1(&self) -> f64 {
        self.valid().fold(0., |acc, x| acc + x.abs())
    }

    /// Exchanges halos across periodic directions.
    ///
    /// For every periodic axis the ghost layers are filled from the opposite end of
    /// the valid box. Axes are processed in order over the full grown extent of the
    /// other axes, so edge and corner ghosts are filled consistently.
    pub fn fill_boundary(&mut self, periodicity: [bool; SPACEDIM]) {
        let g = self.n_ghost;
        if g == 0 {
            return;
        }
        for (axis, _) in periodicity.iter().enumerate().filter(|(_, &p)| p) {
            let n = self.n_cell[axis];
            assert!(
                n >= g,
                "periodic halo exchange needs at least as many cells as ghost layers"
            );
            for ghost in 0..g {
                let source = self.data.index_axis(Axis(axis), ghost + n).to_owned();
                self.data
                    .index_axis_mut(Axis(axis), ghost)
                    .assign(&source);
                let source = self.data.index_axis(Axis(axis), ghost + g).to_owned();
                self.data
                    .index_axis_mut(Axis(axis), ghost + g + n)
                    .assign(&source);
            }
        }
    }

    /// Copies the nearest interior value into the ghost layer adjacent to `face`.
    ///
    /// The layer covers the tangential extent grown by one cell, so calling this for
    /// every face in axis order also sets edge and corner ghosts.
    pub fn extrapolate_into_ghost_layer(&mut self, face: Face) {
        assert!(self.n_ghost >= 1, "zero-gradient fill needs a ghost layer");
        let g = self.n_ghost;
        let n = self.n_cell[face.axis];
        let (ghost, interior) = match face.side {
            Side::Low => (g - 1, g),
            Side::High => (g + n, g + n - 1),
        };
        let tangential = (0..SPACEDIM)
            .filter(|&axis| axis != face.axis)
            .map(|axis| (g - 1, g + self.n_cell[axis] + 1))
            .collect::<Vec<_>>();
        let ((a0, a1), (b0, b1)) = (tangential[0], tangential[1]);

        let source = self
            .data
            .index_axis(Axis(face.axis), interior)
            .slice(s![a0..a1, b0..b1])
            .to_owned();
        self.data
            .index_axis_mut(Axis(face.axis), ghost)
            .slice_mut(s![a0..a1, b0..b1])
            .assign(&source);
    }
}
