// fuse/stack.rs

//! # Block-Matrix Assembly
//!
//! Builds one matrix out of a rectangular grid of blocks where some cells are
//! concrete arrays and others are generators whose shape is not known until
//! their neighbors have been measured. Resolution is two-pass: first every
//! row's height and every column's width is taken as the maximum over the
//! concrete cells it contains (falling back to a caller-supplied default when
//! a row or column holds only generators), then each generator is invoked
//! with its resolved `(height, width)` and the grid is concatenated row by
//! row.
//!
//! Nothing is validated ahead of the concatenation itself: concrete cells
//! that disagree on a shared dimension, or a generator that ignores the
//! requested shape, fail at the `concatenate` call and surface as a
//! [`StackError`].

use itertools::Itertools;
use ndarray::{Array1, Array2, Axis, ShapeError, concatenate};
use num_traits::{One, Zero};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    /// Assembling zero rows or zero columns is undefined.
    #[error("cannot assemble an empty grid")]
    EmptyGrid,

    #[error("grid is ragged: row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },

    /// Cells in one row disagree on height, either between concrete blocks
    /// or because a generator returned a block of the wrong size.
    #[error("cells in row {row} do not concatenate: {source}")]
    RowMismatch { row: usize, source: ShapeError },

    /// Row strips disagree on total width.
    #[error("row strips do not stack: {source}")]
    StripMismatch { source: ShapeError },
}

/// One cell of an assembly grid.
///
/// A cell either carries its own array or defers its contents to a generator
/// that is called with the resolved `(height, width)` of its slot. The
/// variant is explicit; a concrete value is never probed for callability.
pub enum Block<A> {
    Concrete(Array2<A>),
    Deferred(Box<dyn Fn(usize, usize) -> Array2<A>>),
}

impl<A> Block<A> {
    /// Promotes a scalar to a 1x1 concrete block.
    pub fn scalar(value: A) -> Self
    where
        A: Clone,
    {
        Block::Concrete(Array2::from_elem((1, 1), value))
    }

    /// Promotes a flat sequence to a 1xN concrete block.
    pub fn row(values: impl Into<Array1<A>>) -> Self {
        Block::Concrete(values.into().insert_axis(Axis(0)))
    }

    pub fn deferred<F>(generator: F) -> Self
    where
        F: Fn(usize, usize) -> Array2<A> + 'static,
    {
        Block::Deferred(Box::new(generator))
    }

    /// Zero fill of whatever size the slot resolves to.
    pub fn zeros() -> Self
    where
        A: Clone + Zero + 'static,
    {
        Self::deferred(|height, width| Array2::zeros((height, width)))
    }

    /// One fill of whatever size the slot resolves to.
    pub fn ones() -> Self
    where
        A: Clone + One + 'static,
    {
        Self::deferred(|height, width| Array2::from_elem((height, width), A::one()))
    }

    /// Identity fill: ones on the main diagonal of the resolved slot, zeros
    /// elsewhere. The slot need not be square.
    pub fn eye() -> Self
    where
        A: Clone + Zero + One + 'static,
    {
        Self::deferred(|height, width| {
            Array2::from_shape_fn((height, width), |(i, j)| {
                if i == j { A::one() } else { A::zero() }
            })
        })
    }

    /// `Some((height, width))` for a concrete block, `None` for a deferred one.
    pub fn shape(&self) -> Option<(usize, usize)> {
        match self {
            Block::Concrete(cell) => Some((cell.nrows(), cell.ncols())),
            Block::Deferred(_) => None,
        }
    }
}

impl<A> From<Array2<A>> for Block<A> {
    fn from(cell: Array2<A>) -> Self {
        Block::Concrete(cell)
    }
}

impl<A> From<Array1<A>> for Block<A> {
    fn from(values: Array1<A>) -> Self {
        Block::row(values)
    }
}

impl<A> From<Vec<A>> for Block<A> {
    fn from(values: Vec<A>) -> Self {
        Block::row(values)
    }
}

impl<A: fmt::Debug> fmt::Debug for Block<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Concrete(cell) => f.debug_tuple("Concrete").field(cell).finish(),
            Block::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Vertically stacks the result of horizontally stacking each row of `grid`,
/// resolving deferred cells against their row and column neighbors.
///
/// `default` is the height (width) given to a row (column) containing no
/// concrete cell. With `default = 0` such a row or column collapses to
/// nothing and drops out of the output.
///
/// ```
/// use covfuse::stack::{Block, assemble};
/// use ndarray::Array2;
///
/// let grid = vec![
///     vec![Block::from(Array2::<f64>::eye(3)), Block::zeros()],
///     vec![Block::ones(), Block::scalar(1.0)],
/// ];
/// let stacked = assemble(grid, 0).unwrap();
/// assert_eq!(stacked.dim(), (4, 4));
/// assert_eq!(stacked[(3, 3)], 1.0);
/// ```
pub fn assemble<A: Clone>(grid: Vec<Vec<Block<A>>>, default: usize) -> Result<Array2<A>, StackError> {
    if grid.is_empty() {
        return Err(StackError::EmptyGrid);
    }
    let ncols = grid[0].len();
    if let Some((row, cells)) = grid.iter().find_position(|cells| cells.len() != ncols) {
        return Err(StackError::Ragged {
            row,
            found: cells.len(),
            expected: ncols,
        });
    }
    if ncols == 0 {
        return Err(StackError::EmptyGrid);
    }

    // Pass one: measure. A row or column whose cells are all deferred has no
    // concrete size to take the max over and falls back to `default`.
    let heights: Vec<usize> = grid
        .iter()
        .map(|cells| {
            cells
                .iter()
                .filter_map(|block| block.shape().map(|(height, _)| height))
                .max()
                .unwrap_or(default)
        })
        .collect();
    let widths: Vec<usize> = (0..ncols)
        .map(|col| {
            grid.iter()
                .filter_map(|cells| cells[col].shape().map(|(_, width)| width))
                .max()
                .unwrap_or(default)
        })
        .collect();

    log::debug!(
        "assembling {}x{} grid, resolved to {}x{}",
        grid.len(),
        ncols,
        heights.iter().sum::<usize>(),
        widths.iter().sum::<usize>(),
    );

    // Pass two: resolve and concatenate. Generator output is not checked
    // against the requested shape; a wrong answer fails right here.
    let mut strips = Vec::with_capacity(grid.len());
    for (row, cells) in grid.into_iter().enumerate() {
        let resolved: Vec<Array2<A>> = cells
            .into_iter()
            .enumerate()
            .map(|(col, block)| match block {
                Block::Concrete(cell) => cell,
                Block::Deferred(generator) => generator(heights[row], widths[col]),
            })
            .collect();
        let views: Vec<_> = resolved.iter().map(|cell| cell.view()).collect();
        let strip = concatenate(Axis(1), &views)
            .map_err(|source| StackError::RowMismatch { row, source })?;
        strips.push(strip);
    }
    let views: Vec<_> = strips.iter().map(|strip| strip.view()).collect();
    concatenate(Axis(0), &views).map_err(|source| StackError::StripMismatch { source })
}

/// Stacks `blocks` along the diagonal, zero-filling every off-diagonal slot.
///
/// Each off-diagonal zero block takes the height of its row's block and the
/// width of its column's block, so non-square inputs give a rectangular
/// block-diagonal result. 1-D inputs enter as 1xN rows via [`Block::from`].
pub fn diagonal<A>(blocks: Vec<Block<A>>) -> Result<Array2<A>, StackError>
where
    A: Clone + Zero + 'static,
{
    let n = blocks.len();
    let grid = blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            let mut cells: Vec<Block<A>> = (0..n).map(|_| Block::zeros()).collect();
            cells[i] = block;
            cells
        })
        .collect();
    assemble(grid, 0)
}
