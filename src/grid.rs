use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{Index, IndexMut};

use crate::data::TileIndex;

/// Row-major 2D storage indexed by flat tile index.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn indices(&self) -> ::std::ops::Range<TileIndex> {
        0..self.data.len()
    }

    pub fn iter(&self) -> ::std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> ::std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Same shape, every cell set to `default`.
    pub fn scratchpad<U: Clone>(&self, default: U) -> Grid<U> {
        Grid {
            data: vec![default; self.data.len()],
            width: self.width,
            height: self.height,
        }
    }
}

impl<T> Grid<T> {
    pub(crate) fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), width * height);
        Grid {
            data,
            width,
            height,
        }
    }
}

impl<T: Clone> Grid<T> {
    pub(crate) fn new(width: usize, height: usize, default: T) -> Self {
        Grid {
            data: vec![default; width * height],
            width,
            height,
        }
    }
}

impl Display for Grid<bool> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.width) {
            for &cell in row {
                write!(f, "{}", if cell { 1 } else { 0 })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Display for Grid<Option<u16>> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.width) {
            let line: Vec<_> = row
                .iter()
                .map(|cell| match cell {
                    Some(dist) => format!("{:>3}", dist),
                    None => "  -".to_string(),
                }).collect();
            writeln!(f, "{}", line.join(""))?;
        }
        Ok(())
    }
}

impl<T> Debug for Grid<T>
where
    Grid<T>: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl<T> Index<TileIndex> for Grid<T> {
    type Output = T;

    fn index(&self, index: TileIndex) -> &Self::Output {
        // unchecked indexing is only marginally faster (if at all) to justify unsafe
        &self.data[index]
    }
}

impl<T> IndexMut<TileIndex> for Grid<T> {
    fn index_mut(&mut self, index: TileIndex) -> &mut Self::Output {
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratchpad_keeps_shape() {
        let grid = Grid::new(3, 2, 'x');
        let mut scratch = grid.scratchpad(false);
        assert_eq!(scratch.width(), 3);
        assert_eq!(scratch.height(), 2);
        scratch[4] = true;
        assert_eq!(scratch.to_string(), "000\n010\n");
    }
}
