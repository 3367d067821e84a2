use serde::{Deserialize, Serialize};

/// A dense 2D grid of samples, stored row by row.
///
/// Every field the renderer reads is one of these; `elevation` defines the
/// canonical size that all the others must match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Tilemap<T> {
    /// Wrap an existing row-major buffer. Returns `None` when the buffer
    /// length is not `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if width.checked_mul(height) != Some(data.len()) {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({}, {}) outside {}x{}", x, y, self.width, self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of stored samples. Only differs from `width * height` for a
    /// grid deserialized from a malformed file.
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer holds exactly `width * height` samples.
    pub fn is_consistent(&self) -> bool {
        self.width.checked_mul(self.height) == Some(self.data.len())
    }

    /// Iterate over all cells with their coordinates, in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Apply `f` to every sample, producing a grid of the same size.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let map = Tilemap::from_vec(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(*map.get(0, 0), 0);
        assert_eq!(*map.get(2, 0), 2);
        assert_eq!(*map.get(0, 1), 3);
        assert_eq!(*map.get(2, 1), 5);
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        assert!(Tilemap::from_vec(3, 2, vec![0.0f32; 5]).is_none());
        assert!(Tilemap::from_vec(0, 0, Vec::<f32>::new()).is_some());
        assert!(Tilemap::from_vec(usize::MAX, 2, Vec::<f32>::new()).is_none());
    }

    #[test]
    fn test_from_fn_matches_iter() {
        let map = Tilemap::from_fn(4, 3, |x, y| x * 10 + y);
        for (x, y, &v) in map.iter() {
            assert_eq!(v, x * 10 + y);
        }
        assert_eq!(map.len(), 12);
    }

    #[test]
    fn test_set_and_map() {
        let mut map = Tilemap::new_with(2, 2, 0.25f32);
        map.set(1, 1, 1.0);
        let doubled = map.map(|v| v * 2.0);
        assert_eq!(*doubled.get(0, 0), 0.5);
        assert_eq!(*doubled.get(1, 1), 2.0);
        assert_eq!(doubled.dimensions(), (2, 2));
    }

    #[test]
    fn test_deserialized_length_is_checked() {
        let map: Tilemap<f32> =
            serde_json::from_str(r#"{"width":2,"height":2,"data":[0.0,0.5,1.0]}"#).unwrap();
        assert!(!map.is_consistent());
    }

    #[test]
    fn test_overflowing_size_is_inconsistent() {
        let map: Tilemap<f32> =
            serde_json::from_str(r#"{"width":9223372036854775808,"height":2,"data":[]}"#).unwrap();
        assert!(!map.is_consistent());
    }
}
