//! The georeferenced raster grid

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{s, Array2, ArrayView2};

/// A georeferenced 2D grid of cells.
///
/// Cells are stored row-major as `(row, col)`. The grid carries its own
/// [`GeoTransform`], an optional [`CRS`] and an optional nodata marker, so
/// every derived factor raster keeps the georeferencing of its input.
///
/// ```ignore
/// use rusle_core::Raster;
///
/// let mut slope: Raster<f64> = Raster::new(100, 100);
/// slope.set(10, 20, 4.5)?;
/// assert_eq!(slope.get(10, 20)?, 4.5);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled raster
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Raster with every cell set to `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Raster from row-major values; `data.len()` must equal `rows * cols`
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Zero-filled raster of another cell type sharing this raster's
    /// transform and CRS. Nodata is left unset.
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Same shape and metadata, every cell set to `fill_value`
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: self.nodata,
        }
    }

    /// Build a same-shape `f64` raster from row-major values, keeping this
    /// raster's georeferencing and marking NaN as nodata.
    pub fn derive_f64(&self, data: Vec<f64>) -> Result<Raster<f64>> {
        let (rows, cols) = self.shape();
        let mut output = self.with_same_meta::<f64>(rows, cols);
        output.set_nodata(Some(f64::NAN));
        *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(output)
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with [`Error::SizeMismatch`] unless `other` has the same shape
    pub fn ensure_same_shape<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        let (er, ec) = self.shape();
        let (ar, ac) = other.shape();
        if er != ar || ec != ac {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// # Safety
    /// `row < self.rows()` and `col < self.cols()` must hold.
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    /// Copy of the `rows` x `cols` window starting at `(row0, col0)`, with
    /// the transform shifted to the window origin.
    pub fn window(&self, row0: usize, col0: usize, rows: usize, cols: usize) -> Result<Self> {
        if row0 + rows > self.rows() || col0 + cols > self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: row0 + rows,
                col: col0 + cols,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(Self {
            data: self
                .data
                .slice(s![row0..row0 + rows, col0..col0 + cols])
                .to_owned(),
            transform: self.transform.shifted(col0, row0),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size in CRS units (square cells assumed)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    /// `(row, col)` of the cell containing map position `(x, y)`, if inside
    pub fn cell_at_geo(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.geo_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        (row < self.rows() && col < self.cols()).then_some((row, col))
    }

    /// Value of the cell containing `(x, y)`; `None` outside the grid or on nodata
    pub fn value_at_geo(&self, x: f64, y: f64) -> Option<T> {
        let (row, col) = self.cell_at_geo(x, y)?;
        let value = self.data[(row, col)];
        (!self.is_nodata(value)).then_some(value)
    }

    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.is_nodata(self.get(row, col)?))
    }

    /// Minimum, maximum and mean over valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }

    /// `(min, max)` of valid cells as `f64`, `None` when every cell is nodata
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let stats = self.statistics();
        Some((stats.min?.to_f64()?, stats.max?.to_f64()?))
    }
}

/// Summary statistics of a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Raster<f64> {
        let data = (0..20).map(|v| v as f64).collect();
        let mut r = Raster::from_vec(data, 4, 5).unwrap();
        r.set_transform(GeoTransform::new(100.0, 50.0, 10.0, -10.0));
        r
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Raster::<f64>::from_vec(vec![0.0; 5], 2, 3).is_err());
    }

    #[test]
    fn test_get_set() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1.0).is_err());
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let mut raster = ramp();
        raster.set(0, 0, f64::NAN).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(19.0));
        assert_eq!(stats.valid_count, 19);
        assert_eq!(stats.nodata_count, 1);
        assert_eq!(raster.min_max(), Some((1.0, 19.0)));
    }

    #[test]
    fn test_min_max_all_nodata() {
        let raster: Raster<f64> = Raster::filled(3, 3, f64::NAN);
        assert!(raster.min_max().is_none());
    }

    #[test]
    fn test_value_at_geo() {
        let raster = ramp();
        // Column 2, row 1 spans x in [120, 130), y in (30, 40]
        assert_eq!(raster.value_at_geo(125.0, 35.0), Some(7.0));
        assert_eq!(raster.value_at_geo(99.0, 35.0), None);
        assert_eq!(raster.value_at_geo(125.0, 51.0), None);
    }

    #[test]
    fn test_window_keeps_georeferencing() {
        let raster = ramp();
        let win = raster.window(1, 2, 2, 3).unwrap();
        assert_eq!(win.shape(), (2, 3));
        assert_eq!(win.get(0, 0).unwrap(), 7.0);
        assert_eq!(win.pixel_to_geo(0, 0), raster.pixel_to_geo(2, 1));
        assert!(raster.window(3, 0, 2, 1).is_err());
    }

    #[test]
    fn test_shape_check() {
        let a: Raster<f64> = Raster::new(3, 4);
        let b: Raster<u8> = Raster::new(3, 4);
        let c: Raster<f64> = Raster::new(4, 3);
        assert!(a.ensure_same_shape(&b).is_ok());
        assert!(a.ensure_same_shape(&c).is_err());
    }
}
