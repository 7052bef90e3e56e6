//! Native GeoTIFF reading/writing on top of the `tiff` crate.
//!
//! Supports single-band grids with the georeferencing subset the factor
//! jobs need: pixel scale + tiepoint, an EPSG code in the GeoKey directory
//! and the GDAL nodata tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Resolve a numeric tag to whatever variant the `tiff` crate uses for it.
fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// Request a cloud-optimized layout. The native writer always produces a
    /// striped file; callers log the request.
    pub cloud_optimized: bool,
}

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF held in memory
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    #[allow(unreachable_patterns)]
    let data: Vec<T> = match decoder.read_image()? {
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::U64(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        DecodingResult::I64(buf) => cast_all(buf),
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        _ => return Err(Error::UnsupportedDataType("unsupported TIFF sample format".into())),
    };

    if data.len() != rows * cols {
        // Multi-sample (chunky) images decode to rows * cols * samples values.
        return Err(Error::UnsupportedDataType(format!(
            "expected a single-band image, decoded {} values for {}x{} pixels",
            data.len(),
            cols,
            rows
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    if let Some(nodata) = read_nodata::<T, R>(&mut decoder) {
        raster.set_nodata(Some(nodata));
    }

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint = [I, J, K, X, Y, Z], scale = [sx, sy, sz]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(tag(GEO_KEY_DIRECTORY)).ok()?;
    if keys.len() < 4 {
        return None;
    }

    // Header: [version, revision, minor, count], then 4-value key entries
    // [id, location, count, value]. Location 0 means the value is inline.
    let count = keys[3] as usize;
    keys[4..]
        .chunks_exact(4)
        .take(count)
        .find_map(|entry| match (entry[0], entry[1], entry[3]) {
            (GEOGRAPHIC_TYPE_KEY | PROJECTED_CS_TYPE_KEY, 0, code) if code > 0 && code < 32767 => {
                Some(CRS::from_epsg(code as u32))
            }
            _ => None,
        })
}

fn read_nodata<T: RasterElement, R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = decoder.get_tag_ascii_string(tag(GDAL_NODATA)).ok()?;
    let value: f64 = text.trim_end_matches('\0').trim().parse().ok()?;
    if value.is_nan() {
        return T::is_float().then(T::default_nodata);
    }
    num_traits::cast(value)
}

/// Write a raster as a single-band 32-bit float GeoTIFF
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, options.unwrap_or_default())?;
    writer.flush()?;
    Ok(())
}

/// Encode a raster as GeoTIFF bytes
pub fn write_geotiff_to_buffer<T: RasterElement>(
    raster: &Raster<T>,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options.unwrap_or_default())?;
    Ok(buf)
}

fn geo_keys(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(|c| c.epsg()).filter(|&code| code < 32767);
    let mut entries: Vec<[u16; 4]> = Vec::with_capacity(3);

    match (crs, epsg) {
        (Some(c), Some(code)) if c.is_geographic() => {
            entries.push([GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            entries.push([GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([GEOGRAPHIC_TYPE_KEY, 0, 1, code as u16]);
        }
        (_, Some(code)) => {
            entries.push([GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([PROJECTED_CS_TYPE_KEY, 0, 1, code as u16]);
        }
        _ => {
            entries.push([GT_MODEL_TYPE_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
        }
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.iter().flatten());
    keys
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, _options: GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    let keys = geo_keys(raster.crs());

    let enc = image.encoder();
    enc.write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])?;
    enc.write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])?;
    enc.write_tag(tag(GEO_KEY_DIRECTORY), keys.as_slice())?;
    // Nodata cells are always written as NaN.
    enc.write_tag(tag(GDAL_NODATA), "nan")?;

    image.write_data(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raster() -> Raster<f64> {
        let data = (0..12).map(|v| v as f64 * 0.5).collect();
        let mut r = Raster::from_vec(data, 3, 4).unwrap();
        r.set_transform(GeoTransform::new(-5.94, 35.84, 0.01, -0.01));
        r.set_crs(Some(CRS::wgs84()));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn test_buffer_roundtrip_keeps_georeferencing() {
        let mut raster = sample_raster();
        raster.set(1, 1, f64::NAN).unwrap();

        let bytes = write_geotiff_to_buffer(&raster, None).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.shape(), (3, 4));
        assert!((back.get(2, 3).unwrap() - 5.5).abs() < 1e-6);
        assert!(back.get(1, 1).unwrap().is_nan());
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(4326));

        let gt = back.transform();
        assert!((gt.origin_x + 5.94).abs() < 1e-9);
        assert!((gt.origin_y - 35.84).abs() < 1e-9);
        assert!((gt.pixel_height + 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_projected_crs_key() {
        let keys = geo_keys(Some(&CRS::from_epsg(32630)));
        assert_eq!(keys[3], 3);
        assert_eq!(&keys[12..16], &[PROJECTED_CS_TYPE_KEY, 0, 1, 32630]);

        let keys = geo_keys(None);
        assert_eq!(keys[3], 2);
    }

    #[test]
    fn test_file_roundtrip() {
        let raster = sample_raster();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        write_geotiff(&raster, tmp.path(), Some(GeoTiffOptions { cloud_optimized: true })).unwrap();

        let back: Raster<f64> = read_geotiff(tmp.path()).unwrap();
        assert_eq!(back.shape(), raster.shape());
        assert_eq!(back.min_max(), Some((0.0, 5.5)));
    }

    #[test]
    fn test_garbage_is_an_error() {
        let result: Result<Raster<f64>> = read_geotiff_from_buffer(b"not a tiff");
        assert!(result.is_err());
    }
}
