//! End-to-end checks of the factor chains on synthetic grids.

use chrono::{Duration, TimeZone, Utc};
use rusle_algorithms::hydrology::{
    fill_sinks, flow_accumulation, flow_direction, FillSinks, FillSinksParams, FlowAccumulation,
    FlowDirection,
};
use rusle_algorithms::imagery::{median_composite, ndvi};
use rusle_algorithms::interpolation::{idw, IdwParams, SamplePoint};
use rusle_algorithms::rusle::{
    c_factor, ls_factor, ls_slope, p_factor, r_factor, soil_loss, CoverEquation, HourlySeries,
    LsParams, RainfallParams, SupportTable,
};
use rusle_algorithms::sampling::{point_grid, random_sample, sample_at_points, SampleParams};
use rusle_algorithms::terrain::{slope, Slope, SlopeParams};
use rusle_core::io::{read_geotiff, write_geotiff};
use rusle_core::{Algorithm, GeoTransform, Raster, Region, CRS};

/// V-shaped valley draining south on a lon/lat grid over Tangier.
fn valley_dem() -> Raster<f64> {
    let (rows, cols) = (40, 40);
    let mut dem = Raster::new(rows, cols);
    dem.set_transform(GeoTransform::new(-5.94, 35.84, 0.0003, -0.0003));
    dem.set_crs(Some(CRS::wgs84()));
    for row in 0..rows {
        for col in 0..cols {
            let across = (col as f64 - 20.0).abs() * 2.0;
            let along = (rows - row) as f64 * 0.5;
            dem.set(row, col, 100.0 + across + along).unwrap();
        }
    }
    // a pit on the valley floor
    dem.set(20, 20, 50.0).unwrap();
    dem
}

#[test]
fn ls_chain_on_valley() {
    let dem = valley_dem();
    let filled = fill_sinks(&dem, FillSinksParams::default()).unwrap();
    assert!(filled.get(20, 20).unwrap() > 100.0);

    let fdir = flow_direction(&filled).unwrap();
    let acc = flow_accumulation(&fdir).unwrap();
    // the valley floor collects more than the ridges
    assert!(acc.get(38, 20).unwrap() > acc.get(38, 2).unwrap());
    assert!(acc.get(38, 20).unwrap() > 30.0);

    let params = LsParams::default();
    let slope_grid = ls_slope(&filled, params.slope_input).unwrap();
    let ls = ls_factor(&slope_grid, &acc, &params).unwrap();

    let (min, max) = ls.min_max().unwrap();
    assert!(min.is_finite() && max.is_finite());
    assert!(ls.get(0, 0).unwrap().is_nan(), "border has no slope");
    assert_eq!(ls.crs(), Some(&CRS::wgs84()));
}

#[test]
fn ls_steps_through_algorithm_trait() {
    let dem = valley_dem();
    let filled = FillSinks.execute_default(dem.clone()).unwrap();
    let fdir = FlowDirection.execute_default(filled.clone()).unwrap();
    let acc = FlowAccumulation.execute_default(fdir).unwrap();
    let slope_deg = Slope.execute_default(filled.clone()).unwrap();

    let direct = flow_accumulation(&flow_direction(&filled).unwrap()).unwrap();
    for (a, b) in acc.data().iter().zip(direct.data().iter()) {
        assert!(a == b || (a.is_nan() && b.is_nan()));
    }
    assert_eq!(
        slope_deg.get(10, 10).unwrap(),
        slope(&filled, SlopeParams::default()).unwrap().get(10, 10).unwrap()
    );
    assert_eq!(Slope.name(), "Slope");
    assert!(!FillSinks.description().is_empty());
}

#[test]
fn cover_chain_through_geotiff() {
    let dir = tempfile::tempdir().unwrap();
    let scenes: Vec<(Raster<f64>, Raster<f64>)> = [0.30, 0.50, 0.40]
        .iter()
        .map(|&nir| {
            let mut n = Raster::filled(10, 10, nir);
            let mut r = Raster::filled(10, 10, 0.1);
            n.set_transform(GeoTransform::new(-5.94, 35.84, 0.01, -0.01));
            r.set_transform(GeoTransform::new(-5.94, 35.84, 0.01, -0.01));
            (n, r)
        })
        .collect();

    let mut nir = Vec::new();
    let mut red = Vec::new();
    for (i, (n, r)) in scenes.iter().enumerate() {
        let np = dir.path().join(format!("b8_{i}.tif"));
        let rp = dir.path().join(format!("b4_{i}.tif"));
        write_geotiff(n, &np, None).unwrap();
        write_geotiff(r, &rp, None).unwrap();
        nir.push(read_geotiff::<f64, _>(&np).unwrap());
        red.push(read_geotiff::<f64, _>(&rp).unwrap());
    }

    let index = ndvi(&median_composite(&nir).unwrap(), &median_composite(&red).unwrap()).unwrap();
    let v = index.get(5, 5).unwrap();
    assert!((v - 0.3 / 0.5).abs() < 1e-6, "ndvi {}", v);

    let c = c_factor(&index, &CoverEquation::default()).unwrap();
    assert!((c.get(5, 5).unwrap() - (-2.0 * v).exp()).abs() < 1e-9);

    let set = random_sample(&[("C_Factor", &c)], SampleParams { num_pixels: 25, seed: 0 }).unwrap();
    assert_eq!(set.len(), 25);
    assert!(set.samples.iter().all(|s| Region::tangier().contains(s.x, s.y)));
}

#[test]
fn rainfall_points_to_surface() {
    let region = Region::tangier_rainfall();
    let points = point_grid(&region, 0.02).unwrap();

    // 0.05 degree precipitation grid, rain over the two western columns
    let t0 = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let mut hours = Vec::new();
    for h in 0..48 {
        let mut r = Raster::filled(5, 6, 0.0);
        r.set_transform(GeoTransform::new(-5.95, 35.9, 0.05, -0.05));
        if (10..13).contains(&h) {
            for row in 0..5 {
                r.set(row, 0, 0.008).unwrap();
                r.set(row, 1, 0.008).unwrap();
            }
        }
        hours.push((t0 + Duration::hours(h), r));
    }

    let mut series_by_point = vec![(Vec::new(), Vec::new()); points.len()];
    for (t, raster) in &hours {
        let set = sample_at_points(&[("total_precipitation_hourly", raster)], &points).unwrap();
        assert_eq!(set.len(), points.len());
        for (slot, sample) in series_by_point.iter_mut().zip(&set.samples) {
            slot.0.push(*t);
            slot.1.push(sample.values[0]);
        }
    }

    let params = RainfallParams::default();
    let r_points: Vec<SamplePoint> = points
        .iter()
        .zip(series_by_point)
        .map(|(&(x, y), (ts, depths))| {
            let series = HourlySeries::from_metres(ts, &depths).unwrap();
            SamplePoint::new(x, y, r_factor(&series, &params))
        })
        .collect();

    let west = r_points.iter().find(|p| (p.x + 5.9).abs() < 1e-9).unwrap();
    let east = r_points.iter().find(|p| (p.x + 5.7).abs() < 1e-9).unwrap();
    assert!(west.value > 0.0);
    assert_eq!(east.value, 0.0);

    let surface = idw(&r_points, IdwParams::over_region(&region, 0.01).unwrap()).unwrap();
    let (min, max) = surface.min_max().unwrap();
    assert!(min >= 0.0 && max <= west.value + 1e-9);
}

#[test]
fn soil_loss_of_constant_factors() {
    let lulc = Raster::filled(3, 3, 40.0);
    let p = p_factor(&lulc, &SupportTable::default()).unwrap();
    let r = Raster::filled(3, 3, 300.0);
    let k = Raster::filled(3, 3, 0.02);
    let ls = Raster::filled(3, 3, 2.0);
    let c = Raster::filled(3, 3, 0.5);
    let a = soil_loss(&r, &k, &ls, &c, &p).unwrap();
    assert!((a.get(2, 2).unwrap() - 300.0 * 0.02 * 2.0 * 0.5 * 0.1).abs() < 1e-12);
}
