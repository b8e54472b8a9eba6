//! British National Grid (EPSG:27700).
//!
//! The national grid is a transverse Mercator projection of the OSGB36
//! datum, which sits on the Airy 1830 ellipsoid. Converting from WGS84
//! therefore takes two steps:
//!
//! 1. a seven-parameter Helmert datum shift between WGS84 and OSGB36,
//!    applied to earth-centred cartesian coordinates
//! 2. the transverse Mercator series from the Ordnance Survey
//!    "Guide to coordinate systems in Great Britain"
//!
//! The Helmert shift is good to a few metres across Great Britain, well
//! inside the 1 km cell size of the gridded climate data.

use std::f64::consts::PI;

use crate::transform::ReprojectionError;

/// Reference ellipsoid defined by its semi-axes in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis
    pub a: f64,
    /// Semi-minor axis
    pub b: f64,
}

impl Ellipsoid {
    pub const AIRY_1830: Ellipsoid = Ellipsoid {
        a: 6_377_563.396,
        b: 6_356_256.909,
    };

    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        b: 6_356_752.314_245,
    };

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }

    /// Geodetic latitude/longitude (radians) and height to cartesian ECEF.
    pub fn to_cartesian(&self, lat: f64, lon: f64, h: f64) -> [f64; 3] {
        let e2 = self.e2();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        [
            (nu + h) * cos_lat * lon.cos(),
            (nu + h) * cos_lat * lon.sin(),
            ((1.0 - e2) * nu + h) * sin_lat,
        ]
    }

    /// Cartesian ECEF to geodetic `(lat, lon, h)` in radians and metres.
    pub fn to_geodetic(&self, xyz: [f64; 3]) -> (f64, f64, f64) {
        let [x, y, z] = xyz;
        let e2 = self.e2();
        let p = (x * x + y * y).sqrt();
        let lon = y.atan2(x);

        let mut lat = z.atan2(p * (1.0 - e2));
        let mut nu = self.a;
        for _ in 0..16 {
            let sin_lat = lat.sin();
            nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (z + e2 * nu * sin_lat).atan2(p);
            let done = (next - lat).abs() < 1e-14;
            lat = next;
            if done {
                break;
            }
        }

        let h = p / lat.cos() - nu;
        (lat, lon, h)
    }
}

/// Seven-parameter Helmert transformation between cartesian datums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    /// Translations in metres
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    /// Scale in parts per million
    pub s_ppm: f64,
    /// Rotations in arc-seconds
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Helmert {
    /// WGS84 to OSGB36, as published by the Ordnance Survey.
    pub const WGS84_TO_OSGB36: Helmert = Helmert {
        tx: -446.448,
        ty: 125.157,
        tz: -542.060,
        s_ppm: 20.4894,
        rx: -0.1502,
        ry: -0.2470,
        rz: -0.8421,
    };

    /// The reverse shift. Negating the parameters is the standard small-angle
    /// approximation and agrees with a true inverse to a few centimetres.
    pub fn inverse(&self) -> Helmert {
        Helmert {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            s_ppm: -self.s_ppm,
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
        }
    }

    pub fn apply(&self, xyz: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = xyz;
        let arcsec = PI / (180.0 * 3600.0);
        let s1 = 1.0 + self.s_ppm * 1e-6;
        let (rx, ry, rz) = (self.rx * arcsec, self.ry * arcsec, self.rz * arcsec);

        [
            self.tx + s1 * x - rz * y + ry * z,
            self.ty + rz * x + s1 * y - rx * z,
            self.tz - ry * x + rx * y + s1 * z,
        ]
    }
}

/// Transverse Mercator projection on an arbitrary ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Scale factor on the central meridian
    pub f0: f64,
    /// True origin latitude in radians
    pub lat0: f64,
    /// Central meridian in radians
    pub lon0: f64,
    /// False easting in metres
    pub e0: f64,
    /// False northing in metres
    pub n0: f64,
}

impl TransverseMercator {
    /// National Grid parameters on Airy 1830.
    pub fn national_grid() -> Self {
        Self {
            ellipsoid: Ellipsoid::AIRY_1830,
            f0: 0.999_601_271_7,
            lat0: 49.0_f64.to_radians(),
            lon0: (-2.0_f64).to_radians(),
            e0: 400_000.0,
            n0: -100_000.0,
        }
    }

    fn n(&self) -> f64 {
        let Ellipsoid { a, b } = self.ellipsoid;
        (a - b) / (a + b)
    }

    /// Developed meridional arc from the origin latitude to `lat`.
    fn meridional_arc(&self, lat: f64) -> f64 {
        let n = self.n();
        let (n2, n3) = (n * n, n * n * n);
        let dlat = lat - self.lat0;
        let slat = lat + self.lat0;

        self.ellipsoid.b
            * self.f0
            * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dlat
                - (3.0 * n + 3.0 * n2 + 2.625 * n3) * dlat.sin() * slat.cos()
                + (1.875 * n2 + 1.875 * n3) * (2.0 * dlat).sin() * (2.0 * slat).cos()
                - (35.0 / 24.0) * n3 * (3.0 * dlat).sin() * (3.0 * slat).cos())
    }

    /// Radii of curvature `(nu, rho, eta2)` at latitude `lat`.
    fn curvature(&self, lat: f64) -> (f64, f64, f64) {
        let e2 = self.ellipsoid.e2();
        let af0 = self.ellipsoid.a * self.f0;
        let sin2 = lat.sin().powi(2);
        let nu = af0 / (1.0 - e2 * sin2).sqrt();
        let rho = af0 * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
        (nu, rho, nu / rho - 1.0)
    }

    /// Project geodetic latitude/longitude (radians) to easting/northing.
    pub fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (nu, rho, eta2) = self.curvature(lat);
        let m = self.meridional_arc(lat);

        let (sin_lat, cos_lat) = lat.sin_cos();
        let cos3 = cos_lat.powi(3);
        let cos5 = cos_lat.powi(5);
        let tan2 = lat.tan().powi(2);
        let tan4 = tan2 * tan2;

        let i = m + self.n0;
        let ii = nu / 2.0 * sin_lat * cos_lat;
        let iii = nu / 24.0 * sin_lat * cos3 * (5.0 - tan2 + 9.0 * eta2);
        let iiia = nu / 720.0 * sin_lat * cos5 * (61.0 - 58.0 * tan2 + tan4);
        let iv = nu * cos_lat;
        let v = nu / 6.0 * cos3 * (nu / rho - tan2);
        let vi = nu / 120.0
            * cos5
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let dl = lon - self.lon0;
        let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
        let easting = self.e0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
        (easting, northing)
    }

    /// Invert easting/northing to geodetic latitude/longitude in radians.
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64), ReprojectionError> {
        let af0 = self.ellipsoid.a * self.f0;

        let mut lat = (northing - self.n0) / af0 + self.lat0;
        let mut m = self.meridional_arc(lat);
        let mut iterations = 0;
        while (northing - self.n0 - m).abs() >= 1e-5 {
            lat += (northing - self.n0 - m) / af0;
            m = self.meridional_arc(lat);
            iterations += 1;
            if iterations > 100 || !lat.is_finite() {
                return Err(ReprojectionError::NonConvergence {
                    x: easting,
                    y: northing,
                });
            }
        }

        let (nu, rho, eta2) = self.curvature(lat);
        let tan = lat.tan();
        let (tan2, tan4) = (tan * tan, tan.powi(4));
        let tan6 = tan4 * tan2;
        let sec = 1.0 / lat.cos();

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
        let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
        let x = sec / nu;
        let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
        let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
        let xiia = sec / (5040.0 * nu.powi(7))
            * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

        let de = easting - self.e0;
        let out_lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let out_lon =
            self.lon0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);
        Ok((out_lat, out_lon))
    }
}

/// WGS84 <-> British National Grid conversion.
#[derive(Debug, Clone, Copy)]
pub struct BritishNationalGrid {
    tm: TransverseMercator,
    to_osgb36: Helmert,
    to_wgs84: Helmert,
}

impl Default for BritishNationalGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl BritishNationalGrid {
    pub fn new() -> Self {
        Self {
            tm: TransverseMercator::national_grid(),
            to_osgb36: Helmert::WGS84_TO_OSGB36,
            to_wgs84: Helmert::WGS84_TO_OSGB36.inverse(),
        }
    }

    /// WGS84 `(lon, lat)` in degrees to BNG `(easting, northing)` in metres.
    pub fn from_wgs84(&self, lon: f64, lat: f64) -> Result<(f64, f64), ReprojectionError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(ReprojectionError::NonFinite { x: lon, y: lat });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ReprojectionError::OutOfDomain {
                x: lon,
                y: lat,
                reason: "latitude outside [-90, 90]".to_string(),
            });
        }

        let xyz = Ellipsoid::WGS84.to_cartesian(lat.to_radians(), lon.to_radians(), 0.0);
        let shifted = self.to_osgb36.apply(xyz);
        let (lat_airy, lon_airy, _) = Ellipsoid::AIRY_1830.to_geodetic(shifted);

        let (e, n) = self.tm.forward(lat_airy, lon_airy);
        finite_pair(e, n, lon, lat)
    }

    /// BNG `(easting, northing)` in metres to WGS84 `(lon, lat)` in degrees.
    pub fn to_wgs84(&self, easting: f64, northing: f64) -> Result<(f64, f64), ReprojectionError> {
        if !easting.is_finite() || !northing.is_finite() {
            return Err(ReprojectionError::NonFinite {
                x: easting,
                y: northing,
            });
        }

        let (lat_airy, lon_airy) = self.tm.inverse(easting, northing)?;
        let xyz = Ellipsoid::AIRY_1830.to_cartesian(lat_airy, lon_airy, 0.0);
        let shifted = self.to_wgs84.apply(xyz);
        let (lat, lon, _) = Ellipsoid::WGS84.to_geodetic(shifted);

        finite_pair(lon.to_degrees(), lat.to_degrees(), easting, northing)
    }
}

fn finite_pair(a: f64, b: f64, x: f64, y: f64) -> Result<(f64, f64), ReprojectionError> {
    if a.is_finite() && b.is_finite() {
        Ok((a, b))
    } else {
        Err(ReprojectionError::OutOfDomain {
            x,
            y,
            reason: "transform produced non-finite output".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dms(deg: f64, min: f64, sec: f64) -> f64 {
        deg + min / 60.0 + sec / 3600.0
    }

    #[test]
    fn test_ordnance_survey_worked_example_forward() {
        // Airy 1830 coordinates of the worked example in the OS guide.
        let tm = TransverseMercator::national_grid();
        let lat = dms(52.0, 39.0, 27.2531).to_radians();
        let lon = dms(1.0, 43.0, 4.5177).to_radians();

        let (e, n) = tm.forward(lat, lon);
        assert!((e - 651_409.903).abs() < 0.01, "easting {}", e);
        assert!((n - 313_177.270).abs() < 0.01, "northing {}", n);
    }

    #[test]
    fn test_ordnance_survey_worked_example_inverse() {
        let tm = TransverseMercator::national_grid();
        let (lat, lon) = tm.inverse(651_409.903, 313_177.270).unwrap();

        assert!((lat.to_degrees() - dms(52.0, 39.0, 27.2531)).abs() < 1e-6);
        assert!((lon.to_degrees() - dms(1.0, 43.0, 4.5177)).abs() < 1e-6);
    }

    #[test]
    fn test_ecef_roundtrip() {
        let e = Ellipsoid::WGS84;
        let lat = 53.5_f64.to_radians();
        let lon = (-1.25_f64).to_radians();
        let (lat2, lon2, h) = e.to_geodetic(e.to_cartesian(lat, lon, 120.0));
        assert!((lat - lat2).abs() < 1e-12);
        assert!((lon - lon2).abs() < 1e-12);
        assert!((h - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_helmert_inverse_undoes_shift() {
        let xyz = Ellipsoid::WGS84.to_cartesian(0.9, -0.03, 0.0);
        let shifted = Helmert::WGS84_TO_OSGB36.apply(xyz);
        let back = Helmert::WGS84_TO_OSGB36.inverse().apply(shifted);
        for k in 0..3 {
            assert!((xyz[k] - back[k]).abs() < 0.05, "axis {} off by {}", k, xyz[k] - back[k]);
        }
    }

    #[test]
    fn test_false_origin_location() {
        // BNG (0, 0) lies in the sea south-west of the Isles of Scilly.
        let bng = BritishNationalGrid::new();
        let (lon, lat) = bng.to_wgs84(0.0, 0.0).unwrap();
        assert!((lat - 49.7668).abs() < 0.01, "lat {}", lat);
        assert!((lon - -7.5572).abs() < 0.01, "lon {}", lon);
    }

    #[test]
    fn test_wgs84_roundtrip() {
        let bng = BritishNationalGrid::new();
        for &(lon, lat) in &[(-1.18, 51.39), (-4.25, 55.86), (1.3, 52.63), (-6.3, 58.2)] {
            let (e, n) = bng.from_wgs84(lon, lat).unwrap();
            let (lon2, lat2) = bng.to_wgs84(e, n).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon {} -> {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat {} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        let bng = BritishNationalGrid::new();
        assert!(bng.from_wgs84(f64::NAN, 51.0).is_err());
        assert!(bng.from_wgs84(0.0, 91.0).is_err());
        assert!(bng.to_wgs84(f64::INFINITY, 0.0).is_err());
    }
}
