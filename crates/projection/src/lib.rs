//! Coordinate reference system transformations.
//!
//! Implements the British National Grid and Web Mercator projections from
//! scratch, without external geodesy dependencies. All public coordinates use
//! x/y order: `(lon, lat)` for geographic and `(easting, northing)` for
//! projected systems.

pub mod mercator;
pub mod osgb;
pub mod transform;

pub use mercator::WebMercator;
pub use osgb::{BritishNationalGrid, Ellipsoid, Helmert, TransverseMercator};
pub use transform::{Coord, ReprojectionError, Reprojector};
