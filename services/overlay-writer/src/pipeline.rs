//! Batch orchestration.
//!
//! ```text
//! RasterSource ─► YearStack ─► RasterFrame ─► SparseGrid ─► tiles/<var>/<YYYY>_<MM>.json.gz
//!                                   │                             │
//!                                   └──────────► CellLookup ◄─────┘
//!                                                    │
//!                          Resampler (geographic-linear, row 0 north)
//!                                                    │
//!                          classifier ─► OutputImage ─► images/<layer>/<YYYY>_<MM>.png
//! ```
//!
//! A batch never stops for a single period: missing sources are skipped and
//! other failures recorded, both with their `layer/YYYY-MM` key. Only
//! configuration errors, raised before any I/O, abort it. Each descriptor
//! is written once, after the last period.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use climate_common::{ClimateError, ClimateResult, CrsCode, GeoBounds, Period, Variable};
use grid_processor::{CellLookup, MonthlyAccumulator, RasterFrame, Resampler, SparseGrid};
use netcdf_parser::{RasterSource, YearStack};
use projection::Reprojector;
use renderer::legend::{bivariate_square, sequential_bar};
use renderer::{BivariateClassifier, BivariatePalette, Color, OutputImage, SequentialClassifier};

use crate::config::{OverlayConfig, ScaleMode};
use crate::metadata::{OverlayMetadata, ReferenceStats, ReferenceTracker};
use crate::report::{BatchReport, Layer, PeriodKey};
use crate::tile_store::{ImageStore, TileStore};

/// Where a projected point lands on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub lat: f64,
    pub lng: f64,
    /// `(row, col)` of the nearest pixel, `None` outside the overlay.
    pub pixel: Option<(usize, usize)>,
}

/// Per-month running means of each variable.
struct Averages {
    temp: MonthlyAccumulator,
    rain: MonthlyAccumulator,
    sun: MonthlyAccumulator,
}

impl Averages {
    fn add(&mut self, variable: Variable, month: u8, frame: &RasterFrame) -> ClimateResult<()> {
        let acc = match variable {
            Variable::Temperature => &mut self.temp,
            Variable::Rainfall => &mut self.rain,
            Variable::Sunshine => &mut self.sun,
        };
        acc.add(month, frame)?;
        Ok(())
    }
}

pub struct OverlayWriter {
    config: OverlayConfig,
    bounds: GeoBounds,
    resampler: Resampler,
    temp_colors: Vec<Color>,
    rain_sun_palette: BivariatePalette,
    tiles: TileStore,
    images: ImageStore,
}

impl OverlayWriter {
    /// Validate the configuration and fix the overlay geometry.
    pub fn new(config: OverlayConfig) -> ClimateResult<Self> {
        config.validate()?;
        let bounds = config.overlay_bounds()?;
        let resampler = Resampler::new(
            bounds,
            config.overlay.width,
            config.overlay.height,
            config.extent.crs,
        )?;

        info!(
            bounds = ?bounds.to_corners(),
            width = config.overlay.width,
            height = config.overlay.height,
            grid_width = config.extent.width(),
            grid_height = config.extent.height(),
            "Overlay geometry"
        );

        Ok(Self {
            temp_colors: config.temperature_colors()?,
            rain_sun_palette: config.bivariate_palette()?,
            tiles: TileStore::new(&config.paths.tiles_dir),
            images: ImageStore::new(&config.paths.images_dir),
            config,
            bounds,
            resampler,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn resampler(&self) -> &Resampler {
        &self.resampler
    }

    pub fn tiles(&self) -> &TileStore {
        &self.tiles
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Geographic position and overlay pixel of a projected point.
    pub fn locate(&self, x: f64, y: f64) -> ClimateResult<Location> {
        let (lng, lat) =
            Reprojector::new(self.config.extent.crs, CrsCode::Epsg4326).transform_xy(x, y)?;
        Ok(Location {
            x,
            y,
            lat,
            lng,
            pixel: self.resampler.geo_to_pixel(lat, lng),
        })
    }

    /// Source frames to sparse tiles, then `metadata.json`.
    pub fn extract(&self, source: &dyn RasterSource) -> ClimateResult<BatchReport> {
        let mut report = BatchReport::default();
        let mut reference = self.reference_tracker();

        for &year in &self.config.years {
            for variable in Variable::ALL {
                let Some(stack) = self.load_year(source, variable, year, &mut report) else {
                    continue;
                };
                for &month in &self.config.months {
                    let period = Period { year, month };
                    let result = self
                        .ingest_frame(&stack, period, &mut reference, None)
                        .map(|_| ());
                    self.settle(&mut report, PeriodKey::new(variable, period), result);
                }
            }
        }

        self.write_tile_metadata(reference)?;
        log_summary("extract", &report);
        Ok(report)
    }

    /// Sparse tiles to overlay images, then legends, averages and `bounds.json`.
    pub fn render(&self) -> ClimateResult<BatchReport> {
        let mut report = BatchReport::default();
        let mut averages = self.averages();
        let extent = self.config.extent;

        for period in self.periods() {
            let key = PeriodKey::new(Layer::Temp, period);
            match self.tiles.read(Variable::Temperature, period, extent) {
                Ok(grid) => {
                    let result = self.write_temperature(period, &grid).and_then(|_| {
                        add_average(&mut averages, Variable::Temperature, period, &grid)
                    });
                    self.settle(&mut report, key, result);
                }
                Err(e) => self.record_error(&mut report, key, &e),
            }

            let key = PeriodKey::new(Layer::RainSun, period);
            let rain = self.tiles.read(Variable::Rainfall, period, extent);
            let sun = self.tiles.read(Variable::Sunshine, period, extent);
            match (rain, sun) {
                (Ok(rain), Ok(sun)) => {
                    let result = self
                        .write_rain_sun(period, &rain, &sun)
                        .and_then(|_| add_average(&mut averages, Variable::Rainfall, period, &rain))
                        .and_then(|_| add_average(&mut averages, Variable::Sunshine, period, &sun));
                    self.settle(&mut report, key, result);
                }
                (Err(e), _) | (_, Err(e)) => self.record_error(&mut report, key, &e),
            }
        }

        // reference statistics come from the extract pass, when there was one
        let metadata_path = self.tiles.metadata_path();
        let reference = match OverlayMetadata::read(&metadata_path) {
            Ok(m) => m.reference_point,
            Err(e) => {
                warn!(
                    path = %metadata_path.display(),
                    error = %e,
                    "Tile metadata unreadable; bounds descriptor will carry no reference point"
                );
                None
            }
        };
        self.finish_images(averages, reference)?;
        log_summary("render", &report);
        Ok(report)
    }

    /// Extract and render in one pass, straight from the source frames.
    pub fn run(&self, source: &dyn RasterSource) -> ClimateResult<BatchReport> {
        let mut report = BatchReport::default();
        let mut reference = self.reference_tracker();
        let mut averages = self.averages();

        for &year in &self.config.years {
            let [temp, rain, sun] =
                Variable::ALL.map(|v| self.load_year(source, v, year, &mut report));

            for &month in &self.config.months {
                let period = Period { year, month };

                if let Some(stack) = &temp {
                    let key = PeriodKey::new(Layer::Temp, period);
                    let result = self
                        .ingest_frame(stack, period, &mut reference, averages.as_mut())
                        .and_then(|frame| self.write_temperature(period, &frame));
                    self.settle(&mut report, key, result.map(|_| ()));
                }

                let mut ingest = |stack: &Option<YearStack>, report: &mut BatchReport| {
                    let stack = stack.as_ref()?;
                    let key = PeriodKey::new(stack.variable, period);
                    match self.ingest_frame(stack, period, &mut reference, averages.as_mut()) {
                        Ok(frame) => {
                            self.settle(report, key, Ok(()));
                            Some(frame)
                        }
                        Err(e) => {
                            self.record_error(report, key, &e);
                            None
                        }
                    }
                };
                let rain_frame = ingest(&rain, &mut report);
                let sun_frame = ingest(&sun, &mut report);

                let key = PeriodKey::new(Layer::RainSun, period);
                match (rain_frame, sun_frame) {
                    (Some(rain), Some(sun)) => {
                        let result = self.write_rain_sun(period, &rain, &sun).map(|_| ());
                        self.settle(&mut report, key, result);
                    }
                    _ => {
                        warn!(layer = %key.layer, year, month, "Skipping: needs both rainfall and sunshine");
                        report.skip(key, "needs both rainfall and sunshine");
                    }
                }
            }
        }

        let stats = reference.as_ref().map(|t| t.stats());
        self.write_tile_metadata(reference)?;
        self.finish_images(averages, stats)?;
        log_summary("run", &report);
        Ok(report)
    }

    /// Overlay image for one temperature frame, classified per the
    /// configured scale mode.
    pub fn render_temperature(&self, lookup: &dyn CellLookup) -> ClimateResult<OutputImage> {
        self.render_sequential(lookup, self.config.temperature.mode)
    }

    /// Bivariate overlay image. Tertile breakpoints come from each frame's
    /// own valid values.
    pub fn render_rain_sun(
        &self,
        rain: &dyn CellLookup,
        sun: &dyn CellLookup,
    ) -> ClimateResult<OutputImage> {
        let classifier = BivariateClassifier::from_values(
            &rain.valid_values(),
            &sun.valid_values(),
            self.rain_sun_palette,
        );
        let rain_px = self.resampler.resample(rain);
        let sun_px = self.resampler.resample(sun);
        Ok(OutputImage::from_value_pair(
            &rain_px.values,
            &sun_px.values,
            rain_px.width,
            rain_px.height,
            &classifier,
        )?)
    }

    fn render_sequential(&self, lookup: &dyn CellLookup, mode: ScaleMode) -> ClimateResult<OutputImage> {
        let colors = self.temp_colors.clone();
        let classifier = match mode {
            ScaleMode::Linear => SequentialClassifier::linear(
                self.config.temperature.min,
                self.config.temperature.max,
                colors,
            )?,
            ScaleMode::Decile => SequentialClassifier::decile(&lookup.valid_values(), colors)?,
        };
        let pixels = self.resampler.resample(lookup);
        Ok(OutputImage::from_values(
            &pixels.values,
            pixels.width,
            pixels.height,
            &classifier,
        )?)
    }

    fn write_temperature(&self, period: Period, lookup: &dyn CellLookup) -> ClimateResult<PathBuf> {
        let image = self.render_temperature(lookup)?;
        let path = self.images.image_path(Layer::Temp, period);
        self.write_image(&image, &path, Layer::Temp, period)?;
        Ok(path)
    }

    fn write_rain_sun(
        &self,
        period: Period,
        rain: &dyn CellLookup,
        sun: &dyn CellLookup,
    ) -> ClimateResult<PathBuf> {
        let image = self.render_rain_sun(rain, sun)?;
        let path = self.images.image_path(Layer::RainSun, period);
        self.write_image(&image, &path, Layer::RainSun, period)?;
        Ok(path)
    }

    fn write_image(
        &self,
        image: &OutputImage,
        path: &Path,
        layer: Layer,
        period: Period,
    ) -> ClimateResult<()> {
        if image.opaque_count() == 0 {
            warn!(
                layer = %layer,
                year = period.year,
                month = period.month,
                "Frame has no valid values; overlay is fully transparent"
            );
        }
        image.write_png(path)?;
        Ok(())
    }

    /// One month of a stack as a frame, written out as a sparse tile.
    fn ingest_frame(
        &self,
        stack: &YearStack,
        period: Period,
        reference: &mut Option<ReferenceTracker>,
        averages: Option<&mut Averages>,
    ) -> ClimateResult<RasterFrame> {
        let values = stack
            .frame(period.month)
            .ok_or_else(|| ClimateError::MissingSourceFile {
                variable: stack.variable.to_string(),
                year: period.year,
                detail: format!("source holds {} months, no month {}", stack.months(), period.month),
            })?;
        let frame = RasterFrame::new(stack.extent, values.to_vec())?;

        if stack.variable == Variable::Temperature {
            if let Some(tracker) = reference.as_mut() {
                tracker.record(&frame);
            }
        }
        if let Some(acc) = averages {
            acc.add(stack.variable, period.month, &frame)?;
        }

        let grid = SparseGrid::from_frame(&frame);
        self.tiles.write(stack.variable, period, &grid)?;
        Ok(frame)
    }

    /// Load one year, recording every configured month as skipped or failed
    /// when it cannot be loaded.
    fn load_year(
        &self,
        source: &dyn RasterSource,
        variable: Variable,
        year: i32,
        report: &mut BatchReport,
    ) -> Option<YearStack> {
        let result = source
            .load_year(variable, year)
            .map_err(ClimateError::from)
            .and_then(|stack| {
                if same_extent(&stack, &self.config) {
                    Ok(stack)
                } else {
                    Err(ClimateError::InvalidSource(format!(
                        "{} {} grid {:?} does not match the configured extent",
                        variable, year, stack.extent
                    )))
                }
            });

        match result {
            Ok(stack) => {
                info!(variable = %variable, year, months = stack.months(), "Loaded source year");
                Some(stack)
            }
            Err(e) => {
                for &month in &self.config.months {
                    let key = PeriodKey::new(variable, Period { year, month });
                    self.record_error(report, key, &e);
                }
                None
            }
        }
    }

    fn settle(&self, report: &mut BatchReport, key: PeriodKey, result: ClimateResult<()>) {
        match result {
            Ok(()) => {
                info!(layer = %key.layer, year = key.year, month = key.month, "Produced");
                report.add_produced(key);
            }
            Err(e) => self.record_error(report, key, &e),
        }
    }

    fn record_error(&self, report: &mut BatchReport, key: PeriodKey, err: &ClimateError) {
        match err {
            ClimateError::MissingSourceFile { .. } => {
                warn!(layer = %key.layer, year = key.year, month = key.month, error = %err, "Skipping period");
                report.skip(key, err.to_string());
            }
            _ => {
                error!(
                    layer = %key.layer,
                    year = key.year,
                    month = key.month,
                    kind = err.kind(),
                    error = %err,
                    "Period failed"
                );
                report.fail(key, err.to_string());
            }
        }
    }

    fn periods(&self) -> Vec<Period> {
        self.config
            .years
            .iter()
            .flat_map(|&year| self.config.months.iter().map(move |&month| Period { year, month }))
            .collect()
    }

    fn reference_tracker(&self) -> Option<ReferenceTracker> {
        self.config.reference_point.clone().map(ReferenceTracker::new)
    }

    fn averages(&self) -> Option<Averages> {
        self.config.averages.enabled.then(|| Averages {
            temp: MonthlyAccumulator::new(self.config.extent),
            rain: MonthlyAccumulator::new(self.config.extent),
            sun: MonthlyAccumulator::new(self.config.extent),
        })
    }

    fn write_tile_metadata(&self, reference: Option<ReferenceTracker>) -> ClimateResult<()> {
        let stats = reference.map(|t| t.stats());
        if let Some(s) = &stats {
            info!(
                point = %s.name,
                samples = s.samples,
                min = ?s.observed_min,
                max = ?s.observed_max,
                mean = ?s.mean,
                "Reference point"
            );
        }
        OverlayMetadata::new(&self.config, self.bounds, stats).write(&self.tiles.metadata_path())
    }

    /// Legends, multi-year averages and the viewer's bounds descriptor.
    fn finish_images(
        &self,
        averages: Option<Averages>,
        reference: Option<ReferenceStats>,
    ) -> ClimateResult<()> {
        if self.config.legend.enabled {
            let legend = &self.config.legend;
            sequential_bar(&self.temp_colors, legend.bar_width, legend.bar_height)?
                .write_png(&self.images.legend_path(Layer::Temp))?;
            bivariate_square(&self.rain_sun_palette, legend.cell_size)?
                .write_png(&self.images.legend_path(Layer::RainSun))?;
            info!(dir = %self.images.root().join("legend").display(), "Wrote legends");
        }

        if let Some(averages) = averages {
            self.write_averages(averages);
        }

        OverlayMetadata::new(&self.config, self.bounds, reference).write(&self.images.bounds_path())
    }

    fn write_averages(&self, averages: Averages) {
        let temp: BTreeMap<u8, RasterFrame> = averages.temp.finish().into_iter().collect();
        let rain: BTreeMap<u8, RasterFrame> = averages.rain.finish().into_iter().collect();
        let sun: BTreeMap<u8, RasterFrame> = averages.sun.finish().into_iter().collect();

        for &month in &self.config.months {
            match temp.get(&month) {
                Some(frame) => {
                    let path = self.images.average_path(Layer::Temp, month);
                    let result = self
                        .render_sequential(frame, ScaleMode::Decile)
                        .and_then(|img| Ok(img.write_png(&path)?));
                    log_average(Layer::Temp, month, result);
                }
                None => info!(layer = "temp", month, "No data for monthly average, skipping"),
            }

            match (rain.get(&month), sun.get(&month)) {
                (Some(r), Some(s)) => {
                    let path = self.images.average_path(Layer::RainSun, month);
                    let result = self
                        .render_rain_sun(r, s)
                        .and_then(|img| Ok(img.write_png(&path)?));
                    log_average(Layer::RainSun, month, result);
                }
                _ => info!(layer = "rain_sun", month, "No data for monthly average, skipping"),
            }
        }
    }
}

fn add_average(
    averages: &mut Option<Averages>,
    variable: Variable,
    period: Period,
    grid: &SparseGrid,
) -> ClimateResult<()> {
    match averages {
        Some(acc) => acc.add(variable, period.month, &grid.to_frame()),
        None => Ok(()),
    }
}

fn same_extent(stack: &YearStack, config: &OverlayConfig) -> bool {
    let (a, b) = (&stack.extent, &config.extent);
    let tol = b.resolution * 1e-6;
    (a.x_min - b.x_min).abs() <= tol
        && (a.x_max - b.x_max).abs() <= tol
        && (a.y_min - b.y_min).abs() <= tol
        && (a.y_max - b.y_max).abs() <= tol
        && (a.resolution - b.resolution).abs() <= tol
}

fn log_average(layer: Layer, month: u8, result: ClimateResult<()>) {
    match result {
        Ok(()) => info!(layer = %layer, month, "Wrote monthly average"),
        Err(e) => error!(layer = %layer, month, error = %e, "Monthly average failed"),
    }
}

fn log_summary(stage: &str, report: &BatchReport) {
    info!(
        stage,
        produced = report.produced.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        outcome = ?report.outcome(),
        "Batch finished"
    );
}
