use crate::geometry::Region;
use crate::types::{Polarization, SarError, SarResult, SceneMetadata};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing declared resolutions
const RESOLUTION_TOLERANCE: f64 = 1e-9;

/// Half-open date interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateRangeHelper")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct DateRangeHelper {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateRangeHelper> for DateRange {
    type Error = SarError;

    fn try_from(helper: DateRangeHelper) -> Result<Self, Self::Error> {
        DateRange::new(helper.start, helper.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> SarResult<Self> {
        if start >= end {
            return Err(SarError::Config(format!(
                "Date range start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse ISO-8601 dates (`YYYY-MM-DD`)
    pub fn parse(start: &str, end: &str) -> SarResult<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| SarError::Config(format!("Invalid date '{}': {}", s, e)))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// True when the UTC calendar date of `time` is in `[start, end)`
    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        let date = time.date_naive();
        self.start <= date && date < self.end
    }
}

/// Metadata predicate narrowing a catalog collection
#[derive(Debug, Clone)]
pub struct CollectionFilter {
    pub region: Region,
    pub date_range: DateRange,
    /// Exact transmitter/receiver polarisation list, order included
    pub polarizations: Vec<Polarization>,
    pub resolution_meters: f64,
}

impl CollectionFilter {
    pub fn matches(&self, metadata: &SceneMetadata) -> bool {
        metadata.footprint.intersects(&self.region)
            && self.date_range.contains(&metadata.acquisition_time)
            && metadata.polarizations == self.polarizations
            && (metadata.resolution_meters - self.resolution_meters).abs() <= RESOLUTION_TOLERANCE
    }
}
