use crate::core::projection;
use crate::domain::model::{GeoBounds, Location, ProjectedBounds, RenderPolicy, RenderRegion, Tag};
use crate::utils::error::{GeoDeckError, Result};
use crate::utils::validation::{validate_positive, validate_range, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEGREE_PADDING: f64 = 5.0;
pub const DEFAULT_METRIC_PADDING_RATIO: f64 = 0.2;
pub const DEFAULT_METRIC_PADDING_MIN: f64 = 100_000.0;
pub const DEFAULT_METRIC_PADDING_MAX: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsSettings {
    /// Degrees added on every side under the degree policy.
    pub degree_padding: f64,
    /// Fraction of each projected span used as padding under the metric policy.
    pub metric_padding_ratio: f64,
    pub metric_padding_min: f64,
    pub metric_padding_max: f64,
}

impl Default for BoundsSettings {
    fn default() -> Self {
        Self {
            degree_padding: DEFAULT_DEGREE_PADDING,
            metric_padding_ratio: DEFAULT_METRIC_PADDING_RATIO,
            metric_padding_min: DEFAULT_METRIC_PADDING_MIN,
            metric_padding_max: DEFAULT_METRIC_PADDING_MAX,
        }
    }
}

impl Validate for BoundsSettings {
    fn validate(&self) -> Result<()> {
        validate_positive("bounds.degree_padding", self.degree_padding)?;
        validate_range("bounds.degree_padding", self.degree_padding, 0.0, 90.0)?;
        validate_range(
            "bounds.metric_padding_ratio",
            self.metric_padding_ratio,
            0.0,
            10.0,
        )?;
        validate_positive("bounds.metric_padding_min", self.metric_padding_min)?;
        validate_positive("bounds.metric_padding_max", self.metric_padding_max)?;
        validate_range(
            "bounds.metric_padding_max",
            self.metric_padding_max,
            self.metric_padding_min,
            f64::MAX,
        )
    }
}

/// Derives the padded frame for a tag under the run's policy.
#[derive(Debug, Clone, Copy)]
pub struct BoundsCalculator {
    policy: RenderPolicy,
    settings: BoundsSettings,
}

impl BoundsCalculator {
    /// Rejects settings that cannot frame a region.
    pub fn new(policy: RenderPolicy, settings: BoundsSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { policy, settings })
    }

    pub fn policy(&self) -> RenderPolicy {
        self.policy
    }

    pub fn region_for(&self, tag: &Tag) -> Result<RenderRegion> {
        let region = match self.policy {
            RenderPolicy::DegreePadding => {
                degree_region(&tag.locations, self.settings.degree_padding)
                    .map(RenderRegion::Geographic)
            }
            RenderPolicy::MetricPadding => {
                metric_region(&tag.locations, &self.settings).map(RenderRegion::Projected)
            }
        };

        region.ok_or_else(|| GeoDeckError::EmptyTag {
            tag: tag.name.clone(),
        })
    }
}

/// Min/max of the locations grown by `padding` degrees, latitude clamped to [-90, 90].
pub fn degree_region(locations: &[Location], padding: f64) -> Option<GeoBounds> {
    let first = locations.first()?;
    let mut bounds = GeoBounds {
        min_lat: first.latitude,
        max_lat: first.latitude,
        min_lng: first.longitude,
        max_lng: first.longitude,
    };
    for loc in &locations[1..] {
        bounds.min_lat = bounds.min_lat.min(loc.latitude);
        bounds.max_lat = bounds.max_lat.max(loc.latitude);
        bounds.min_lng = bounds.min_lng.min(loc.longitude);
        bounds.max_lng = bounds.max_lng.max(loc.longitude);
    }

    // 經度不做截斷
    Some(GeoBounds {
        min_lat: (bounds.min_lat - padding).clamp(-90.0, 90.0),
        max_lat: (bounds.max_lat + padding).clamp(-90.0, 90.0),
        min_lng: bounds.min_lng - padding,
        max_lng: bounds.max_lng + padding,
    })
}

/// Bounding box in Web Mercator metres, grown per axis by a clamped share of its span.
pub fn metric_region(locations: &[Location], settings: &BoundsSettings) -> Option<ProjectedBounds> {
    let mut points = locations.iter().map(projection::project);
    let (x0, y0) = points.next()?;
    let mut bounds = ProjectedBounds {
        min_x: x0,
        max_x: x0,
        min_y: y0,
        max_y: y0,
    };
    for (x, y) in points {
        bounds.min_x = bounds.min_x.min(x);
        bounds.max_x = bounds.max_x.max(x);
        bounds.min_y = bounds.min_y.min(y);
        bounds.max_y = bounds.max_y.max(y);
    }

    let pad_x = metric_padding(bounds.width(), settings);
    let pad_y = metric_padding(bounds.height(), settings);

    Some(ProjectedBounds {
        min_x: bounds.min_x - pad_x,
        max_x: bounds.max_x + pad_x,
        min_y: bounds.min_y - pad_y,
        max_y: bounds.max_y + pad_y,
    })
}

/// A zero span still gets the configured floor. The ceiling wins if the limits are inverted.
pub fn metric_padding(span: f64, settings: &BoundsSettings) -> f64 {
    (span * settings.metric_padding_ratio)
        .max(settings.metric_padding_min)
        .min(settings.metric_padding_max)
}
