use crate::core::projection;
use crate::domain::model::{GeoBounds, Location, ProjectedBounds, RenderRegion, TagColor};
use crate::domain::ports::{RenderJob, Renderer};
use crate::utils::error::{GeoDeckError, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const GRATICULE_STEPS: [f64; 11] = [0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 45.0, 90.0];
const MAX_GRATICULE_LINES: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub width: u32,
    pub height: u32,
    pub marker_radius: u32,
    pub water_color: TagColor,
    pub grid_color: TagColor,
    pub frame_color: TagColor,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            marker_radius: 3,
            water_color: TagColor::new(0x99, 0xff, 0xff),
            grid_color: TagColor::new(204, 204, 204),
            frame_color: TagColor::BLACK,
        }
    }
}

/// Raster map renderer: water background, graticule, one dot per location.
#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    style: RenderStyle,
}

impl MapRenderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    fn draw(&self, job: &RenderJob) -> std::result::Result<RgbImage, String> {
        let (width, height) = (self.style.width, self.style.height);
        let frame = Frame::new(&job.region, width, height)
            .ok_or_else(|| format!("degenerate render region {:?}", job.region))?;

        let mut image = RgbImage::from_pixel(width, height, rgb(self.style.water_color));
        self.draw_graticule(&mut image, &frame);

        let marker = rgb(job.tag.color);
        let radius = self.style.marker_radius as i32;
        for location in &job.tag.locations {
            let (x, y) = frame.to_pixel(location);
            if !(x.is_finite() && y.is_finite()) {
                return Err(format!("location {:?} cannot be projected", location));
            }
            draw_filled_circle_mut(&mut image, (x.round() as i32, y.round() as i32), radius, marker);
        }

        draw_hollow_rect_mut(
            &mut image,
            Rect::at(0, 0).of_size(width, height),
            rgb(self.style.frame_color),
        );
        Ok(image)
    }

    fn draw_graticule(&self, image: &mut RgbImage, frame: &Frame) {
        let extent = frame.geographic_extent();
        let step = graticule_step(extent.width().max(extent.height()));
        let color = rgb(self.style.grid_color);

        for lng in grid_values(extent.min_lng, extent.max_lng, step) {
            let top = frame.to_pixel(&Location::new(extent.max_lat, lng));
            let bottom = frame.to_pixel(&Location::new(extent.min_lat, lng));
            draw_line_segment_mut(image, top, bottom, color);
        }
        for lat in grid_values(extent.min_lat, extent.max_lat, step) {
            let left = frame.to_pixel(&Location::new(lat, extent.min_lng));
            let right = frame.to_pixel(&Location::new(lat, extent.max_lng));
            draw_line_segment_mut(image, left, right, color);
        }
    }
}

impl Renderer for MapRenderer {
    fn render(&self, job: &RenderJob) -> Result<PathBuf> {
        let image = self.draw(job).map_err(|message| GeoDeckError::Render {
            tag: job.tag.name.clone(),
            message,
        })?;

        image
            .save(&job.output_path)
            .map_err(|e| GeoDeckError::Render {
                tag: job.tag.name.clone(),
                message: format!("cannot save {}: {}", job.output_path.display(), e),
            })?;

        tracing::debug!("Rendered '{}' to {}", job.tag.name, job.output_path.display());
        Ok(job.output_path.clone())
    }
}

/// Maps locations into pixel space for one region.
enum Frame {
    Geographic { bounds: GeoBounds, width: f64, height: f64 },
    Projected { bounds: ProjectedBounds, width: f64, height: f64 },
}

impl Frame {
    fn new(region: &RenderRegion, width: u32, height: u32) -> Option<Self> {
        let usable = |w: f64, h: f64| w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0;
        let (width, height) = (width as f64, height as f64);
        match region {
            RenderRegion::Geographic(bounds) if usable(bounds.width(), bounds.height()) => {
                Some(Frame::Geographic {
                    bounds: *bounds,
                    width,
                    height,
                })
            }
            RenderRegion::Projected(bounds) if usable(bounds.width(), bounds.height()) => {
                Some(Frame::Projected {
                    bounds: *bounds,
                    width,
                    height,
                })
            }
            _ => None,
        }
    }

    fn to_pixel(&self, location: &Location) -> (f32, f32) {
        // 影像 y 軸向下
        match self {
            Frame::Geographic {
                bounds,
                width,
                height,
            } => {
                let x = (location.longitude - bounds.min_lng) / bounds.width() * width;
                let y = (bounds.max_lat - location.latitude) / bounds.height() * height;
                (x as f32, y as f32)
            }
            Frame::Projected {
                bounds,
                width,
                height,
            } => {
                let (px, py) = projection::project(location);
                let x = (px - bounds.min_x) / bounds.width() * width;
                let y = (bounds.max_y - py) / bounds.height() * height;
                (x as f32, y as f32)
            }
        }
    }

    fn geographic_extent(&self) -> GeoBounds {
        match self {
            Frame::Geographic { bounds, .. } => *bounds,
            Frame::Projected { bounds, .. } => projection::unproject_bounds(bounds),
        }
    }
}

fn rgb(color: TagColor) -> Rgb<u8> {
    Rgb(color.rgb())
}

fn graticule_step(span_deg: f64) -> f64 {
    GRATICULE_STEPS
        .iter()
        .copied()
        .find(|step| span_deg / step <= MAX_GRATICULE_LINES)
        .unwrap_or(90.0)
}

fn grid_values(min: f64, max: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(move |k| k as f64 * step)
}
