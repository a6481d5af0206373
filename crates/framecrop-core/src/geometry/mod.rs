//! Geometry of one edit session: image, container and fitted display.
//!
//! # Coordinate Spaces
//!
//! - **Natural space**: pixels of the original, unscaled image. Origin is the
//!   image's top-left corner.
//! - **Display space**: the image scaled by the cover-fit factor so that it
//!   fully covers the container.
//! - **Content space**: display-space coordinates relative to the image's own
//!   center, before the live transform is applied.
//! - **Screen space**: container-local coordinates reported by the host.
//!   Origin is the container's top-left corner.

mod mapper;

pub use mapper::{to_content_point, to_screen_point, total_scale};

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A point or displacement in a 2D coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    #[inline]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

fn check_dimensions(subject: &'static str, width: f64, height: f64) -> EngineResult<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidContainerGeometry {
            subject,
            width,
            height,
        })
    }
}

/// Intrinsic pixel size of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub natural_width: f64,
    pub natural_height: f64,
}

impl ImageMetadata {
    /// Create image metadata, rejecting empty or non-finite sizes.
    pub fn new(natural_width: f64, natural_height: f64) -> EngineResult<Self> {
        check_dimensions("image", natural_width, natural_height)?;
        Ok(Self {
            natural_width,
            natural_height,
        })
    }
}

/// The on-screen area available for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGeometry {
    pub container_width: f64,
    pub container_height: f64,
}

impl ContainerGeometry {
    /// Create container geometry, rejecting empty or non-finite sizes.
    pub fn new(container_width: f64, container_height: f64) -> EngineResult<Self> {
        check_dimensions("container", container_width, container_height)?;
        Ok(Self {
            container_width,
            container_height,
        })
    }

    /// Center of the container in screen space.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.container_width * 0.5, self.container_height * 0.5)
    }

    /// Length of the container's shorter side.
    #[inline]
    pub fn shorter_side(&self) -> f64 {
        self.container_width.min(self.container_height)
    }
}

/// The image scaled by the minimal factor that covers the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedDisplay {
    pub display_width: f64,
    pub display_height: f64,
    pub fitted_scale: f64,
}

impl FittedDisplay {
    /// Cover-fit the image into the container.
    ///
    /// `fitted_scale = max(cw / nw, ch / nh)`: the scaled image fills the
    /// container on one axis and overflows it on the other.
    pub fn cover(image: &ImageMetadata, container: &ContainerGeometry) -> Self {
        let fitted_scale = (container.container_width / image.natural_width)
            .max(container.container_height / image.natural_height);
        Self {
            display_width: image.natural_width * fitted_scale,
            display_height: image.natural_height * fitted_scale,
            fitted_scale,
        }
    }
}
