//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane given by a viewport.
use num::Complex;

/// The region of the complex plane being rendered.  The real part runs
/// along x, the imaginary part along y.  Row 0 of the image sits at
/// `y_min`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Real part of the left edge.
    pub x_min: f64,
    /// Imaginary part of the first row.
    pub y_min: f64,
    /// Real part of the right edge.
    pub x_max: f64,
    /// Imaginary part of the last row.
    pub y_max: f64,
}

impl Viewport {
    /// Constructor, in the same x0, y0, x1, y1 order the renderer
    /// takes its bounds.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Viewport {
        Viewport {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// The two stock views.  View 1 is the whole set; view 2 zooms in
    /// on a detailed region near the boundary, where the per-row cost
    /// is far less uniform.
    pub fn preset(view: u32) -> Option<Viewport> {
        let full = Viewport::new(-2.0, -1.0, 1.0, 1.0);
        match view {
            1 => Some(full),
            2 => Some(full.scale_and_shift(0.015, -0.986, 0.30)),
            _ => None,
        }
    }

    /// Scales every bound by `scale`, then translates by `(dx, dy)`.
    pub fn scale_and_shift(&self, scale: f64, dx: f64, dy: f64) -> Viewport {
        Viewport {
            x_min: self.x_min * scale + dx,
            y_min: self.y_min * scale + dy,
            x_max: self.x_max * scale + dx,
            y_max: self.y_max * scale + dy,
        }
    }
}

/// Size of the output image and the escape-time bound.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageSpec {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Iteration count assigned to points that never escape.
    pub max_iterations: u32,
}

impl ImageSpec {
    /// Constructor.
    pub fn new(width: usize, height: usize, max_iterations: u32) -> ImageSpec {
        ImageSpec {
            width,
            height,
            max_iterations,
        }
    }

    /// The total number of pixels.  Used to size the output buffer.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the image has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Maps pixels on the integral plane onto points of the viewport.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The viewport being mapped onto.
    pub viewport: Viewport,
    /// Width and height of the integral plane.
    pub image: ImageSpec,
    // The distance between neighbouring pixels on the complex plane,
    // along x and y respectively.
    steps: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  The step sizes are computed once here so that every
    /// worker maps a given pixel to exactly the same point.
    pub fn new(viewport: Viewport, image: ImageSpec) -> PlaneMapper {
        let steps = (
            (viewport.x_max - viewport.x_min) / (image.width as f64),
            (viewport.y_max - viewport.y_min) / (image.height as f64),
        );
        PlaneMapper {
            viewport,
            image,
            steps,
        }
    }

    /// Width of a row, in pixels.
    pub fn width(&self) -> usize {
        self.image.width
    }

    /// Given the column and row of a pixel, return the complex number
    /// it samples.
    pub fn pixel_to_point(&self, column: usize, row: usize) -> Complex<f64> {
        Complex::new(
            self.viewport.x_min + (column as f64) * self.steps.0,
            self.viewport.y_min + (row as f64) * self.steps.1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = PlaneMapper::new(
            Viewport::new(0.0, 0.0, 5.0, 5.0),
            ImageSpec::new(5, 5, 16),
        );
        assert_eq!(pm.pixel_to_point(0, 0), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(2, 2), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(4, 4), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = PlaneMapper::new(
            Viewport::new(-2.0, -2.0, 2.0, 2.0),
            ImageSpec::new(4, 4, 16),
        );
        assert_eq!(pm.pixel_to_point(2, 2), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(0, 0), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(4, 4), Complex::new(2.0, 2.0));
    }

    #[test]
    fn columns_and_rows_scale_independently() {
        let pm = PlaneMapper::new(
            Viewport::new(-2.0, -1.0, 1.0, 1.0),
            ImageSpec::new(300, 100, 16),
        );
        assert_eq!(pm.pixel_to_point(100, 50), Complex::new(-1.0, 0.0));
    }

    #[test]
    fn first_preset_is_the_whole_set() {
        assert_eq!(Viewport::preset(1), Some(Viewport::new(-2.0, -1.0, 1.0, 1.0)));
    }

    #[test]
    fn second_preset_zooms_in() {
        let v = Viewport::preset(2).unwrap();
        assert!((v.x_min - (-1.016)).abs() < 1e-12);
        assert!((v.x_max - (-0.971)).abs() < 1e-12);
        assert!((v.y_min - 0.285).abs() < 1e-12);
        assert!((v.y_max - 0.315).abs() < 1e-12);
    }

    #[test]
    fn unknown_presets_are_refused() {
        assert_eq!(Viewport::preset(0), None);
        assert_eq!(Viewport::preset(3), None);
    }

    #[test]
    fn image_len() {
        assert_eq!(ImageSpec::new(7, 3, 1).len(), 21);
        assert!(ImageSpec::new(0, 3, 1).is_empty());
        assert!(!ImageSpec::new(1, 1, 1).is_empty());
    }
}
