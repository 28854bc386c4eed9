/// A 2D point with floating-point coordinates.
///
/// Used for shapes in normalized face-box space while the predictor runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Round to the nearest pixel, halves rounding up.
    pub fn to_pixel(self) -> PixelPoint {
        PixelPoint::new((self.x + 0.5).floor() as i32, (self.y + 0.5).floor() as i32)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// An integer pixel position in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A face region as reported by a face locator: inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FaceRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Convert to origin + extent form.
    ///
    /// Height is `bottom - top`; a degenerate box yields a zero or negative
    /// extent, which callers must check for themselves.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.right - self.left,
            self.bottom - self.top,
        )
    }

    pub fn area(&self) -> i64 {
        let w = i64::from(self.right - self.left).max(0);
        let h = i64::from(self.bottom - self.top).max(0);
        w * h
    }
}

/// An axis-aligned rectangle defined by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersection with a `width` x `height` frame anchored at the origin.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(width as i32);
        let y1 = (self.y + self.height).min(height as i32);
        let clipped = Rect::new(x0, y0, x1 - x0, y1 - y0);
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Map a point in normalized [0,1] box coordinates into image space.
    ///
    /// (0,0) lands on the top-left corner and (1,1) on `(x + width, y + height)`.
    pub fn denormalize_point(&self, p: Point) -> Point {
        Point::new(
            self.x as f32 + p.x * self.width as f32,
            self.y as f32 + p.y * self.height as f32,
        )
    }
}

/// A facial shape as an ordered list of landmark points.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub points: Vec<Point>,
}

impl Shape {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn zeros(n: usize) -> Self {
        Self {
            points: vec![Point::zero(); n],
        }
    }

    pub fn num_landmarks(&self) -> usize {
        self.points.len()
    }

    /// Build a shape from an interleaved `[x0, y0, x1, y1, ...]` column.
    pub fn from_column(values: &[f32]) -> Self {
        debug_assert!(values.len() % 2 == 0);
        Self::new(
            values
                .chunks_exact(2)
                .map(|xy| Point::new(xy[0], xy[1]))
                .collect(),
        )
    }

    pub fn add_delta(&mut self, delta: &Shape) {
        debug_assert_eq!(self.points.len(), delta.points.len());
        for (p, d) in self.points.iter_mut().zip(&delta.points) {
            *p += *d;
        }
    }

    pub fn mean(&self) -> Point {
        if self.points.is_empty() {
            return Point::zero();
        }
        let sum = self
            .points
            .iter()
            .fold(Point::zero(), |acc, p| acc + *p);
        sum * (1.0 / self.points.len() as f32)
    }
}

impl std::ops::Index<usize> for Shape {
    type Output = Point;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}
