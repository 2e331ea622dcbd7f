/// Axis-aligned rectangle in source pixels, origin top-left, as reported by a
/// [`CandidateExtractor`](crate::kornia::candidates::CandidateExtractor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl RawRegion {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Width over height; zero-height regions report an infinite aspect.
    pub fn aspect(&self) -> f64 {
        if self.h == 0 {
            return f64::INFINITY;
        }
        self.w as f64 / self.h as f64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }
}

/// A region that survived geometric filtering.
///
/// `index` is the region's position in detection order and is used as the
/// deterministic tie-break wherever two candidates compare equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCandidate {
    pub region: RawRegion,
    pub index: usize,
}

impl BoxCandidate {
    pub fn area(&self) -> u64 {
        self.region.area()
    }

    pub fn center_x(&self) -> f64 {
        self.region.center().0
    }

    pub fn center_y(&self) -> f64 {
        self.region.center().1
    }
}
