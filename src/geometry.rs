use lyon::geom::euclid;

/// Integer pixel rectangle. `min` is inclusive, `max` is exclusive.
pub type Rect = euclid::default::Box2D<i32>;

/// A position in pixels. Pointer positions are fractional.
pub type Point = euclid::default::Point2D<f32>;

pub type Vector = euclid::default::Vector2D<f32>;

#[inline]
pub fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Rect {
    Rect::new(euclid::point2(min_x, min_y), euclid::point2(max_x, max_y))
}

#[inline]
pub fn vector(x: f32, y: f32) -> Vector {
    euclid::vec2(x, y)
}

#[inline]
pub fn point(x: f32, y: f32) -> Point {
    euclid::point2(x, y)
}

/// Intersection of two rectangles; disjoint rectangles produce an empty one.
pub(crate) fn intersect(a: &Rect, b: &Rect) -> Rect {
    a.intersection(b).unwrap_or_else(Rect::zero)
}

pub(crate) fn rect_contains(r: &Rect, p: Point) -> bool {
    r.to_f32().contains(p)
}

/// Whether `p` lies inside the ellipse inscribed in `r`.
pub(crate) fn ellipse_contains(r: &Rect, p: Point) -> bool {
    let r = r.to_f32();
    let rx = r.width() / 2.0;
    let ry = r.height() / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let center = r.center();
    let dx = (p.x - center.x) / rx;
    let dy = (p.y - center.y) / ry;
    dx * dx + dy * dy <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping() {
        let a = rect(0, 0, 10, 10);
        let b = rect(5, 2, 20, 8);
        assert_eq!(intersect(&a, &b), rect(5, 2, 10, 8));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = rect(0, 0, 10, 10);
        let b = rect(20, 20, 30, 30);
        assert!(intersect(&a, &b).is_empty());
    }

    #[test]
    fn rect_contains_is_max_exclusive() {
        let r = rect(0, 0, 10, 10);
        assert!(rect_contains(&r, point(0.0, 0.0)));
        assert!(rect_contains(&r, point(9.5, 9.5)));
        assert!(!rect_contains(&r, point(10.0, 5.0)));
        assert!(!rect_contains(&r, point(5.0, 10.0)));
    }

    #[test]
    fn ellipse_excludes_corners() {
        let r = rect(0, 0, 100, 50);
        assert!(ellipse_contains(&r, point(50.0, 25.0)));
        assert!(ellipse_contains(&r, point(0.0, 25.0)));
        assert!(!ellipse_contains(&r, point(2.0, 2.0)));
        assert!(!ellipse_contains(&rect(5, 5, 5, 9), point(5.0, 6.0)));
    }
}
