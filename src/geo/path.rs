//! Projected path generation: SVG path data, bounds and centroids for
//! geographic geometry.

use glam::DVec2;

use super::Geometry;
use super::projection::Projection;
use crate::render::svg::fmt_num;
use crate::types::BBox;

/// Projects geometry through a fixed projection
#[derive(Clone, Copy)]
pub struct GeoPath<'a> {
    projection: &'a Projection,
}

impl<'a> GeoPath<'a> {
    pub fn new(projection: &'a Projection) -> Self {
        Self { projection }
    }

    /// Project a ring or line, dropping vertices without an image
    fn project_line(&self, line: &[DVec2]) -> Vec<DVec2> {
        line.iter()
            .filter_map(|p| self.projection.project(*p))
            .collect()
    }

    /// SVG path data. Rings close with `Z`; points are not drawn.
    pub fn data(&self, geometry: &Geometry) -> String {
        let mut out = String::new();
        self.write_data(geometry, &mut out);
        out
    }

    fn write_data(&self, geometry: &Geometry, out: &mut String) {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => {}
            Geometry::LineString(line) => self.write_line(line, false, out),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    self.write_line(line, false, out);
                }
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    self.write_line(ring, true, out);
                }
            }
            Geometry::MultiPolygon(polys) => {
                for ring in polys.iter().flatten() {
                    self.write_line(ring, true, out);
                }
            }
            Geometry::Collection(items) => {
                for g in items {
                    self.write_data(g, out);
                }
            }
        }
    }

    fn write_line(&self, line: &[DVec2], closed: bool, out: &mut String) {
        let pts = self.project_line(line);
        let min_len = if closed { 3 } else { 2 };
        if pts.len() < min_len {
            return;
        }
        for (i, p) in pts.iter().enumerate() {
            out.push(if i == 0 { 'M' } else { 'L' });
            out.push_str(&fmt_num(p.x));
            out.push(',');
            out.push_str(&fmt_num(p.y));
        }
        if closed {
            out.push('Z');
        }
    }

    /// Canvas bounds of every projectable vertex
    pub fn bounds(&self, geometry: &Geometry) -> BBox {
        let mut bounds = BBox::new();
        geometry.for_each_point(&mut |p| {
            if let Some(q) = self.projection.project(p) {
                bounds.expand_point(q);
            }
        });
        bounds
    }

    /// Planar centroid in canvas space.
    ///
    /// Polygons are weighted by area (holes subtract), lines by length, and
    /// bare points by count, using the highest dimension present.
    pub fn centroid(&self, geometry: &Geometry) -> Option<DVec2> {
        let mut acc = CentroidAccumulator::default();
        self.accumulate(geometry, &mut acc);
        acc.result()
    }

    fn accumulate(&self, geometry: &Geometry, acc: &mut CentroidAccumulator) {
        match geometry {
            Geometry::Point(p) => acc.point(self.projection.project(*p)),
            Geometry::MultiPoint(pts) => {
                for p in pts {
                    acc.point(self.projection.project(*p));
                }
            }
            Geometry::LineString(line) => acc.line(&self.project_line(line)),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    acc.line(&self.project_line(line));
                }
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    acc.ring(&self.project_line(ring));
                }
            }
            Geometry::MultiPolygon(polys) => {
                for ring in polys.iter().flatten() {
                    acc.ring(&self.project_line(ring));
                }
            }
            Geometry::Collection(items) => {
                for g in items {
                    self.accumulate(g, acc);
                }
            }
        }
    }
}

#[derive(Default)]
struct CentroidAccumulator {
    area: f64,
    area_moment: DVec2,
    length: f64,
    length_moment: DVec2,
    points: usize,
    point_sum: DVec2,
}

impl CentroidAccumulator {
    fn point(&mut self, p: Option<DVec2>) {
        if let Some(p) = p {
            self.points += 1;
            self.point_sum += p;
        }
    }

    fn line(&mut self, pts: &[DVec2]) {
        for w in pts.windows(2) {
            let len = w[0].distance(w[1]);
            self.length += len;
            self.length_moment += (w[0] + w[1]) * 0.5 * len;
        }
    }

    fn ring(&mut self, pts: &[DVec2]) {
        if pts.len() < 3 {
            return;
        }
        // Signed shoelace: holes wound against their exterior subtract
        let mut twice_area = 0.0;
        let mut moment = DVec2::ZERO;
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            let cross = a.x * b.y - b.x * a.y;
            twice_area += cross;
            moment += (a + b) * cross;
        }
        self.area += twice_area / 2.0;
        self.area_moment += moment / 6.0;
        self.line(pts);
    }

    fn result(&self) -> Option<DVec2> {
        if self.area.abs() > 1e-9 {
            let c = self.area_moment / self.area;
            if c.is_finite() {
                return Some(c);
            }
        }
        if self.length > 0.0 {
            return Some(self.length_moment / self.length);
        }
        (self.points > 0).then(|| self.point_sum / self.points as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use crate::geo::Geography;
    use crate::geo::projection::ProjectionKind;

    fn square_ring(min: DVec2, max: DVec2) -> Vec<DVec2> {
        vec![min, dvec2(max.x, min.y), max, dvec2(min.x, max.y), min]
    }

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-9
    }

    fn identity_like() -> Projection {
        // Equirectangular at scale 180/pi maps degrees 1:1 (y flipped)
        let mut p = Projection::new(ProjectionKind::Equirectangular, Geography::World, DVec2::ZERO);
        p.scale = 180.0 / std::f64::consts::PI;
        p
    }

    #[test]
    fn polygon_path_data() {
        let p = identity_like();
        let g = Geometry::Polygon(vec![square_ring(dvec2(0.0, 0.0), dvec2(10.0, 10.0))]);
        insta::assert_snapshot!(GeoPath::new(&p).data(&g), @"M0,0L10,0L10,-10L0,-10L0,0Z");
    }

    #[test]
    fn points_draw_nothing() {
        let p = identity_like();
        assert_eq!(GeoPath::new(&p).data(&Geometry::Point(DVec2::ZERO)), "");
    }

    #[test]
    fn centroid_of_square_with_hole_is_center() {
        let p = identity_like();
        let outer = square_ring(dvec2(0.0, 0.0), dvec2(10.0, 10.0));
        let mut hole = square_ring(dvec2(4.0, 4.0), dvec2(6.0, 6.0));
        hole.reverse();
        let g = Geometry::Polygon(vec![outer, hole]);
        let c = GeoPath::new(&p).centroid(&g).unwrap();
        assert!(close(c, dvec2(5.0, -5.0)));
    }

    #[test]
    fn centroid_is_area_weighted() {
        let p = identity_like();
        let big = square_ring(dvec2(0.0, 0.0), dvec2(10.0, 10.0));
        let small = square_ring(dvec2(20.0, 0.0), dvec2(21.0, 1.0));
        let g = Geometry::MultiPolygon(vec![vec![big], vec![small]]);
        let c = GeoPath::new(&p).centroid(&g).unwrap();
        // 100 units at x=5, 1 unit at x=20.5
        assert!((c.x - (500.0 + 20.5) / 101.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_falls_back_to_points() {
        let p = identity_like();
        let g = Geometry::MultiPoint(vec![dvec2(0.0, 0.0), dvec2(2.0, 2.0)]);
        let c = GeoPath::new(&p).centroid(&g).unwrap();
        assert!(close(c, dvec2(1.0, -1.0)));
    }

    #[test]
    fn bounds_cover_vertices() {
        let p = identity_like();
        let g = Geometry::LineString(vec![dvec2(-1.0, 2.0), dvec2(3.0, -4.0)]);
        let b = GeoPath::new(&p).bounds(&g);
        assert!(close(b.min, dvec2(-1.0, -2.0)));
        assert!(close(b.max, dvec2(3.0, 4.0)));
    }
}
