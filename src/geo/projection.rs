//! Map projections.
//!
//! Every family implements [`Project`], a raw mapping from degrees to a
//! unit-scale plane (y up). [`Projection`] adds scale and translation and
//! flips y for the canvas, so fitting to an extent is a closed-form choice
//! of those two parameters.

use enum_dispatch::enum_dispatch;
use glam::{DVec2, dvec2};
use serde::{Deserialize, Serialize};

use super::{Feature, Geography};
use crate::types::BBox;

const EPSILON: f64 = 1e-6;

/// Projection families a map can be drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionKind {
    /// Lower 48 with Alaska and Hawaii insets
    AlbersUsa,
    ConicEqualArea,
    Equirectangular,
    EqualEarth,
}

impl ProjectionKind {
    pub fn default_for(geography: Geography) -> Self {
        match geography {
            Geography::UsaStates | Geography::UsaNation => ProjectionKind::AlbersUsa,
            Geography::CanadaProvinces | Geography::CanadaNation => ProjectionKind::ConicEqualArea,
            Geography::World => ProjectionKind::EqualEarth,
        }
    }

    /// Scale used before any fitting
    pub fn default_scale(self) -> f64 {
        match self {
            ProjectionKind::AlbersUsa => 1300.0,
            ProjectionKind::ConicEqualArea => 1000.0,
            ProjectionKind::Equirectangular => 150.0,
            ProjectionKind::EqualEarth => 180.0,
        }
    }

    /// The composite projection has no single outline to clip against
    pub fn is_clippable(self) -> bool {
        self != ProjectionKind::AlbersUsa
    }
}

/// Raw projection at unit scale
#[enum_dispatch]
pub trait Project {
    /// Degrees (x = longitude, y = latitude) to the unit plane, y up.
    /// `None` when the point has no image under this projection.
    fn raw(&self, lonlat: DVec2) -> Option<DVec2>;
}

#[enum_dispatch(Project)]
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionFamily {
    AlbersUsa(AlbersUsa),
    ConicEqualArea(ConicEqualArea),
    Equirectangular(Equirectangular),
    EqualEarth(EqualEarth),
}

fn wrap_longitude(deg: f64) -> f64 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && deg > 0.0 { 180.0 } else { wrapped }
}

/// Conic equal-area (Albers) with rotation and center
#[derive(Debug, Clone, PartialEq)]
pub struct ConicEqualArea {
    /// Longitude rotation in degrees, added before projecting
    pub rotate: f64,
    /// Center in the rotated frame, degrees
    pub center: DVec2,
    n: f64,
    c: f64,
    r0: f64,
    /// cos of the first parallel, used when the cone degenerates to a cylinder
    cylindrical: Option<f64>,
}

impl ConicEqualArea {
    pub fn new(parallels: [f64; 2], rotate: f64, center: DVec2) -> Self {
        let y0 = parallels[0].to_radians();
        let y1 = parallels[1].to_radians();
        let sy0 = y0.sin();
        let n = (sy0 + y1.sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let cylindrical = (n.abs() < EPSILON).then(|| y0.cos());
        Self {
            rotate,
            center,
            n,
            c,
            r0: c.sqrt() / n,
            cylindrical,
        }
    }

    /// Standard parameters for a geography
    pub fn for_geography(geography: Geography) -> Self {
        match geography {
            Geography::UsaStates | Geography::UsaNation => {
                Self::new([29.5, 45.5], 96.0, dvec2(-0.6, 38.7))
            }
            Geography::CanadaProvinces | Geography::CanadaNation => {
                Self::new([49.0, 77.0], 91.87, dvec2(0.0, 63.39))
            }
            Geography::World => Self::new([20.0, 50.0], 0.0, DVec2::ZERO),
        }
    }

    fn unrotated(&self, lambda: f64, phi: f64) -> DVec2 {
        if let Some(cos_phi0) = self.cylindrical {
            return dvec2(lambda * cos_phi0, phi.sin() / cos_phi0);
        }
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let a = lambda * self.n;
        dvec2(r * a.sin(), self.r0 - r * a.cos())
    }
}

impl Project for ConicEqualArea {
    fn raw(&self, lonlat: DVec2) -> Option<DVec2> {
        let lambda = wrap_longitude(lonlat.x + self.rotate).to_radians();
        let phi = lonlat.y.clamp(-90.0, 90.0).to_radians();
        let origin = self.unrotated(self.center.x.to_radians(), self.center.y.to_radians());
        let p = self.unrotated(lambda, phi) - origin;
        p.is_finite().then_some(p)
    }
}

/// Plate carrée
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Equirectangular {
    pub center: DVec2,
}

impl Project for Equirectangular {
    fn raw(&self, lonlat: DVec2) -> Option<DVec2> {
        let p = dvec2(
            wrap_longitude(lonlat.x).to_radians(),
            lonlat.y.clamp(-90.0, 90.0).to_radians(),
        );
        Some(p - dvec2(self.center.x.to_radians(), self.center.y.to_radians()))
    }
}

/// Equal Earth pseudo-cylindrical projection (Šavrič, Patterson, Jenny 2018)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EqualEarth;

impl EqualEarth {
    const A1: f64 = 1.340264;
    const A2: f64 = -0.081106;
    const A3: f64 = 0.000893;
    const A4: f64 = 0.003796;
}

impl Project for EqualEarth {
    fn raw(&self, lonlat: DVec2) -> Option<DVec2> {
        let m = 3.0_f64.sqrt() / 2.0;
        let lambda = wrap_longitude(lonlat.x).to_radians();
        let phi = lonlat.y.clamp(-90.0, 90.0).to_radians();
        let l = (m * phi.sin()).asin();
        let l2 = l * l;
        let l6 = l2 * l2 * l2;
        let x = lambda * l.cos()
            / (m * (Self::A1 + 3.0 * Self::A2 * l2 + l6 * (7.0 * Self::A3 + 9.0 * Self::A4 * l2)));
        let y = l * (Self::A1 + Self::A2 * l2 + l6 * (Self::A3 + Self::A4 * l2));
        Some(dvec2(x, y))
    }
}

/// Composite US projection: lower 48 plus scaled, offset Alaska and Hawaii
#[derive(Debug, Clone, PartialEq)]
pub struct AlbersUsa {
    lower48: ConicEqualArea,
    alaska: ConicEqualArea,
    hawaii: ConicEqualArea,
}

impl Default for AlbersUsa {
    fn default() -> Self {
        Self {
            lower48: ConicEqualArea::new([29.5, 45.5], 96.0, dvec2(-0.6, 38.7)),
            alaska: ConicEqualArea::new([55.0, 65.0], 154.0, dvec2(-2.0, 58.5)),
            hawaii: ConicEqualArea::new([8.0, 18.0], 157.0, dvec2(-3.0, 19.9)),
        }
    }
}

impl AlbersUsa {
    // Inset placement relative to the lower 48, in units of scale (y up)
    const ALASKA_SCALE: f64 = 0.35;
    const ALASKA_OFFSET: DVec2 = DVec2::new(-0.307, -0.201);
    const HAWAII_OFFSET: DVec2 = DVec2::new(-0.205, -0.212);
}

impl Project for AlbersUsa {
    fn raw(&self, lonlat: DVec2) -> Option<DVec2> {
        let (lon, lat) = (lonlat.x, lonlat.y);
        if lat > 50.0 && (lon < -129.0 || lon > 170.0) {
            let p = self.alaska.raw(lonlat)?;
            return Some(p * Self::ALASKA_SCALE + Self::ALASKA_OFFSET);
        }
        if (-162.0..=-154.0).contains(&lon) && (18.0..=23.0).contains(&lat) {
            return Some(self.hawaii.raw(lonlat)? + Self::HAWAII_OFFSET);
        }
        if (-130.0..=-60.0).contains(&lon) && (22.0..=51.0).contains(&lat) {
            return self.lower48.raw(lonlat);
        }
        None
    }
}

/// A configured projection: family, scale and canvas translation
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub kind: ProjectionKind,
    family: ProjectionFamily,
    pub scale: f64,
    pub translate: DVec2,
}

impl Projection {
    /// Build a family with its default scale, centered on a canvas of `size`
    pub fn new(kind: ProjectionKind, geography: Geography, size: DVec2) -> Self {
        let family = match kind {
            ProjectionKind::AlbersUsa => ProjectionFamily::from(AlbersUsa::default()),
            ProjectionKind::ConicEqualArea => {
                ProjectionFamily::from(ConicEqualArea::for_geography(geography))
            }
            ProjectionKind::Equirectangular => ProjectionFamily::from(Equirectangular::default()),
            ProjectionKind::EqualEarth => ProjectionFamily::from(EqualEarth),
        };
        Self {
            kind,
            family,
            scale: kind.default_scale(),
            translate: size / 2.0,
        }
    }

    /// Project degrees to canvas pixels (y down)
    pub fn project(&self, lonlat: DVec2) -> Option<DVec2> {
        let raw = self.family.raw(lonlat)?;
        Some(dvec2(
            self.translate.x + self.scale * raw.x,
            self.translate.y - self.scale * raw.y,
        ))
    }

    /// Bounds of the features in the unit plane (y up)
    fn raw_bounds<'a>(&self, features: impl IntoIterator<Item = &'a Feature>) -> BBox {
        let mut bounds = BBox::new();
        for feature in features {
            if let Some(geometry) = &feature.geometry {
                geometry.for_each_point(&mut |p| {
                    if let Some(r) = self.family.raw(p) {
                        bounds.expand_point(r);
                    }
                });
            }
        }
        bounds
    }

    /// Choose scale and translation so the features fill `extent`, centered.
    /// Returns false (leaving the projection untouched) when the features
    /// have no projectable extent.
    pub fn fit_extent<'a>(
        &mut self,
        extent: BBox,
        features: impl IntoIterator<Item = &'a Feature>,
    ) -> bool {
        let bounds = self.raw_bounds(features);
        if bounds.is_empty() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return false;
        }
        let k = (extent.width() / bounds.width()).min(extent.height() / bounds.height());
        if !k.is_finite() || k <= 0.0 {
            return false;
        }
        let target = extent.center();
        let mid = bounds.center();
        self.scale = k;
        self.translate = dvec2(target.x - k * mid.x, target.y + k * mid.y);
        true
    }
}

/// True if the coordinate is a valid longitude/latitude pair
pub fn is_valid_lonlat(lonlat: DVec2) -> bool {
    lonlat.is_finite() && (-180.0..=180.0).contains(&lonlat.x) && (-90.0..=90.0).contains(&lonlat.y)
}
