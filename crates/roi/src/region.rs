use std::f64::consts::{PI, TAU};

use geo::{BoundingRect, Centroid, Contains, EuclideanLength, MapCoords};
use geo_types::{Coord, Line, LineString, MultiPoint, MultiPolygon, Point, Polygon, Rect, coord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::canvas::CanvasKey;
use crate::traits::RegionGeometry;
use crate::types::{Color, SlicePosition, Style};

const MIN_OVAL_VERTICES: usize = 32;
const MAX_OVAL_VERTICES: usize = 4096;

/// Half the footprint width of a line-like region when testing containment
const LINE_HALF_WIDTH: f64 = 0.5;

/// The closed set of region kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegionKind {
    Rectangle,
    Oval,
    Polygon,
    FreehandPolygon,
    TracedPolygon,
    Line,
    Polyline,
    Freeline,
    Angle,
    CompositeShape,
    Point,
}

impl RegionKind {
    pub fn is_area(self) -> bool {
        matches!(
            self,
            Self::Rectangle
                | Self::Oval
                | Self::Polygon
                | Self::FreehandPolygon
                | Self::TracedPolygon
                | Self::CompositeShape
        )
    }

    pub fn is_line(self) -> bool {
        matches!(self, Self::Line | Self::Polyline | Self::Freeline | Self::Angle)
    }
}

/// Vertex path of a polygon or polyline, with an optional fitted spline.
///
/// When a spline is present it replaces the vertices for every geometric
/// query; the vertices are kept as control points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub vertices: Vec<Coord<f64>>,
    pub spline: Option<Vec<Coord<f64>>>,
}

impl Path {
    pub fn new(vertices: Vec<Coord<f64>>) -> Self {
        Self { vertices, spline: None }
    }

    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect())
    }

    /// Effective points: the spline when fitted, otherwise the vertices
    pub fn points(&self) -> &[Coord<f64>] {
        self.spline.as_deref().unwrap_or(&self.vertices)
    }

    pub fn is_spline_fit(&self) -> bool {
        self.spline.is_some()
    }

    pub(crate) fn map(&self, f: impl Fn(Coord<f64>) -> Coord<f64>) -> Self {
        Self {
            vertices: self.vertices.iter().map(|&c| f(c)).collect(),
            spline: self.spline.as_ref().map(|s| s.iter().map(|&c| f(c)).collect()),
        }
    }
}

/// Kind-specific geometry of a region
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle(Rect<f64>),
    /// Ellipse inscribed in the rect
    Oval(Rect<f64>),
    Polygon(Path),
    FreehandPolygon(Path),
    TracedPolygon(Path),
    Line(Line<f64>),
    Polyline(Path),
    Freeline(Path),
    Angle(Path),
    /// Planar area produced by set algebra or line conversion
    Composite(MultiPolygon<f64>),
    Point(MultiPoint<f64>),
}

impl Shape {
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::Rectangle(Rect::new(coord! { x: x, y: y }, coord! { x: x + width, y: y + height }))
    }

    pub fn oval(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::Oval(Rect::new(coord! { x: x, y: y }, coord! { x: x + width, y: y + height }))
    }

    pub fn polygon(points: &[(f64, f64)]) -> Self {
        Self::Polygon(Path::from_xy(points))
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::Line(Line::new(coord! { x: x1, y: y1 }, coord! { x: x2, y: y2 }))
    }

    pub fn polyline(points: &[(f64, f64)]) -> Self {
        Self::Polyline(Path::from_xy(points))
    }

    pub fn points(points: &[(f64, f64)]) -> Self {
        Self::Point(MultiPoint::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()))
    }

    pub fn kind(&self) -> RegionKind {
        match self {
            Self::Rectangle(_) => RegionKind::Rectangle,
            Self::Oval(_) => RegionKind::Oval,
            Self::Polygon(_) => RegionKind::Polygon,
            Self::FreehandPolygon(_) => RegionKind::FreehandPolygon,
            Self::TracedPolygon(_) => RegionKind::TracedPolygon,
            Self::Line(_) => RegionKind::Line,
            Self::Polyline(_) => RegionKind::Polyline,
            Self::Freeline(_) => RegionKind::Freeline,
            Self::Angle(_) => RegionKind::Angle,
            Self::Composite(_) => RegionKind::CompositeShape,
            Self::Point(_) => RegionKind::Point,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Polygon(path)
            | Self::FreehandPolygon(path)
            | Self::TracedPolygon(path)
            | Self::Polyline(path)
            | Self::Freeline(path)
            | Self::Angle(path) => Some(path),
            _ => None,
        }
    }

    /// Applies `f` to every coordinate, keeping the kind.
    ///
    /// Only valid for maps that keep axis alignment; rectangles and ovals are
    /// re-normalized from their mapped corners.
    pub fn map_coords(&self, f: impl Fn(Coord<f64>) -> Coord<f64> + Copy) -> Self {
        match self {
            Self::Rectangle(rect) => Self::Rectangle(rect.map_coords(f)),
            Self::Oval(rect) => Self::Oval(rect.map_coords(f)),
            Self::Polygon(path) => Self::Polygon(path.map(f)),
            Self::FreehandPolygon(path) => Self::FreehandPolygon(path.map(f)),
            Self::TracedPolygon(path) => Self::TracedPolygon(path.map(f)),
            Self::Line(line) => Self::Line(line.map_coords(f)),
            Self::Polyline(path) => Self::Polyline(path.map(f)),
            Self::Freeline(path) => Self::Freeline(path.map(f)),
            Self::Angle(path) => Self::Angle(path.map(f)),
            Self::Composite(shape) => Self::Composite(shape.map_coords(f)),
            Self::Point(points) => Self::Point(points.map_coords(f)),
        }
    }

    /// Pixels of a `width` x `height` plane that belong to the shape.
    ///
    /// Area kinds own the pixels whose center lies inside them, line kinds
    /// the pixels within their stroked footprint, and points the pixel they
    /// fall in.
    pub fn pixels(&self, line_width: f64, width: u32, height: u32) -> Vec<(u32, u32)> {
        let in_plane = |x: f64, y: f64| x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64;

        if let Self::Point(points) = self {
            let mut pixels: Vec<_> = points
                .iter()
                .map(|p| (p.x().floor(), p.y().floor()))
                .filter(|&(x, y)| in_plane(x, y))
                .map(|(x, y)| (x as u32, y as u32))
                .collect();
            pixels.sort_unstable();
            pixels.dedup();
            return pixels;
        }

        let half_width = line_width.max(1.0) / 2.0;
        let is_line = self.kind().is_line();
        let path = if is_line { self.boundary() } else { Vec::new() };
        let area = if is_line { None } else { self.area_shape() };
        let inside = |c: Coord<f64>| match self {
            Self::Rectangle(_) | Self::Oval(_) => self.contains(c),
            _ if is_line => distance_to_path(c, &path) <= half_width,
            _ => {
                let point = Point::from(c);
                area.iter().flatten().any(|polygon| polygon.contains(&point))
            }
        };

        let bounds = self.bounds();
        let pad = if is_line { half_width } else { 0.0 };
        let x0 = (bounds.min().x - pad).floor().max(0.0) as u32;
        let y0 = (bounds.min().y - pad).floor().max(0.0) as u32;
        let x1 = ((bounds.max().x + pad).ceil().max(0.0) as u32).min(width);
        let y1 = ((bounds.max().y + pad).ceil().max(0.0) as u32).min(height);

        let mut pixels = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(coord! { x: x as f64 + 0.5, y: y as f64 + 0.5 }) {
                    pixels.push((x, y));
                }
            }
        }
        pixels
    }

    /// All coordinates of the geometry are finite
    pub fn is_finite(&self) -> bool {
        let finite = |c: &Coord<f64>| c.x.is_finite() && c.y.is_finite();
        match self {
            Self::Rectangle(rect) | Self::Oval(rect) => finite(&rect.min()) && finite(&rect.max()),
            Self::Line(line) => finite(&line.start) && finite(&line.end),
            Self::Composite(shape) => shape
                .iter()
                .all(|p| p.exterior().coords().all(finite) && p.interiors().iter().all(|r| r.coords().all(finite))),
            Self::Point(points) => points.iter().all(|p| finite(&p.0)),
            _ => self
                .path()
                .map(|path| path.vertices.iter().chain(path.spline.iter().flatten()).all(finite))
                .unwrap_or(true),
        }
    }
}

impl RegionGeometry for Shape {
    fn bounds(&self) -> Rect<f64> {
        match self {
            Self::Rectangle(rect) | Self::Oval(rect) => *rect,
            Self::Line(line) => Rect::new(line.start, line.end),
            Self::Composite(shape) => shape.bounding_rect().unwrap_or_else(zero_rect),
            Self::Point(points) => points.bounding_rect().unwrap_or_else(zero_rect),
            _ => self.path().map(|p| points_bounds(p.points())).unwrap_or_else(zero_rect),
        }
    }

    fn contains(&self, coord: Coord<f64>) -> bool {
        match self {
            Self::Rectangle(rect) => {
                let (min, max) = (rect.min(), rect.max());
                coord.x >= min.x && coord.x < max.x && coord.y >= min.y && coord.y < max.y
            }
            Self::Oval(rect) => {
                let (a, b) = (rect.width() / 2.0, rect.height() / 2.0);
                if a <= 0.0 || b <= 0.0 {
                    return false;
                }
                let center = rect.center();
                let dx = (coord.x - center.x) / a;
                let dy = (coord.y - center.y) / b;
                dx * dx + dy * dy <= 1.0
            }
            Self::Polygon(path) | Self::FreehandPolygon(path) | Self::TracedPolygon(path) => {
                let points = path.points();
                points.len() >= 3 && closed_polygon(points).contains(&Point::from(coord))
            }
            Self::Line(line) => distance_to_segment(coord, line.start, line.end) <= LINE_HALF_WIDTH,
            Self::Polyline(path) | Self::Freeline(path) | Self::Angle(path) => {
                distance_to_path(coord, path.points()) <= LINE_HALF_WIDTH
            }
            Self::Composite(shape) => {
                let point = Point::from(coord);
                shape.iter().any(|polygon| polygon.contains(&point))
            }
            Self::Point(points) => points
                .iter()
                .any(|p| p.x().floor() == coord.x.floor() && p.y().floor() == coord.y.floor()),
        }
    }

    fn boundary(&self) -> Vec<Coord<f64>> {
        match self {
            Self::Rectangle(rect) => rect_corners(rect).to_vec(),
            Self::Oval(rect) => oval_vertices(rect),
            Self::Line(line) => vec![line.start, line.end],
            Self::Composite(shape) => shape
                .iter()
                .flat_map(|polygon| {
                    std::iter::once(polygon.exterior())
                        .chain(polygon.interiors())
                        .flat_map(|ring| open_ring(ring).iter().copied())
                })
                .collect(),
            Self::Point(points) => points.iter().map(|p| p.0).collect(),
            _ => self.path().map(|p| p.points().to_vec()).unwrap_or_default(),
        }
    }

    fn area_shape(&self) -> Option<MultiPolygon<f64>> {
        match self {
            Self::Rectangle(rect) => Some(MultiPolygon::new(vec![rect.to_polygon()])),
            Self::Oval(rect) => Some(MultiPolygon::new(vec![closed_polygon(&oval_vertices(rect))])),
            Self::Polygon(path) | Self::FreehandPolygon(path) | Self::TracedPolygon(path) => {
                let points = path.points();
                (points.len() >= 3).then(|| MultiPolygon::new(vec![closed_polygon(points)]))
            }
            Self::Composite(shape) => Some(shape.clone()),
            _ => None,
        }
    }

    fn area(&self) -> f64 {
        use geo::Area;
        match self {
            Self::Rectangle(rect) => rect.width() * rect.height(),
            Self::Oval(rect) => PI * rect.width() * rect.height() / 4.0,
            _ => self.area_shape().map(|shape| shape.unsigned_area()).unwrap_or(0.0),
        }
    }

    fn length(&self) -> f64 {
        match self {
            Self::Rectangle(rect) => 2.0 * (rect.width() + rect.height()),
            Self::Oval(rect) => ellipse_perimeter(rect.width() / 2.0, rect.height() / 2.0),
            Self::Polygon(path) | Self::FreehandPolygon(path) | Self::TracedPolygon(path) => {
                path_length(path.points(), true)
            }
            Self::Line(line) => line.euclidean_length(),
            Self::Polyline(path) | Self::Freeline(path) | Self::Angle(path) => path_length(path.points(), false),
            Self::Composite(shape) => shape
                .iter()
                .map(|polygon| {
                    polygon.exterior().euclidean_length()
                        + polygon.interiors().iter().map(|ring| ring.euclidean_length()).sum::<f64>()
                })
                .sum(),
            Self::Point(_) => 0.0,
        }
    }

    fn centroid(&self) -> Coord<f64> {
        let fallback = || self.bounds().center();
        match self {
            Self::Rectangle(rect) | Self::Oval(rect) => rect.center(),
            Self::Point(points) => points.centroid().map(|p| p.0).unwrap_or_else(fallback),
            shape if shape.kind().is_line() => LineString::from(shape.boundary())
                .centroid()
                .map(|p| p.0)
                .unwrap_or_else(fallback),
            shape => shape
                .area_shape()
                .and_then(|area| area.centroid())
                .map(|p| p.0)
                .unwrap_or_else(fallback),
        }
    }
}

/// A single annotated region.
///
/// The canvas key is a lookup-only association and is never carried over by
/// `clone`.
#[derive(Debug)]
pub struct Region {
    pub shape: Shape,
    pub position: SlicePosition,
    pub style: Style,
    pub name: Option<String>,
    canvas: Option<CanvasKey>,
}

impl Clone for Region {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            position: self.position,
            style: self.style,
            name: self.name.clone(),
            canvas: None,
        }
    }
}

impl Region {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            position: SlicePosition::ANY,
            style: Style::default(),
            name: None,
            canvas: None,
        }
    }

    /// New region with `shape` carrying the name, position and style of `source`
    pub fn derived_from(shape: Shape, source: &Region) -> Self {
        Self {
            shape,
            position: source.position,
            style: source.style,
            name: source.name.clone(),
            canvas: None,
        }
    }

    pub fn with_position(mut self, position: SlicePosition) -> Self {
        self.position = position;
        self
    }

    /// Pins the region to raw 1-based (z, c, t) indices, `0` meaning any
    pub fn at(self, z: u32, c: u32, t: u32) -> Self {
        self.with_position(SlicePosition::new(z, c, t))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.style.fill_color = Some(color);
        self
    }

    pub fn with_stroke_color(mut self, color: Color) -> Self {
        self.style.stroke_color = Some(color);
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.style.stroke_width = Some(width);
        self
    }

    pub fn kind(&self) -> RegionKind {
        self.shape.kind()
    }

    pub fn is_area(&self) -> bool {
        self.kind().is_area()
    }

    pub fn is_line(&self) -> bool {
        self.kind().is_line()
    }

    pub fn canvas(&self) -> Option<CanvasKey> {
        self.canvas
    }

    pub fn attach_canvas(&mut self, key: CanvasKey) {
        self.canvas = Some(key);
    }

    pub fn detach_canvas(&mut self) {
        self.canvas = None;
    }
}

impl RegionGeometry for Region {
    fn bounds(&self) -> Rect<f64> {
        self.shape.bounds()
    }

    fn contains(&self, coord: Coord<f64>) -> bool {
        self.shape.contains(coord)
    }

    fn boundary(&self) -> Vec<Coord<f64>> {
        self.shape.boundary()
    }

    fn area_shape(&self) -> Option<MultiPolygon<f64>> {
        self.shape.area_shape()
    }

    fn area(&self) -> f64 {
        self.shape.area()
    }

    fn length(&self) -> f64 {
        self.shape.length()
    }

    fn centroid(&self) -> Coord<f64> {
        self.shape.centroid()
    }
}

pub(crate) fn zero_rect() -> Rect<f64> {
    Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 })
}

pub(crate) fn rect_corners(rect: &Rect<f64>) -> [Coord<f64>; 4] {
    let (min, max) = (rect.min(), rect.max());
    [
        coord! { x: min.x, y: min.y },
        coord! { x: max.x, y: min.y },
        coord! { x: max.x, y: max.y },
        coord! { x: min.x, y: max.y },
    ]
}

/// Polygonal approximation of the ellipse inscribed in `rect`, roughly one
/// vertex per pixel of perimeter
pub(crate) fn oval_vertices(rect: &Rect<f64>) -> Vec<Coord<f64>> {
    let (a, b) = (rect.width() / 2.0, rect.height() / 2.0);
    let center = rect.center();
    let n = (ellipse_perimeter(a, b).ceil() as usize).clamp(MIN_OVAL_VERTICES, MAX_OVAL_VERTICES);
    (0..n)
        .map(|i| {
            let theta = TAU * i as f64 / n as f64;
            coord! { x: center.x + a * theta.cos(), y: center.y + b * theta.sin() }
        })
        .collect()
}

// Ramanujan's approximation
pub(crate) fn ellipse_perimeter(a: f64, b: f64) -> f64 {
    PI * (3.0 * (a + b) - ((3.0 * a + b) * (a + 3.0 * b)).sqrt())
}

pub(crate) fn closed_polygon(points: &[Coord<f64>]) -> Polygon<f64> {
    Polygon::new(LineString::from(points.to_vec()), vec![])
}

/// Ring coordinates without the repeated closing vertex
pub(crate) fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    match ring.0.as_slice() {
        [first, .., last] if first == last => &ring.0[..ring.0.len() - 1],
        coords => coords,
    }
}

pub(crate) fn points_bounds(points: &[Coord<f64>]) -> Rect<f64> {
    let Some(first) = points.first() else {
        return zero_rect();
    };
    let (min, max) = points.iter().fold((*first, *first), |(min, max), c| {
        (
            coord! { x: min.x.min(c.x), y: min.y.min(c.y) },
            coord! { x: max.x.max(c.x), y: max.y.max(c.y) },
        )
    });
    Rect::new(min, max)
}

pub(crate) fn path_length(points: &[Coord<f64>], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(&first), Some(&last)) if points.len() > 2 => open + distance(last, first),
        _ => open,
    }
}

pub(crate) fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

pub(crate) fn distance_to_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = b - a;
    let length_sq = d.x * d.x + d.y * d.y;
    if length_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * d.x + (p.y - a.y) * d.y) / length_sq).clamp(0.0, 1.0);
    distance(p, coord! { x: a.x + t * d.x, y: a.y + t * d.y })
}

pub(crate) fn distance_to_path(p: Coord<f64>, points: &[Coord<f64>]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => distance(p, *single),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_containment_is_half_open() {
        let shape = Shape::rectangle(10.0, 10.0, 10.0, 10.0);
        assert!(shape.contains(coord! { x: 10.0, y: 10.0 }));
        assert!(shape.contains(coord! { x: 19.5, y: 19.5 }));
        assert!(!shape.contains(coord! { x: 20.0, y: 15.0 }));
        assert_eq!(shape.area(), 100.0);
        assert_eq!(shape.length(), 40.0);
    }

    #[test]
    fn oval_geometry() {
        let shape = Shape::oval(0.0, 0.0, 20.0, 10.0);
        assert!((shape.area() - PI * 50.0).abs() < 1e-9);
        assert!(shape.contains(coord! { x: 10.0, y: 5.0 }));
        assert!(!shape.contains(coord! { x: 0.5, y: 0.5 }));

        let sampled = shape.area_shape().unwrap();
        use geo::Area;
        assert!((sampled.unsigned_area() - shape.area()).abs() / shape.area() < 0.01);
        assert_eq!(shape.bounds(), Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 20.0, y: 10.0 }));
    }

    #[test]
    fn lines_have_no_area_but_a_footprint() {
        let shape = Shape::polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(shape.area_shape().is_none());
        assert_eq!(shape.area(), 0.0);
        assert_eq!(shape.length(), 20.0);
        assert!(shape.contains(coord! { x: 5.0, y: 0.4 }));
        assert!(!shape.contains(coord! { x: 5.0, y: 1.0 }));
        assert!(RegionKind::Polyline.is_line());
        assert!(!RegionKind::Polyline.is_area());
    }

    #[test]
    fn pixel_membership_uses_pixel_centers() {
        let rect = Shape::rectangle(10.0, 10.0, 10.0, 10.0);
        let pixels = rect.pixels(1.0, 100, 100);
        assert_eq!(pixels.len(), 100);
        assert!(pixels.contains(&(10, 10)));
        assert!(!pixels.contains(&(20, 20)));

        // clipped to the plane
        assert_eq!(rect.pixels(1.0, 15, 15).len(), 25);

        let points = Shape::points(&[(1.2, 1.7), (1.9, 1.1), (-3.0, 2.0)]);
        assert_eq!(points.pixels(1.0, 10, 10), vec![(1, 1)]);

        let triangle = Shape::polygon(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let count = triangle.pixels(1.0, 20, 20).len();
        assert!((40..=55).contains(&count));
    }

    #[test]
    fn spline_replaces_vertices_for_queries() {
        let mut path = Path::from_xy(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        path.spline = Some(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 0.0 }]);
        let shape = Shape::Polyline(path);
        assert_eq!(shape.length(), 4.0);
        assert_eq!(shape.bounds().max(), coord! { x: 4.0, y: 0.0 });
    }

    #[test]
    fn clone_drops_canvas_association() {
        let mut region = Region::new(Shape::rectangle(0.0, 0.0, 1.0, 1.0)).with_name("cell").at(2, 0, 0);
        region.attach_canvas(CanvasKey(7));
        let copy = region.clone();
        assert_eq!(region.canvas(), Some(CanvasKey(7)));
        assert_eq!(copy.canvas(), None);
        assert_eq!(copy.name.as_deref(), Some("cell"));
        assert_eq!(copy.position, region.position);
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(RegionKind::CompositeShape.to_string(), "composite_shape");
        assert_eq!("freehand_polygon".parse::<RegionKind>().unwrap(), RegionKind::FreehandPolygon);
    }
}
