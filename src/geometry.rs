//! Indexed triangle geometry fed to the lit variants.
use std::str::FromStr;

use anyhow::{anyhow, Error};
use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::vertex::{Vertex, VertexError, MAX_INDEXED_VERTICES};

const PHI: f32 = 1.618_034;

/// Anything that can produce an indexed triangle list.
pub trait Geometry {
    fn geometry(&self) -> Result<(Vec<Vertex>, Vec<u16>), VertexError>;
}

/// Owned vertex and `u16` index lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// Appends a polygon, offsetting its indices past the existing vertices.
    /// The mesh is left untouched when the polygon would overflow 16-bit indices.
    pub fn push_polygon(&mut self, polygon: &Polygon, colour: Vec3) -> Result<(), VertexError> {
        let (vertices, indices) = polygon.triangulate(colour, self.vertices.len())?;
        self.vertices.extend(vertices);
        self.indices.extend(indices);
        Ok(())
    }

    /// First index that does not address a vertex, with its position in the index list.
    pub fn find_bad_index(&self) -> Option<(usize, u16)> {
        self.indices
            .iter()
            .copied()
            .enumerate()
            .find(|&(_, index)| usize::from(index) >= self.vertices.len())
    }

    /// Iterates complete triangles. A trailing partial triangle is ignored and
    /// a triangle with an out-of-range index is skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .enumerate()
            .filter_map(|(triangle, tri)| {
                let corners = [
                    self.vertices.get(usize::from(tri[0])),
                    self.vertices.get(usize::from(tri[1])),
                    self.vertices.get(usize::from(tri[2])),
                ];
                match corners {
                    [Some(a), Some(b), Some(c)] => Some([a, b, c]),
                    _ => {
                        warn!("skipping triangle {triangle}: index out of range in {tri:?}");
                        None
                    }
                }
            })
    }
}

impl Geometry for Mesh {
    fn geometry(&self) -> Result<(Vec<Vertex>, Vec<u16>), VertexError> {
        Ok((self.vertices.clone(), self.indices.clone()))
    }
}

/// Planar polygon with a shared face normal.
///
/// Corners are expected to lie on one plane; this is not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    corners: Vec<Vec3>,
    normal: Vec3,
}

impl Polygon {
    pub fn new(corners: Vec<Vec3>, normal: Vec3) -> Self {
        Self { corners, normal }
    }

    /// Builds a face whose normal points away from `outside_of` (usually the solid's centre).
    /// Corners are reordered so the winding is counter-clockwise seen from outside.
    pub fn facing_away_from(mut corners: Vec<Vec3>, outside_of: Vec3) -> Self {
        let centroid = corners.iter().copied().sum::<Vec3>() / corners.len().max(1) as f32;
        let mut normal = match corners.as_slice() {
            [a, b, c, ..] => (*b - *a).cross(*c - *a).normalize_or_zero(),
            _ => Vec3::ZERO,
        };
        if normal.dot(centroid - outside_of) < 0.0 {
            corners.reverse();
            normal = -normal;
        }
        Self { corners, normal }
    }

    pub fn corners(&self) -> &[Vec3] {
        &self.corners
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Fan triangulation from the first corner.
    pub fn triangulate(
        &self,
        colour: Vec3,
        index_offset: usize,
    ) -> Result<(Vec<Vertex>, Vec<u16>), VertexError> {
        let count = index_offset + self.corners.len();
        if count > MAX_INDEXED_VERTICES {
            return Err(VertexError::TooManyVertices { count });
        }

        let vertices = self
            .corners
            .iter()
            .map(|corner| Vertex::lit(*corner, self.normal, colour))
            .collect();

        // Every index is below `count`, which fits.
        let mut indices = Vec::new();
        for i in 1..self.corners.len().saturating_sub(1) {
            indices.push(index_offset as u16);
            indices.push((index_offset + i) as u16);
            indices.push((index_offset + i + 1) as u16);
        }

        Ok((vertices, indices))
    }
}

/// Built-in solids centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolidKind {
    Tetrahedron,
    Cube,
    Octahedron,
    Dodecahedron,
    Icosahedron,
}

impl FromStr for SolidKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tetrahedron" => Ok(SolidKind::Tetrahedron),
            "cube" => Ok(SolidKind::Cube),
            "octahedron" => Ok(SolidKind::Octahedron),
            "dodecahedron" => Ok(SolidKind::Dodecahedron),
            "icosahedron" => Ok(SolidKind::Icosahedron),
            other => Err(anyhow!(
                "unknown solid {other}. Expected tetrahedron, cube, octahedron, dodecahedron or icosahedron"
            )),
        }
    }
}

/// Flat-shaded solid with a single colour and edge length `size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub kind: SolidKind,
    pub size: f32,
    pub colour: Vec3,
}

impl Solid {
    pub fn new(kind: SolidKind, size: f32, colour: Vec3) -> Self {
        Self { kind, size, colour }
    }

    fn faces(&self) -> Vec<Vec<Vec3>> {
        match self.kind {
            SolidKind::Tetrahedron => {
                let s = self.size / (2.0 * std::f32::consts::SQRT_2);
                let p = [
                    Vec3::new(1.0, 1.0, 1.0) * s,
                    Vec3::new(1.0, -1.0, -1.0) * s,
                    Vec3::new(-1.0, 1.0, -1.0) * s,
                    Vec3::new(-1.0, -1.0, 1.0) * s,
                ];
                [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]]
                    .iter()
                    .map(|face| face.iter().map(|&i| p[i]).collect())
                    .collect()
            }
            SolidKind::Cube => {
                let h = self.size * 0.5;
                let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h, y * h, z * h);
                vec![
                    // +z, -z
                    vec![corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)],
                    vec![corner(-1.0, 1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, -1.0, -1.0), corner(-1.0, -1.0, -1.0)],
                    // +x, -x
                    vec![corner(1.0, -1.0, -1.0), corner(1.0, 1.0, -1.0), corner(1.0, 1.0, 1.0), corner(1.0, -1.0, 1.0)],
                    vec![corner(-1.0, -1.0, 1.0), corner(-1.0, 1.0, 1.0), corner(-1.0, 1.0, -1.0), corner(-1.0, -1.0, -1.0)],
                    // +y, -y
                    vec![corner(1.0, 1.0, -1.0), corner(-1.0, 1.0, -1.0), corner(-1.0, 1.0, 1.0), corner(1.0, 1.0, 1.0)],
                    vec![corner(1.0, -1.0, 1.0), corner(-1.0, -1.0, 1.0), corner(-1.0, -1.0, -1.0), corner(1.0, -1.0, -1.0)],
                ]
            }
            SolidKind::Octahedron => {
                let r = self.size / std::f32::consts::SQRT_2;
                let mut faces = Vec::with_capacity(8);
                for x in [-r, r] {
                    for y in [-r, r] {
                        for z in [-r, r] {
                            faces.push(vec![
                                Vec3::new(x, 0.0, 0.0),
                                Vec3::new(0.0, y, 0.0),
                                Vec3::new(0.0, 0.0, z),
                            ]);
                        }
                    }
                }
                faces
            }
            SolidKind::Dodecahedron => {
                // Cube corners plus three golden rectangles; edge 2/phi before scaling.
                let scale = self.size * PHI * 0.5;
                let mut points = Vec::with_capacity(20);
                for x in [-1.0, 1.0] {
                    for y in [-1.0, 1.0] {
                        for z in [-1.0, 1.0] {
                            points.push(Vec3::new(x, y, z));
                        }
                    }
                }
                points.extend(golden_rectangles(1.0 / PHI, PHI));
                let points: Vec<Vec3> = points.into_iter().map(|p| p * scale).collect();

                // Face centres lie along the vertices of the dual icosahedron.
                golden_rectangles(PHI, 1.0)
                    .into_iter()
                    .map(|direction| pentagon_facing(&points, direction))
                    .collect()
            }
            SolidKind::Icosahedron => {
                // Three golden rectangles; edge 2 before scaling.
                let points: Vec<Vec3> = golden_rectangles(1.0, PHI)
                    .into_iter()
                    .map(|p| p * (self.size * 0.5))
                    .collect();
                let adjacent =
                    |a: Vec3, b: Vec3| ((a - b).length() - self.size).abs() < self.size * 1e-3;

                let mut faces = Vec::with_capacity(20);
                for i in 0..points.len() {
                    for j in i + 1..points.len() {
                        for k in j + 1..points.len() {
                            let (a, b, c) = (points[i], points[j], points[k]);
                            if adjacent(a, b) && adjacent(b, c) && adjacent(a, c) {
                                faces.push(vec![a, b, c]);
                            }
                        }
                    }
                }
                faces
            }
        }
    }
}

/// `(0, ±short, ±long)` and its two cyclic permutations.
fn golden_rectangles(short: f32, long: f32) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(12);
    for a in [-short, short] {
        for b in [-long, long] {
            let p = Vec3::new(0.0, a, b);
            points.extend([p, Vec3::new(p.z, p.x, p.y), Vec3::new(p.y, p.z, p.x)]);
        }
    }
    points
}

/// The five points furthest along `direction`, ordered around their centre.
fn pentagon_facing(points: &[Vec3], direction: Vec3) -> Vec<Vec3> {
    let mut corners = points.to_vec();
    corners.sort_by(|a, b| b.dot(direction).total_cmp(&a.dot(direction)));
    corners.truncate(5);

    let centre = corners.iter().copied().sum::<Vec3>() / 5.0;
    let u = (corners[0] - centre).normalize_or_zero();
    let w = direction.normalize_or_zero().cross(u);
    corners.sort_by(|a, b| {
        let angle = |p: &Vec3| (*p - centre).dot(w).atan2((*p - centre).dot(u));
        angle(a).total_cmp(&angle(b))
    });
    corners
}

impl Geometry for Solid {
    fn geometry(&self) -> Result<(Vec<Vertex>, Vec<u16>), VertexError> {
        let mut mesh = Mesh::default();
        for corners in self.faces() {
            mesh.push_polygon(&Polygon::facing_away_from(corners, Vec3::ZERO), self.colour)?;
        }
        Ok((mesh.vertices, mesh.indices))
    }
}
