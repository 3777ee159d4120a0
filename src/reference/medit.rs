//! Medit ASCII reader/writer for `.mesh` surface meshes and `.sol` fields.

use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::error::{AdaptError, AdaptResult};
use crate::mesh::{FieldRole, Point, SolutionField, SurfaceMesh, Triangle};

/// Number of tokens per record of sections read but not kept.
fn skipped_section_width(keyword: &str) -> Option<usize> {
    match keyword {
        "edges" => Some(3),
        "corners" | "requiredvertices" | "ridges" | "requirededges" | "requiredtriangles" => {
            Some(1)
        }
        "normals" | "tangents" => Some(3),
        "normalatvertices" | "tangentatvertices" => Some(2),
        "quadrilaterals" => Some(5),
        _ => None,
    }
}

fn read_text(path: &Path) -> AdaptResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AdaptError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => AdaptError::read(path, e.to_string()),
    })
}

/// Strip `#` comments and split into tokens.
fn tokenize(text: &str) -> Vec<&str> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace)
        .collect()
}

struct Cursor<'a, 'p> {
    path: &'p Path,
    tokens: std::vec::IntoIter<&'a str>,
}

impl<'a> Cursor<'a, '_> {
    fn next(&mut self) -> Option<&'a str> {
        self.tokens.next()
    }

    fn value<T: std::str::FromStr>(&mut self, what: &str) -> AdaptResult<T> {
        let token = self.next().ok_or_else(|| {
            AdaptError::read(self.path, format!("unexpected end of file reading {what}"))
        })?;
        token
            .parse()
            .map_err(|_| AdaptError::read(self.path, format!("invalid {what} `{token}`")))
    }
}

pub fn load_mesh(path: &Path) -> AdaptResult<SurfaceMesh> {
    let text = read_text(path)?;
    let mut cur = Cursor {
        path,
        tokens: tokenize(&text).into_iter(),
    };
    let mut mesh = SurfaceMesh::default();

    while let Some(keyword) = cur.next() {
        match keyword.to_lowercase().as_str() {
            "meshversionformatted" => {
                let _: u32 = cur.value("version")?;
            }
            "dimension" => {
                let dim: u32 = cur.value("dimension")?;
                if dim != 3 {
                    return Err(AdaptError::read(path, format!("unsupported dimension {dim}")));
                }
            }
            "vertices" => {
                let n: usize = cur.value("vertex count")?;
                for _ in 0..n {
                    let coords = [cur.value("x")?, cur.value("y")?, cur.value("z")?];
                    let reference = cur.value("vertex reference")?;
                    mesh.points.push(Point { coords, reference });
                }
            }
            "triangles" => {
                let n: usize = cur.value("triangle count")?;
                for _ in 0..n {
                    let mut vertices = [0usize; 3];
                    for v in &mut vertices {
                        let index: usize = cur.value("triangle vertex")?;
                        *v = index
                            .checked_sub(1)
                            .ok_or_else(|| AdaptError::read(path, "vertex indices start at 1"))?;
                    }
                    let reference = cur.value("triangle reference")?;
                    mesh.triangles.push(Triangle { vertices, reference });
                }
            }
            "end" => break,
            other => {
                let width = skipped_section_width(other).ok_or_else(|| {
                    AdaptError::read(path, format!("unsupported keyword `{keyword}`"))
                })?;
                let n: usize = cur.value("record count")?;
                for _ in 0..n.saturating_mul(width) {
                    if cur.next().is_none() {
                        let detail = format!("truncated `{keyword}` section");
                        return Err(AdaptError::read(path, detail));
                    }
                }
            }
        }
    }

    let np = mesh.points.len();
    if mesh
        .triangles
        .iter()
        .any(|t| t.vertices.iter().any(|&v| v >= np))
    {
        return Err(AdaptError::read(path, "triangle references a missing vertex"));
    }
    Ok(mesh)
}

pub fn load_solution(path: &Path, role: FieldRole) -> AdaptResult<SolutionField> {
    let text = read_text(path)?;
    let mut cur = Cursor {
        path,
        tokens: tokenize(&text).into_iter(),
    };
    let mut values = None;

    while let Some(keyword) = cur.next() {
        match keyword.to_lowercase().as_str() {
            "meshversionformatted" => {
                let _: u32 = cur.value("version")?;
            }
            "dimension" => {
                let _: u32 = cur.value("dimension")?;
            }
            "solatvertices" => {
                let n: usize = cur.value("solution count")?;
                let nsols: usize = cur.value("number of fields")?;
                let kind: u32 = cur.value("field type")?;
                if nsols != 1 || kind != 1 {
                    return Err(AdaptError::read(
                        path,
                        "WRONG DATA TYPE: a single scalar field is expected",
                    ));
                }
                let mut read = Vec::new();
                for _ in 0..n {
                    read.push(cur.value("solution value")?);
                }
                values = Some(read);
            }
            "end" => break,
            _ => return Err(AdaptError::read(path, format!("unsupported keyword `{keyword}`"))),
        }
    }

    let values = values.ok_or_else(|| AdaptError::read(path, "no SolAtVertices section"))?;
    Ok(SolutionField::new(role, values))
}

fn create(path: &Path) -> AdaptResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| AdaptError::CannotOpenOutput {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_mesh(path: &Path, mesh: &SurfaceMesh) -> AdaptResult<()> {
    let mut out = create(path)?;
    write_mesh(&mut out, mesh)
        .and_then(|()| out.flush())
        .map_err(|e| AdaptError::write(path, e.to_string()))
}

fn write_mesh(out: &mut impl Write, mesh: &SurfaceMesh) -> io::Result<()> {
    writeln!(out, "MeshVersionFormatted 2\n\nDimension 3\n")?;
    writeln!(out, "Vertices\n{}", mesh.points.len())?;
    for p in &mesh.points {
        let [x, y, z] = p.coords;
        writeln!(out, "{x} {y} {z} {}", p.reference)?;
    }
    writeln!(out, "\nTriangles\n{}", mesh.triangles.len())?;
    for t in &mesh.triangles {
        let [a, b, c] = t.vertices;
        writeln!(out, "{} {} {} {}", a + 1, b + 1, c + 1, t.reference)?;
    }
    writeln!(out, "\nEnd")
}

pub fn save_solution(path: &Path, field: &SolutionField) -> AdaptResult<()> {
    let mut out = create(path)?;
    write_solution(&mut out, field)
        .and_then(|()| out.flush())
        .map_err(|e| AdaptError::write(path, e.to_string()))
}

fn write_solution(out: &mut impl Write, field: &SolutionField) -> io::Result<()> {
    writeln!(out, "MeshVersionFormatted 2\n\nDimension 3\n")?;
    writeln!(out, "SolAtVertices\n{}\n1 1\n", field.values.len())?;
    for v in &field.values {
        writeln!(out, "{v}")?;
    }
    writeln!(out, "\nEnd")
}
