//! Plain text point clouds.
//!
//! The format is a point count on the first line followed by one point per
//! line, three whitespace separated coordinates each:
//!
//! ```text
//! 3
//! 0.0 0.0 0.0
//! 1.0 0.0 0.0
//! 0.0 1.0 0.0
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::pointcloud::PointCloud;

const MAX_POINTS: usize = 50_000_000;

/// Error types for the text point cloud module.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TxtError {
    /// Failed to read or write the file
    #[error("Failed to access point cloud file")]
    Io(#[from] std::io::Error),

    /// The file holds no point count
    #[error("Missing point count header")]
    MissingHeader,

    /// The point count is not a valid number
    #[error("Invalid point count header. Got: {0}")]
    InvalidHeader(String),

    /// The file ends before all announced points were read
    #[error("Expected {expected} points, found {found}")]
    UnexpectedEof {
        /// Announced number of points.
        expected: usize,
        /// Number of points actually read.
        found: usize,
    },

    /// A point line does not hold three coordinates
    #[error("Invalid point at line {line}: {content}")]
    InvalidPoint {
        /// One based line number.
        line: usize,
        /// The offending line.
        content: String,
    },
}

fn parse_point(line: &str) -> Option<[f64; 3]> {
    let mut it = line.split_whitespace().map(|v| v.parse::<f64>());
    match (it.next(), it.next(), it.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Some([x, y, z]),
        _ => None,
    }
}

/// Parse a text point cloud from a buffered reader.
///
/// Blank lines are skipped and anything after the announced number of points
/// is ignored.
pub fn parse_txt_points<R: BufRead>(reader: R) -> Result<PointCloud, TxtError> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|l| (i + 1, l)))
        .filter(|line| !matches!(line, Ok((_, l)) if l.trim().is_empty()));

    let num_points = match lines.next() {
        None => return Err(TxtError::MissingHeader),
        Some(line) => {
            let (_, header) = line?;
            let header = header.trim();
            header
                .parse::<usize>()
                .map_err(|_| TxtError::InvalidHeader(header.to_string()))?
        }
    };

    if num_points > MAX_POINTS {
        return Err(TxtError::InvalidHeader(num_points.to_string()));
    }

    let mut points = Vec::with_capacity(num_points);
    while points.len() < num_points {
        let (line_number, content) = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(TxtError::UnexpectedEof {
                    expected: num_points,
                    found: points.len(),
                })
            }
        };
        let point = parse_point(&content).ok_or_else(|| TxtError::InvalidPoint {
            line: line_number,
            content: content.clone(),
        })?;
        points.push(point);
    }

    Ok(PointCloud::new(points))
}

/// Read a text point cloud file.
///
/// # Arguments
///
/// * `path` - The path to the text file.
///
/// # Returns
///
/// A `PointCloud` with the points in file order.
pub fn read_txt_points(path: impl AsRef<Path>) -> Result<PointCloud, TxtError> {
    let file = File::open(path)?;
    parse_txt_points(BufReader::new(file))
}

/// Write a point cloud in the text format read by [`read_txt_points`].
pub fn write_txt_points(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<(), TxtError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", cloud.len())?;
    for p in cloud.points() {
        writeln!(writer, "{} {} {}", p[0], p[1], p[2])?;
    }
    writer.flush()?;
    Ok(())
}
