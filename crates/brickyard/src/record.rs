//! Placement record parser.
//!
//! A placement line has the layout
//!
//! ```text
//! 1 <color> <x> <y> <z> <a> <b> <c> <d> <e> <f> <g> <h> <i> <part>.<ext>
//! ```
//!
//! where `a..i` are the rows of the part's rotation+scale matrix. Every
//! other line type (comments, meta commands, lines, triangles) is ignored.

use std::collections::BTreeMap;

use brickyard_math::{Mat3, Vec3};

use crate::error::RecordError;

/// First token of a placement line.
pub const PLACEMENT_MARKER: &str = "1";

/// Token count of a complete placement line, marker included.
pub const PLACEMENT_TOKENS: usize = 15;

/// File extensions removed from part identifiers.
const PART_EXTENSIONS: [&str; 3] = ["dat", "ldr", "mpd"];

const POSITION_FIELDS: [&str; 3] = ["x", "y", "z"];
const MATRIX_FIELDS: [&str; 9] = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];

/// One parsed placement line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
    /// Numeric color code.
    pub color: i32,
    /// Position in file units.
    pub position: Vec3,
    /// Combined rotation+scale matrix, rows as written in the file.
    pub matrix: Mat3,
    /// Part identifier with its extension removed.
    pub part_id: String,
}

/// Parse a single line.
///
/// Returns `Ok(None)` for lines that are not placements at all, and an
/// error for placement lines that cannot be used.
pub fn parse_line(line: &str) -> Result<Option<PlacementRecord>, RecordError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first() != Some(&PLACEMENT_MARKER) {
        return Ok(None);
    }
    if tokens.len() < PLACEMENT_TOKENS {
        return Err(RecordError::TooFewTokens {
            found: tokens.len(),
        });
    }

    let color = tokens[1]
        .parse::<i32>()
        .map_err(|_| RecordError::InvalidColor {
            token: tokens[1].to_string(),
        })?;

    let mut position = Vec3::zeros();
    for (i, field) in POSITION_FIELDS.iter().enumerate() {
        position[i] = parse_number(field, tokens[2 + i])?;
    }

    let mut coefficients = [0.0; 9];
    for (i, field) in MATRIX_FIELDS.iter().enumerate() {
        coefficients[i] = parse_number(field, tokens[5 + i])?;
    }

    let part_id = strip_extension(tokens[14]);
    if part_id.is_empty() {
        return Err(RecordError::EmptyPartId);
    }

    Ok(Some(PlacementRecord {
        color,
        position,
        matrix: Mat3::from_row_slice(&coefficients),
        part_id: part_id.to_string(),
    }))
}

/// Iterate over the placement candidates in `text`.
///
/// Yields `(line_number, result)` with 1-based line numbers; lines that are
/// not placements are skipped. A leading byte-order mark is ignored.
pub fn records(text: &str) -> impl Iterator<Item = (usize, Result<PlacementRecord, RecordError>)> + '_ {
    strip_bom(text)
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match parse_line(line) {
            Ok(None) => None,
            Ok(Some(record)) => Some((i + 1, Ok(record))),
            Err(e) => Some((i + 1, Err(e))),
        })
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Remove a known part-file extension (case-insensitive).
pub fn strip_extension(token: &str) -> &str {
    match token.rsplit_once('.') {
        Some((stem, ext))
            if PART_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => token,
    }
}

fn parse_number(field: &'static str, token: &str) -> Result<f64, RecordError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RecordError::InvalidNumber {
            field,
            token: token.to_string(),
        }),
    }
}

/// Line counts for a model file, without resolving anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStats {
    /// Total lines.
    pub lines: usize,
    /// Valid placement lines.
    pub placements: usize,
    /// Placement lines that were rejected.
    pub malformed: usize,
    /// Placements per part identifier.
    pub parts: BTreeMap<String, usize>,
    /// Placements per color code.
    pub colors: BTreeMap<i32, usize>,
}

/// Count placements, rejects, parts and colors in `text`.
pub fn scan(text: &str) -> RecordStats {
    let mut stats = RecordStats {
        lines: text.lines().count(),
        ..Default::default()
    };
    for (_, result) in records(text) {
        match result {
            Ok(record) => {
                stats.placements += 1;
                *stats.parts.entry(record.part_id).or_default() += 1;
                *stats.colors.entry(record.color).or_default() += 1;
            }
            Err(_) => stats.malformed += 1,
        }
    }
    stats
}
