//! Well-known-text point grammar
//!
//! `POINT(<x> <y>)`, keyword case-insensitive, whitespace tolerant, finite
//! coordinates only. `POINT EMPTY` and Z/M variants are rejected because they
//! cannot be represented as a two-dimensional [`Point`].

use crate::contract::{DbValue, MappingError, Point};

pub(crate) const GRAMMAR: &str = "WKT point";

/// Write-side WKT text for a point bound through `ST_GeomFromText`
pub(crate) fn literal(point: Point) -> Result<DbValue, MappingError> {
    if point.is_finite() {
        Ok(DbValue::Text(point.to_wkt()))
    } else {
        Err(MappingError::conversion("", "point", "coordinates must be finite"))
    }
}

/// Parse a WKT point literal
pub(crate) fn parse_point(text: &str) -> Result<Point, String> {
    let text = text.trim();
    let rest = text
        .get(..5)
        .filter(|keyword| keyword.eq_ignore_ascii_case("POINT"))
        .map(|_| text[5..].trim_start())
        .ok_or_else(|| "expected POINT keyword".to_string())?;

    let body = rest
        .strip_prefix('(')
        .ok_or_else(|| "expected '(' after POINT".to_string())?
        .strip_suffix(')')
        .ok_or_else(|| "expected closing ')'".to_string())?;

    let mut coords = body.split_whitespace();
    let (Some(x), Some(y), None) = (coords.next(), coords.next(), coords.next()) else {
        return Err("expected exactly two coordinates".to_string());
    };

    Ok(Point::new(parse_coordinate(x)?, parse_coordinate(y)?))
}

/// Split an EWKT `SRID=<n>;` prefix off a literal
pub(crate) fn split_srid(text: &str) -> Result<(Option<u32>, &str), String> {
    let trimmed = text.trim_start();
    let Some(tagged) = trimmed
        .get(..5)
        .filter(|tag| tag.eq_ignore_ascii_case("SRID="))
        .map(|_| &trimmed[5..])
    else {
        return Ok((None, text));
    };

    let (srid, rest) = tagged
        .split_once(';')
        .ok_or_else(|| "expected ';' after SRID".to_string())?;
    let srid = srid
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid SRID: {e}"))?;
    Ok((Some(srid), rest))
}

fn parse_coordinate(token: &str) -> Result<f64, String> {
    let value = token
        .parse::<f64>()
        .map_err(|_| format!("invalid coordinate '{token}'"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("coordinate '{token}' is not finite"))
    }
}
