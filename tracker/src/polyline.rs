use shared::Coordinate;

/// Standard polyline encoding stores coordinates as integers scaled by 10^5.
const PRECISION: f64 = 1e5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolylineError {
    #[error("polyline ends in the middle of a value at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid polyline character {ch:?} at byte {offset}")]
    InvalidCharacter { offset: usize, ch: char },
    #[error("polyline value starting at byte {offset} overflows")]
    Overflow { offset: usize },
    #[error("decoded point #{index} is outside geographic bounds")]
    OutOfBounds { index: usize },
}

/// Decode a precision-5 encoded polyline into `(lat, lng)` pairs.
///
/// Each point is stored as a latitude delta followed by a longitude delta,
/// both zig-zag encoded in 5-bit chunks offset by 63.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut cursor = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;
    let mut points = Vec::new();

    while cursor < bytes.len() {
        lat += next_value(bytes, &mut cursor)?;
        lng += next_value(bytes, &mut cursor)?;

        let coord = Coordinate {
            lat: lat as f64 / PRECISION,
            lng: lng as f64 / PRECISION,
        };
        if !coord.is_valid() {
            return Err(PolylineError::OutOfBounds {
                index: points.len(),
            });
        }
        points.push(coord);
    }

    Ok(points)
}

fn next_value(bytes: &[u8], cursor: &mut usize) -> Result<i64, PolylineError> {
    let start = *cursor;
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*cursor) else {
            return Err(PolylineError::Truncated { offset: start });
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                offset: *cursor,
                ch: byte as char,
            });
        }
        if shift > 30 {
            return Err(PolylineError::Overflow { offset: start });
        }
        *cursor += 1;

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FALLBACK_POLYLINE;

    #[test]
    fn decodes_reference_polyline() {
        let points = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        assert_eq!(points.len(), expected.len());
        for (point, (lat, lng)) in points.iter().zip(expected) {
            assert!((point.lat - lat).abs() < 1e-9, "{point:?}");
            assert!((point.lng - lng).abs() < 1e-9, "{point:?}");
        }
    }

    #[test]
    fn empty_string_decodes_to_nothing() {
        assert_eq!(decode("").unwrap(), Vec::new());
    }

    #[test]
    fn fallback_polyline_is_plausible() {
        let points = decode(FALLBACK_POLYLINE).unwrap();
        assert!(!points.is_empty());
        assert!(points.iter().all(Coordinate::is_valid));
        assert!((points[0].lat - 42.05946).abs() < 1e-9);
        assert!((points[0].lng - 92.5116).abs() < 1e-9);
    }

    #[test]
    fn truncated_value_is_rejected() {
        // '_' has the continuation bit set, so the latitude never terminates.
        assert_eq!(decode("_"), Err(PolylineError::Truncated { offset: 0 }));
        // latitude decodes but the longitude is missing
        assert_eq!(decode("??"), Ok(vec![Coordinate { lat: 0.0, lng: 0.0 }]));
        assert_eq!(decode("?"), Err(PolylineError::Truncated { offset: 1 }));
    }

    #[test]
    fn control_characters_are_rejected() {
        assert_eq!(
            decode("?\n"),
            Err(PolylineError::InvalidCharacter { offset: 1, ch: '\n' })
        );
    }

    #[test]
    fn endless_continuation_overflows() {
        let encoded = "~".repeat(16);
        assert_eq!(decode(&encoded), Err(PolylineError::Overflow { offset: 0 }));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_decode_never_panics(input in "[?-~]{0,64}") {
                if let Ok(points) = decode(&input) {
                    prop_assert!(points.iter().all(Coordinate::is_valid));
                }
            }
        }
    }
}
