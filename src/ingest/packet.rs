//! Inbound sensor packet parsing.
//!
//! Packets are flat JSON objects:
//!
//! ```json
//! {"node_id": "drain_a01", "rainfall_mm_hr": 12.5, "water_level_cm": 64.0}
//! ```
//!
//! `node_id` is required. `rainfall_mm_hr` defaults to 0.0 when absent.
//! Every other channel is optional.

use serde::Deserialize;

use crate::model::{EngineError, SensorReading, validate_node_id, validate_rainfall};

#[derive(Debug, Deserialize)]
struct RawPacket {
    node_id: Option<String>,
    rainfall_mm_hr: Option<f64>,
    water_level_cm: Option<f64>,
    flow_rate_lps: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
    temperature_c: Option<f64>,
    humidity_percent: Option<f64>,
}

/// Parses one JSON packet into a reading.
///
/// Returns `MalformedInput` for non-JSON input, a missing or malformed
/// `node_id`, or a negative / non-finite rainfall value.
pub fn parse_packet(json: &str) -> Result<SensorReading, EngineError> {
    let raw: RawPacket = serde_json::from_str(json)
        .map_err(|e| EngineError::MalformedInput(format!("invalid packet: {}", e)))?;

    let node_id = raw
        .node_id
        .ok_or_else(|| EngineError::MalformedInput("node_id is required".to_string()))?;
    validate_node_id(&node_id)?;

    let rainfall = raw.rainfall_mm_hr.unwrap_or(0.0);
    validate_rainfall(rainfall)?;

    Ok(SensorReading {
        node_id,
        rainfall_mm_per_hr: rainfall,
        water_level_cm: raw.water_level_cm,
        flow_rate_lps: raw.flow_rate_lps,
        lat: raw.lat,
        lon: raw.lon,
        temperature_c: raw.temperature_c,
        humidity_percent: raw.humidity_percent,
    })
}

/// Parses newline-delimited packets. Blank lines are skipped; each remaining
/// line yields its 1-based line number and parse result.
pub fn parse_packet_lines(input: &str) -> Vec<(usize, Result<SensorReading, EngineError>)> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, parse_packet(line)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_packet_parses_all_channels() {
        let r = parse_packet(
            r#"{"node_id": "chennai_adyar", "lat": 13.0044, "lon": 80.2534,
                "rainfall_mm_hr": 22.5, "water_level_cm": 30.1, "flow_rate_lps": 90.2}"#,
        )
        .unwrap();
        assert_eq!(r.node_id, "chennai_adyar");
        assert_eq!(r.rainfall_mm_per_hr, 22.5);
        assert_eq!(r.water_level_cm, Some(30.1));
        assert_eq!(r.flow_rate_lps, Some(90.2));
        assert_eq!(r.lat, Some(13.0044));
    }

    #[test]
    fn test_missing_rainfall_defaults_to_zero() {
        let r = parse_packet(r#"{"node_id": "drain_a01", "water_level_cm": 80}"#).unwrap();
        assert_eq!(r.rainfall_mm_per_hr, 0.0);
        assert_eq!(r.water_level_cm, Some(80.0));
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        let r = parse_packet(
            r#"{"node_id": "live_chennai", "rainfall_mm_hr": 5, "temperature_c": 29.5,
                "humidity_percent": 85, "firmware": "1.2.0"}"#,
        )
        .unwrap();
        assert_eq!(r.temperature_c, Some(29.5));
        assert_eq!(r.humidity_percent, Some(85.0));
    }

    #[test]
    fn test_missing_node_id_is_malformed() {
        assert_eq!(
            parse_packet(r#"{"rainfall_mm_hr": 3.0}"#),
            Err(EngineError::MalformedInput("node_id is required".to_string()))
        );
    }

    #[test]
    fn test_empty_node_id_is_malformed() {
        assert!(matches!(
            parse_packet(r#"{"node_id": "", "rainfall_mm_hr": 3.0}"#),
            Err(EngineError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_negative_rainfall_is_malformed() {
        assert!(matches!(
            parse_packet(r#"{"node_id": "n1", "rainfall_mm_hr": -1.0}"#),
            Err(EngineError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_non_numeric_rainfall_is_malformed() {
        assert!(matches!(
            parse_packet(r#"{"node_id": "n1", "rainfall_mm_hr": "heavy"}"#),
            Err(EngineError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_line_parser_skips_blanks_and_keeps_line_numbers() {
        let input = "{\"node_id\": \"a\"}\n\n{\"node_id\": \"b\"}\ngarbage\n";
        let parsed = parse_packet_lines(input);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].0, 1);
        assert_eq!(parsed[1].0, 3);
        assert_eq!(parsed[2].0, 4);
        assert!(parsed[2].1.is_err());
    }
}
