/// Ingestion boundary.
///
/// Converts inbound data into `SensorReading`s. Nothing here touches the
/// history store; callers hand the readings to `FloodEngine::ingest`.
///
/// Submodules:
/// - `packet` — JSON packets pushed by field sensors and simulators.
/// - `openweather` — current conditions pulled from OpenWeatherMap.

pub mod openweather;
pub mod packet;
