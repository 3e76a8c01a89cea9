// Adapters layer: concrete implementations for external systems (files, csv, geojson).

pub mod csv_source;
pub mod geojson;
pub mod storage;
