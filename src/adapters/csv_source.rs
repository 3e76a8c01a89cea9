use crate::domain::model::{DateRange, Observation};
use crate::domain::ports::Storage;
use crate::utils::error::{AlertError, Result};

/// Parse observations from csv bytes and keep the ones inside `range`.
///
/// The header row must name `id`, `date`, `ship_type`, `lon` and `lat`; column order is
/// free and other columns are ignored. Empty or non-finite coordinates become `None`.
pub fn load_observations(data: &[u8], range: DateRange) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut observations = Vec::new();
    for (index, row) in reader.deserialize::<Observation>().enumerate() {
        let mut observation = row.map_err(|e| AlertError::DataFormatError {
            // 標題列佔第 1 行
            line: e.position().map(|p| p.line()).unwrap_or(index as u64 + 2),
            message: e.to_string(),
        })?;

        observation.lon = observation.lon.filter(|v| v.is_finite());
        observation.lat = observation.lat.filter(|v| v.is_finite());
        observations.push(observation);
    }

    let total = observations.len();
    let observations = filter_on_date(observations, range);
    tracing::debug!(
        "Loaded {} observations ({} inside date range)",
        total,
        observations.len()
    );
    Ok(observations)
}

pub fn filter_on_date(observations: Vec<Observation>, range: DateRange) -> Vec<Observation> {
    observations
        .into_iter()
        .filter(|obs| range.contains(&obs.date))
        .collect()
}

pub async fn read_observations<S: Storage>(
    storage: &S,
    path: &str,
    range: DateRange,
) -> Result<Vec<Observation>> {
    tracing::debug!("Reading observations from {}", path);
    let data = storage.read_file(path).await?;
    load_observations(&data, range)
}
