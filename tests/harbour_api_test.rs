use anyhow::Result;
use harbour_watch::adapters::geojson::GeoJsonHarbourStore;
use harbour_watch::domain::harbour::{MovementKind, Ship};
use harbour_watch::domain::model::parse_date;
use harbour_watch::{AlertError, HarbourApi, LocalStorage};
use tempfile::TempDir;

const HARBOURS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {
        "id": "naboo",
        "name": "Theed",
        "piers": [
          {"id": "north", "berths": [
            {"id": "n1", "length": 40.0, "equipments": {"fuel": "yes"}},
            {"id": "n2", "length": 150.0}
          ]}
        ]
      },
      "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}
    },
    {
      "type": "Feature",
      "id": "tatooine",
      "properties": {"name": "Mos Eisley"},
      "geometry": {"type": "Polygon", "coordinates": [[[10,10],[12,10],[12,12],[10,12],[10,10]]]}
    }
  ]
}"#;

fn ship(id: &str, length: f64) -> Ship {
    Ship {
        id: id.to_string(),
        name: id.to_string(),
        ship_type: "freighter".to_string(),
        length,
    }
}

#[tokio::test]
async fn test_harbour_registry_from_geojson() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("harbours.geojson"), HARBOURS)?;

    let store = GeoJsonHarbourStore::new(LocalStorage::new(temp_dir.path()), "harbours.geojson");
    let mut api = HarbourApi::load(&store).await?;

    assert_eq!(api.list().len(), 2);
    assert!(api.movements().is_empty());
    assert_eq!(api.find_by_name("mos eisley").unwrap().id, "tatooine");
    assert_eq!(api.locate(1.0, 1.0).unwrap().name, "Theed");
    assert_eq!(api.locate(11.0, 11.5).unwrap().id, "tatooine");
    assert!(api.locate(5.0, 5.0).is_none());

    let arrival = parse_date("2020-04-01 06:00:00").unwrap();
    let departure = parse_date("2020-04-03 18:00:00").unwrap();

    let falcon = ship("falcon", 35.0);
    let cruiser = ship("cruiser", 120.0);
    assert_eq!(api.dock("naboo", &falcon, arrival)?.berth, "n1");
    assert_eq!(api.dock("naboo", &cruiser, arrival)?.berth, "n2");

    let theed = api.get("naboo")?;
    assert_eq!(theed.free_berths().count(), 0);
    assert_eq!(theed.piers[0].berths[0].equipments.get("fuel").map(String::as_str), Some("yes"));

    // Mos Eisley has no berths at all
    assert!(matches!(
        api.dock("tatooine", &ship("skiff", 10.0), arrival),
        Err(AlertError::NoBerthAvailable { .. })
    ));

    api.undock("naboo", "falcon", departure)?;
    assert_eq!(api.get("naboo")?.free_berths().count(), 1);

    let kinds: Vec<MovementKind> = api.movements().all().iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![MovementKind::Arrival, MovementKind::Arrival, MovementKind::Departure]
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_harbours_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = GeoJsonHarbourStore::new(LocalStorage::new(temp_dir.path()), "nope.geojson");
    assert!(matches!(
        HarbourApi::load(&store).await,
        Err(AlertError::IoError(_))
    ));
    Ok(())
}
