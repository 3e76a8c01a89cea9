// Domain layer: models, geometry and ports. Nothing here touches the filesystem.

pub mod geo;
pub mod harbour;
pub mod model;
pub mod ports;
