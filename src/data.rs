pub mod osm;
pub mod rows;
