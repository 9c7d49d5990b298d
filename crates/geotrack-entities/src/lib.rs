pub mod devices;
pub mod locations;
