pub mod level_meter;
