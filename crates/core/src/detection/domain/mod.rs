pub mod detection_source;
