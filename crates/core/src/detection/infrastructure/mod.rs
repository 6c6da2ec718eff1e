pub mod jsonl_detection_reader;
