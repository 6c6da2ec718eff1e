pub mod jsonl_annotation_writer;
