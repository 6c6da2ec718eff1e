pub mod frame_identifier;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod reidentify_use_case;
