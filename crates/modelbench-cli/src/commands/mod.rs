pub mod post_process;
pub mod upload;
