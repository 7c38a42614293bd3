mod server_config;
pub use server_config::*;

mod pipeline_config;
pub use pipeline_config::*;
