pub mod factory;
pub mod registry;
pub mod traits;
pub mod types;
pub mod url_fetch;
pub mod web_search;

pub use factory::default_tools;
pub use registry::ToolRegistry;
pub use traits::{Tool, parse_args};
pub use types::{ToolOutput, ToolSpec};
pub use url_fetch::UrlFetchTool;
pub use web_search::WebSearchTool;
