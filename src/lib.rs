pub mod config;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod physics;
pub mod render;
pub mod source;
pub mod util;
pub mod view;

pub use config::{ColorBy, GraphConfig, LiveConfig};
pub use error::DataFetchError;
pub use view::{GraphView, ViewStatus};
