pub mod actions;
pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod render;
pub mod state;
pub mod tickers;

pub use actions::*;
pub use reducer::*;
pub use state::*;

pub use config::Config;
pub use error::ForecastError;
pub use error::ValidationError;
pub use model::*;
pub use persistence::*;
pub use render::render;
pub use render::to_plain_text;
pub use render::ViewNode;
