pub mod app;
pub mod config;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod routing;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use store::HabitStore;
