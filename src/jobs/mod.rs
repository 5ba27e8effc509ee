pub mod fine_refresh;

pub use fine_refresh::start_fine_refresher;
