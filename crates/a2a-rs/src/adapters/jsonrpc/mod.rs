pub mod axum;
pub mod utils;
