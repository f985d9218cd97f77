pub mod cache;
pub mod config;
pub mod error;
pub mod models {
    pub mod post;
    pub mod settings;
}
pub mod notion {
    pub mod client;
    pub mod types;
}
pub mod repository;
pub mod subscribe;
pub mod summary;
