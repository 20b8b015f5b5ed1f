pub mod config;
pub mod logging;

pub mod fetch;
pub mod interrupt;
pub mod lock;
pub mod merge;
pub mod pipeline;
pub mod record;
pub mod retry;
pub mod sitemap;
