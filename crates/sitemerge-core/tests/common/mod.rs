pub mod log_capture;
pub mod sitemap_server;
