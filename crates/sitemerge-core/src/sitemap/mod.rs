//! Sitemap protocol documents (read and write).
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/posts/hello</loc>
//!     <lastmod>2025-01-01T00:00:00+00:00</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>0.8</priority>
//!   </url>
//! </urlset>
//! ```

mod parse;
mod write;

pub use parse::{parse_sitemap, parse_sitemap_report, ParseReport};
pub use write::{backup_path, render_sitemap, write_sitemap, WriteReport};

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
