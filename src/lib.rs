//! # a4-draft – A4 rich-text paginator and image-based PDF exporter
//!
//! Editor markup flows through these stages:
//!
//! 1. **Parse** – markup string → DOM tree ([`dom`])
//! 2. **Style** – inline styles and editor classes ([`style`])
//! 3. **Measure** – rendered block heights via Taffy layout ([`layout`], [`measure`])
//! 4. **Paginate** – split blocks into A4 page fragments ([`paginate`])
//! 5. **Preview** – one bordered sheet per fragment ([`preview`])
//! 6. **Export** – rasterize the preview and place it on A4 PDF pages ([`raster`], [`export`])
//!
//! Drafts persist through a key-value store ([`storage`]), UI strings come
//! from [`i18n`], and [`controller`] runs the save / reset / export commands.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod dom;
pub mod error;
pub mod export;
pub mod fonts;
pub mod i18n;
pub mod layout;
pub mod measure;
pub mod paginate;
pub mod pipeline;
pub mod preview;
pub mod raster;
pub mod storage;
pub mod style;
pub mod templates;
pub mod units;

// Re-exports for convenience
pub use config::AppConfig;
pub use controller::{Commands, Controller, Notice, OperationKind};
pub use error::{Error, Result};
pub use paginate::{paginate, PageBudget, Pages};
pub use pipeline::{generate_pdf, generate_pdf_from_html};
