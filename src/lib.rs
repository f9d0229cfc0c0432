pub mod catalog;
pub mod cli;
pub mod color;
pub mod config;
pub mod database;
pub mod models;
pub mod render;
pub mod session;
pub mod store;
pub mod utils;

pub use catalog::Layout;
pub use config::Config;
pub use database::Database;
pub use models::{CustomTemplate, Invoice, InvoiceItem};
pub use session::CurrentInvoice;
pub use store::InvoiceStore;
pub use utils::Profile;
