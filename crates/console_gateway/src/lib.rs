//! Console gateway: HTTP access to the scraping service and effect execution.
mod engine;
mod gateway;
mod persist;
mod types;

pub use engine::Engine;
pub use gateway::{Gateway, GatewaySettings, ReqwestGateway, DEFAULT_BASE_URL};
pub use persist::{AtomicFileWriter, PersistError, SelectionStore};
pub use types::GatewayError;
