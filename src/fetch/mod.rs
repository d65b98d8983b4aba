pub mod error;
pub mod event;
pub mod fetcher;
pub mod request;
pub mod state;
pub mod util;
pub mod worker;

pub use error::FetchError;
pub use event::{FetchEvent, FetchEventKind, FetchProgress};
pub use fetcher::Fetcher;
pub use request::FetchRequest;
pub use state::FetchState;
pub use worker::FetchHandle;
