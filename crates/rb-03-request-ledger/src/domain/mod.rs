pub mod request;

pub use request::{Request, RequestStatus};
