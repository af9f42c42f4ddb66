#![forbid(unsafe_code)]

pub mod credentials;
pub mod gateway;
pub mod http;

pub use credentials::{CredentialProvider, StaticToken};
pub use gateway::{ApiError, AttemptGateway, Backend, InMemoryGateway, TestGateway};
pub use http::{HttpConfig, HttpGateway, HttpInitError};
