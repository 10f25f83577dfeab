pub mod tracing;

pub use self::tracing::request_id_middleware;
