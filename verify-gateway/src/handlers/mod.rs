pub mod factor;

pub use factor::{challenge, create_factor, verify_factor};
