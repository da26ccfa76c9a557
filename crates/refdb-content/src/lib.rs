//! Content-path formats: finding and rewriting references inside resource files

pub mod atomic;
pub mod json;
pub mod router;
pub mod xml;


pub use json::{JsonContentPathModifier, CONTENT_PATH_KEY};
pub use router::ExtensionRouter;
pub use xml::{XmlContentPathModifier, CONTENT_PATH_ELEMENT};
