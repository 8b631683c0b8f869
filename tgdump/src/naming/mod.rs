//! Filesystem-safe naming of dump destinations.

mod normalizer;

pub use normalizer::NameNormalizer;
