#![doc = include_str!("../README.md")]

/// An [Address] is a 64 bit virtual address. Host pointers are widened to this width.
pub type Address = u64;

mod geometry;
pub use geometry::{compute_page_geometry, PageGeometry};

mod decompose;
pub use decompose::{decompose, format_address, DecomposedAddress};

pub mod utils;
