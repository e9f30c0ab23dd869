//! Frame annotation from process memory maps
//!
//! Raw instruction pointers become [`Frame`](crate::domain::Frame)s carrying
//! the owning module and the module-relative address. Symbol names are left
//! to whatever produced the samples; nothing here reads ELF or DWARF.

pub mod memory_maps;

pub use memory_maps::{MemoryMapping, ModuleMap};
