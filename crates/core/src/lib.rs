//! Core domain logic for pinboard: pin placement on images, coordinate
//! mapping, the zoom/pan viewport, the headless editor session and the share
//! wire types. No I/O happens in this crate.

pub mod coords;
pub mod editor;
pub mod error;
pub mod gesture;
pub mod mode;
pub mod pins;
pub mod probe;
pub mod share;
pub mod types;
pub mod viewport;
