//! Cache inspection tools.

pub mod generations;

pub use generations::generations_impl;
