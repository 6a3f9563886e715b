//! Pure domain logic: geo resolution, fee computation, the flash-sale
//! lifecycle and its auto-generation planner. No I/O in this tree.

pub mod catalog;
pub mod fee;
pub mod flash_sale;
pub mod generator;
pub mod geo;
