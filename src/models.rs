// src/models.rs

pub mod document;
pub mod stock;
pub mod stocktaking;
pub mod warehouse;
