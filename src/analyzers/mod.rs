//! Basic Economy detection.
//!
//! Cleaned fare records are grouped per (airline, market, brand), ranked by
//! average price inside each airline's market, scored on price position,
//! availability, refundability, change fees and brand naming, and the highest
//! scoring brand of each market is reported as the Basic Economy product.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod grade;
pub mod rank;
pub mod score;
pub mod types;
pub mod utility;
