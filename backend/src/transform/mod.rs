//! Transformation stages.
//!
//! - Normalize: raw coupon identifiers to canonical names
//! - Filter: store, coupon and date selection
//! - Aggregate: (date, coupon) to summed quantity
//! - Pivot: date x coupon and store x coupon cross-tabs
//! - Summary: headline figures
//! - Pipeline: load and report orchestration

pub mod aggregate;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod pivot;
pub mod summary;

pub use aggregate::aggregate;
pub use filter::filter;
pub use normalize::normalize;
pub use pipeline::*;
pub use pivot::{
    date_coupon_matrix, store_coupon_matrix, DateCouponMatrix, StoreCouponMatrix, StoreRow,
};
pub use summary::Summary;
