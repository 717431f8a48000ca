//! Chart layout planning.
//!
//! Derives presentation metadata from the aggregated daily points: label
//! placement, weekend marks, title text, series colours and axis sizing. The
//! planner is total; an empty point sequence gives an empty tick set and a
//! zero-height axis.
//!
//! - [`title`] - title and subtitle text
//! - [`density`] - font scale, rotation and canvas size by date count

pub mod density;
pub mod title;

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::models::{AggregatedPoint, FilterCriteria};
use crate::transform::pivot::DATE_LABEL_FORMAT;

pub use density::{CanvasSize, DensityBand};
pub use title::compose_title;

/// Where a point's value label sits relative to its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPoint {
    pub date: NaiveDate,
    pub coupon_name: String,
    pub quantity: u64,
    pub label_position: LabelPosition,
    pub is_weekend: bool,
}

/// One date-axis tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisTick {
    pub date: NaiveDate,
    /// `%d-%b`, e.g. `06-Jan`.
    pub label: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    pub coupon: String,
    pub color: String,
}

/// Everything a renderer needs to draw the daily trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub title: String,
    pub subtitle: String,
    /// Same order as the aggregated input: date, then coupon.
    pub points: Vec<PlotPoint>,
    pub axis_ticks: Vec<AxisTick>,
    pub axis_tick_count: usize,
    pub density: DensityBand,
    pub recommended_font_scale: f64,
    /// Degrees.
    pub recommended_rotation: i32,
    /// First weekend date, anchoring the single "weekend" annotation.
    pub weekend_annotation: Option<NaiveDate>,
    /// One per coupon, sorted by name.
    pub series: Vec<SeriesStyle>,
    /// Max quantity plus 20% headroom, rounded up.
    pub y_axis_max: u64,
    pub canvas: CanvasSize,
}

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() >= 6
}

/// `Below` only above 75% of `max`; everything else, including the low end
/// under 15%, stays `Above`.
pub fn label_position(quantity: u64, max: u64) -> LabelPosition {
    if u128::from(quantity) * 4 > u128::from(max) * 3 {
        LabelPosition::Below
    } else {
        LabelPosition::Above
    }
}

/// `ceil(max * 1.2)` in integers.
fn y_axis_max(max: u64) -> u64 {
    let scaled = (u128::from(max) * 6).div_ceil(5);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Plan the chart for `points`, which must be in aggregator order.
///
/// `known_stores` is the full store list of the loaded data; selecting all of
/// them reads as "All Stores" in the subtitle.
pub fn plan_layout(
    points: &[AggregatedPoint],
    criteria: &FilterCriteria,
    known_stores: &[String],
    config: &ReportConfig,
) -> ChartLayout {
    let options = config.layout;
    let max = points.iter().map(|p| p.total_quantity).max().unwrap_or(0);

    let plot_points: Vec<PlotPoint> = points
        .iter()
        .map(|p| PlotPoint {
            date: p.date,
            coupon_name: p.coupon_name.clone(),
            quantity: p.total_quantity,
            label_position: label_position(p.total_quantity, max),
            is_weekend: is_weekend(p.date),
        })
        .collect();

    let dates: BTreeSet<NaiveDate> = points.iter().map(|p| p.date).collect();
    let axis_ticks: Vec<AxisTick> = dates
        .iter()
        .map(|&date| AxisTick {
            date,
            label: date.format(DATE_LABEL_FORMAT).to_string(),
            highlighted: options.weekend_shading && is_weekend(date),
        })
        .collect();
    let weekend_annotation = if options.weekend_shading {
        dates.iter().copied().find(|d| is_weekend(*d))
    } else {
        None
    };

    let density = if options.density_sizing {
        DensityBand::for_date_count(dates.len())
    } else {
        DensityBand::Dense
    };

    let coupons: BTreeSet<&str> = points.iter().map(|p| p.coupon_name.as_str()).collect();
    let series = coupons
        .into_iter()
        .enumerate()
        .map(|(i, coupon)| SeriesStyle {
            coupon: coupon.to_string(),
            color: config
                .palette
                .get(i % config.palette.len().max(1))
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    let (title, subtitle) = compose_title(criteria, known_stores, config);

    ChartLayout {
        title,
        subtitle,
        points: plot_points,
        axis_tick_count: axis_ticks.len(),
        axis_ticks,
        density,
        recommended_font_scale: density.font_scale(),
        recommended_rotation: density.rotation(),
        weekend_annotation,
        series,
        y_axis_max: y_axis_max(max),
        canvas: CanvasSize::for_date_count(dates.len()),
    }
}
