//! Hour-bucketed price history and the merged display view.

use pulse_core::time_util::hour_bucket;
use pulse_core::types::{PricePoint, PriceTick, Snapshot, TickSource};

/// Hourly price history with a strictly increasing time axis.
///
/// The chart widget consumes this as-is and never re-sorts, so every
/// mutation here must preserve ordering.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole series. Input points are sorted and deduplicated
    /// by hour bucket (the last value in a bucket wins).
    pub fn replace(&mut self, mut points: Vec<PricePoint>) {
        points.sort_by_key(|p| p.time);
        self.points.clear();
        for point in points {
            match self.points.last_mut() {
                Some(last) if hour_bucket(last.time) == hour_bucket(point.time) => *last = point,
                _ => self.points.push(point),
            }
        }
    }

    /// Fold a live tick into the final bucket.
    ///
    /// Returns `true` when the series changed. A tick outside the last
    /// bucket is dropped — appending it would break time ordering, and the
    /// next chart refetch covers that bucket anyway.
    pub fn apply_tick(&mut self, tick: &PriceTick) -> bool {
        let Some(last) = self.points.last_mut() else {
            return false;
        };
        let tick_secs = (tick.observed_at_ms / 1000) as i64;
        if hour_bucket(tick_secs) != hour_bucket(last.time) {
            return false;
        }
        last.value = tick.value;
        true
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Merged view of snapshot, history, and live ticks for one coin.
///
/// Snapshot refreshes are wholesale. The live price rides on top and also
/// updates the final history bucket; replacing the series drops any live
/// state that belonged to the previous one.
#[derive(Debug, Clone, Default)]
pub struct MarketView {
    snapshot: Option<Snapshot>,
    series: PriceSeries,
    live_price: Option<f64>,
    connected: bool,
}

impl MarketView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn replace_series(&mut self, points: Vec<PricePoint>) {
        self.series.replace(points);
        self.live_price = None;
    }

    pub fn apply_tick(&mut self, tick: PriceTick) {
        if tick.source == TickSource::Stream {
            self.live_price = Some(tick.value);
        }
        self.series.apply_tick(&tick);
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    /// Best current price: the latest live tick when streaming, otherwise
    /// the snapshot.
    pub fn current_price(&self) -> Option<f64> {
        self.live_price.or_else(|| self.snapshot.map(|s| s.usd))
    }
}
