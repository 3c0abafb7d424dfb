//! Running delivery fee and delivery time aggregates.

use serde::Serialize;

/// Sums and counts over first-seen merchants.
///
/// Zero values are not recorded: a fee of `0` or a delivery time of `0`
/// minutes counts as "no data" for averaging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub fee_sum: f64,
    pub fee_count: u64,
    pub time_sum: f64,
    pub time_count: u64,
}

impl AggregateStats {
    /// Adds a delivery fee. Returns `false` when the fee was not counted.
    pub fn record_fee(&mut self, fee: Option<f64>) -> bool {
        match fee {
            Some(fee) if fee != 0.0 => {
                self.fee_sum += fee;
                self.fee_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Adds a delivery time in minutes. Returns `false` when it was not counted.
    pub fn record_delivery_time(&mut self, minutes: Option<i64>) -> bool {
        match minutes {
            Some(minutes) if minutes != 0 => {
                #[allow(clippy::cast_precision_loss)]
                let minutes = minutes as f64;
                self.time_sum += minutes;
                self.time_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Mean delivery fee, or `None` when no fee was counted.
    #[must_use]
    pub fn average_fee(&self) -> Option<f64> {
        average(self.fee_sum, self.fee_count)
    }

    /// Mean delivery time in minutes, or `None` when no time was counted.
    #[must_use]
    pub fn average_delivery_time(&self) -> Option<f64> {
        average(self.time_sum, self.time_count)
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(sum: f64, count: u64) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}
