//! `cron` trigger — a fixed replica count during declared `[start, end]`
//! windows in a given timezone (spec.md §4.2 "Cron scaler").

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use cron::Schedule;
use engine_core::{MetricType, Trigger};

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{require, require_parsed, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

struct CronScaler {
    metric_name: String,
    metric_type: MetricType,
    start: Schedule,
    end: Schedule,
    timezone: Tz,
    desired_replicas: i32,
}

impl CronScaler {
    /// Whether `now` falls within the window opened by the most recent
    /// `start` firing that hasn't yet been closed by an `end` firing.
    fn window_active(&self, now_utc: chrono::DateTime<Utc>) -> bool {
        let now = now_utc.with_timezone(&self.timezone);
        let last_start = self.start.after(&(now - chrono::Duration::days(1))).take_while(|t| *t <= now).last();
        let Some(last_start) = last_start else { return false };
        let last_end = self.end.after(&(now - chrono::Duration::days(1))).take_while(|t| *t <= now).last();
        match last_end {
            Some(last_end) => last_end <= last_start,
            None => true,
        }
    }
}

#[async_trait]
impl Scaler for CronScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec { name: self.metric_name.clone(), metric_type: self.metric_type, target_value: 1.0 }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let active = self.window_active(Utc::now());
        let value = if active { f64::from(self.desired_replicas) } else { 0.0 };
        Ok(MetricsAndActivity { samples: vec![Sample { name: self.metric_name.clone(), value }], active })
    }
}

/// Build a `cron` scaler from its trigger declaration.
///
/// # Errors
/// Returns [`BuildError`] if `start`/`end` are not valid 5- or 6-field cron
/// expressions, `timezone` is not a valid IANA zone name, or
/// `desiredReplicas` is missing.
pub fn build(
    trigger: &Trigger,
    metric_name: &str,
    _auth: &ResolvedAuth,
    _global: &GlobalConfig,
) -> Result<Arc<dyn Scaler>, BuildError> {
    let start_raw = require(trigger, "start")?;
    let end_raw = require(trigger, "end")?;
    let timezone_raw = trigger.metadata.get("timezone").map(String::as_str).unwrap_or("UTC");
    let desired_replicas: i32 = require_parsed(trigger, "desiredReplicas")?;

    let start = parse_schedule(trigger, "start", start_raw)?;
    let end = parse_schedule(trigger, "end", end_raw)?;
    let timezone = Tz::from_str(timezone_raw).map_err(|_| BuildError::InvalidValue {
        scaler_type: trigger.type_.clone(),
        key: "timezone".to_string(),
        reason: format!("{timezone_raw:?} is not a recognized IANA timezone"),
    })?;

    Ok(Arc::new(CronScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::AverageValue),
        start,
        end,
        timezone,
        desired_replicas,
    }))
}

fn parse_schedule(trigger: &Trigger, key: &str, raw: &str) -> Result<Schedule, BuildError> {
    // The `cron` crate expects a leading seconds field; user-facing specs
    // follow the standard 5-field form, so prepend "0 " when only five
    // fields were supplied.
    let normalized = if raw.split_whitespace().count() == 5 { format!("0 {raw}") } else { raw.to_string() };
    Schedule::from_str(&normalized).map_err(|e| BuildError::InvalidValue {
        scaler_type: trigger.type_.clone(),
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn trig(start: &str, end: &str, desired: i32) -> Trigger {
        let mut metadata = BTreeMap::new();
        metadata.insert("start".to_string(), start.to_string());
        metadata.insert("end".to_string(), end.to_string());
        metadata.insert("desiredReplicas".to_string(), desired.to_string());
        Trigger {
            type_: "cron".to_string(),
            name: None,
            metadata,
            authentication_ref: None,
            metric_type: None,
            use_cached_metrics: false,
        }
    }

    fn scaler(start: &str, end: &str, desired: i32) -> CronScaler {
        let trigger = trig(start, end, desired);
        let start = parse_schedule(&trigger, "start", start).unwrap();
        let end = parse_schedule(&trigger, "end", end).unwrap();
        CronScaler {
            metric_name: "cron".to_string(),
            metric_type: MetricType::AverageValue,
            start,
            end,
            timezone: Tz::UTC,
            desired_replicas: desired,
        }
    }

    #[test]
    fn scenario_s2_cron_gate() {
        // "0 * * * *" / "1 * * * *": active during the first minute of
        // every hour.
        let scaler = scaler("0 * * * *", "1 * * * *", 4);
        let during = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 30).unwrap();
        assert!(scaler.window_active(during));

        let after = Utc.with_ymd_and_hms(2026, 1, 1, 10, 2, 0).unwrap();
        assert!(!scaler.window_active(after));
    }
}
