// ── Sensor history and usage counters ──

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::command::DeviceCommand;

/// One temperature/humidity reading taken from an applied status read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    pub at: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// Min/max/mean over one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl SeriesStats {
    fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0.0;
        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1.0;
        }
        (count > 0.0).then(|| Self {
            min,
            max,
            mean: sum / count,
        })
    }
}

/// Summary of everything currently held in a [`SensorHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSummary {
    pub samples: usize,
    pub temperature_c: SeriesStats,
    pub humidity_pct: SeriesStats,
}

/// Bounded ring of sensor samples, oldest evicted first.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    capacity: usize,
    samples: VecDeque<SensorSample>,
}

impl SensorHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn push(&mut self, sample: SensorSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &SensorSample> {
        self.samples.iter()
    }

    /// `None` until the first sample arrives.
    pub fn summary(&self) -> Option<SensorSummary> {
        let temperature_c = SeriesStats::over(self.samples.iter().map(|s| s.temperature_c))?;
        let humidity_pct = SeriesStats::over(self.samples.iter().map(|s| s.humidity_pct))?;
        Some(SensorSummary {
            samples: self.samples.len(),
            temperature_c,
            humidity_pct,
        })
    }
}

/// How often each actuator was switched on by a confirmed command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub led_on: u64,
    pub buzzer_on: u64,
    /// Every confirmed door move counts, open or close.
    pub door_operations: u64,
    /// Every confirmed hanger move counts, extend or retract.
    pub hanger_operations: u64,
    pub pump_on: u64,
}

impl UsageCounters {
    pub fn record(&mut self, command: DeviceCommand) {
        match command {
            DeviceCommand::SetLed(true) => self.led_on += 1,
            DeviceCommand::SetBuzzer(true) => self.buzzer_on += 1,
            DeviceCommand::SetPump(true) => self.pump_on += 1,
            DeviceCommand::SetServoDoor(_) => self.door_operations += 1,
            DeviceCommand::SetHanger(_) => self.hanger_operations += 1,
            DeviceCommand::SetLed(false)
            | DeviceCommand::SetBuzzer(false)
            | DeviceCommand::SetPump(false) => {}
        }
    }
}
