//! Staggered sensor acquisition (§4.4).
//!
//! Each signal is sampled on its own period rather than every 100 Hz tick,
//! so the hot path only pays for conversions that are actually due. The
//! owning [`SensorBoard`] is ticked once per control cycle with the
//! elapsed milliseconds and a [`SensorInputs`] handle to the raw hardware;
//! it decides internally which signals are due this tick.

use steer_common::model::{SwitchState, WasReading};

/// Raw hardware reads the sensor board pulls from on its own schedule.
///
/// A thin seam so the acquisition logic above (averaging, debounce, IIR)
/// is hardware-independent and testable with a fake.
pub trait SensorInputs {
    /// One ADC conversion on the WAS analog channel, 12-bit range.
    fn read_was_adc(&mut self) -> u16;
    /// One ADC conversion on the motor current-sense channel.
    fn read_current_adc(&mut self) -> u16;
    /// One ADC conversion on the hydraulic pressure channel.
    fn read_pressure_adc(&mut self) -> u16;
    /// Raw (undebounced) steer-engage switch level.
    fn read_steer_switch(&mut self) -> bool;
    /// Raw (undebounced) work switch level, digital mode.
    fn read_work_switch(&mut self) -> bool;
    /// Work switch level as a percent, analog hysteresis mode.
    fn read_work_switch_pct(&mut self) -> f32;
    /// Free-running encoder pulse counter (monotonic, wraps on overflow).
    fn encoder_pulse_count(&self) -> u32;
}

/// Analog work-switch hysteresis-band configuration.
#[derive(Debug, Clone, Copy)]
pub struct WorkSwitchHysteresis {
    pub enabled: bool,
    /// Band center, percent.
    pub setpoint_pct: f32,
    /// Full band width, percent.
    pub band_pct: f32,
    pub invert: bool,
}

impl Default for WorkSwitchHysteresis {
    fn default() -> Self {
        Self {
            enabled: false,
            setpoint_pct: 50.0,
            band_pct: 10.0,
            invert: false,
        }
    }
}

/// A 50-sample ring buffer averaging filter (motor current).
#[derive(Debug, Clone)]
struct RingAverage {
    samples: [f32; steer_common::consts::CURRENT_RING_SIZE],
    index: usize,
    filled: usize,
}

impl RingAverage {
    fn new() -> Self {
        Self {
            samples: [0.0; steer_common::consts::CURRENT_RING_SIZE],
            index: 0,
            filled: 0,
        }
    }

    fn push(&mut self, value: f32) -> f32 {
        self.samples[self.index] = value;
        self.index = (self.index + 1) % self.samples.len();
        self.filled = (self.filled + 1).min(self.samples.len());
        self.samples[..self.filled].iter().sum::<f32>() / self.filled as f32
    }
}

/// Extension point for angle post-processing beyond the raw
/// offset-and-scale computation in [`steer_common::model::WasReading`] —
/// e.g. an Ackerman correction or a heading-rate fusion filter. Neither is
/// implemented by this core; the default passes the WAS angle through
/// unchanged, matching the behavior before any such filter is wired in.
pub trait WasFilter {
    fn filter(&mut self, raw_angle_deg: f32) -> f32;
}

/// Identity [`WasFilter`]: offset-and-scale only, no correction applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityWasFilter;

impl WasFilter for IdentityWasFilter {
    fn filter(&mut self, raw_angle_deg: f32) -> f32 {
        raw_angle_deg
    }
}

/// Owns the per-signal schedules, filters, and debounced state.
#[derive(Debug)]
pub struct SensorBoard {
    was_was_offset: i16,
    was_counts_per_degree: f32,
    was_next_due_ms: u32,
    was_reading: WasReading,

    current_next_due_ms: u32,
    current_ring: RingAverage,
    current_avg: f32,

    switch_next_due_ms: u32,
    debounce_ms: u32,
    steer_switch: SwitchState,
    work_switch: SwitchState,
    work_switch_pct: f32,
    work_hysteresis: WorkSwitchHysteresis,
    work_switch_on: bool,

    pressure_next_due_ms: u32,
    pressure_filtered: f32,
    pressure_raw_last: u16,

    last_encoder_count: u32,
    encoder_window_start_ms: u32,
    encoder_pulses_in_window: u16,
}

impl SensorBoard {
    pub fn new(was_offset: i16, was_counts_per_degree: f32, debounce_ms: u32) -> Self {
        Self {
            was_was_offset: was_offset,
            was_counts_per_degree,
            was_next_due_ms: 0,
            was_reading: WasReading::default(),
            current_next_due_ms: 0,
            current_ring: RingAverage::new(),
            current_avg: 0.0,
            switch_next_due_ms: 0,
            debounce_ms,
            steer_switch: SwitchState::default(),
            work_switch: SwitchState::default(),
            work_switch_pct: 0.0,
            work_hysteresis: WorkSwitchHysteresis::default(),
            work_switch_on: false,
            pressure_next_due_ms: 0,
            pressure_filtered: 0.0,
            pressure_raw_last: 0,
            last_encoder_count: 0,
            encoder_window_start_ms: 0,
            encoder_pulses_in_window: 0,
        }
    }

    pub fn set_work_hysteresis(&mut self, hysteresis: WorkSwitchHysteresis) {
        self.work_hysteresis = hysteresis;
    }

    pub fn set_was_calibration(&mut self, offset: i16, counts_per_degree: f32) {
        self.was_was_offset = offset;
        self.was_counts_per_degree = counts_per_degree;
    }

    pub fn was_reading(&self) -> WasReading {
        self.was_reading
    }

    pub fn angle_deg(&self) -> f32 {
        self.was_reading.angle_deg()
    }

    pub fn current_draw_raw(&self) -> f32 {
        self.current_avg
    }

    pub fn pressure_raw(&self) -> u16 {
        self.pressure_raw_last
    }

    pub fn pressure_filtered(&self) -> f32 {
        self.pressure_filtered
    }

    pub fn steer_switch(&self) -> SwitchState {
        self.steer_switch
    }

    pub fn work_switch_active(&self) -> bool {
        if self.work_hysteresis.enabled {
            self.work_switch_on
        } else {
            self.work_switch.debounced
        }
    }

    /// Pulses observed in the most recently closed 100 ms encoder window.
    pub fn encoder_pulses_in_window(&self) -> u16 {
        self.encoder_pulses_in_window
    }

    /// Sample every signal that is due at `now_ms`.
    pub fn tick(&mut self, inputs: &mut dyn SensorInputs, now_ms: u32) {
        use steer_common::consts::*;

        if now_ms >= self.was_next_due_ms {
            self.was_next_due_ms = now_ms + WAS_PERIOD_MS;
            let mut sum: u32 = 0;
            for _ in 0..WAS_AVG_SAMPLES {
                sum += inputs.read_was_adc() as u32;
            }
            let raw_adc = (sum / WAS_AVG_SAMPLES as u32) as u16;
            self.was_reading = WasReading {
                raw_adc,
                offset: self.was_was_offset,
                counts_per_degree: self.was_counts_per_degree,
            };
        }

        if now_ms >= self.current_next_due_ms {
            self.current_next_due_ms = now_ms + CURRENT_PERIOD_MS;
            let raw = inputs.read_current_adc() as f32;
            let zeroed = (raw - CURRENT_ZERO_OFFSET).max(0.0);
            self.current_avg = self.current_ring.push(zeroed);
        }

        if now_ms >= self.switch_next_due_ms {
            self.switch_next_due_ms = now_ms + SWITCH_PERIOD_MS;
            let steer_raw = inputs.read_steer_switch();
            self.steer_switch.sample(steer_raw, now_ms, self.debounce_ms);

            if self.work_hysteresis.enabled {
                self.work_switch_pct = inputs.read_work_switch_pct();
                let half_band = self.work_hysteresis.band_pct / 2.0;
                let lo = self.work_hysteresis.setpoint_pct - half_band;
                let hi = self.work_hysteresis.setpoint_pct + half_band;
                let sensed = if self.work_switch_pct > hi {
                    true
                } else if self.work_switch_pct < lo {
                    false
                } else {
                    self.work_switch_on
                };
                self.work_switch_on = if self.work_hysteresis.invert { !sensed } else { sensed };
            } else {
                let work_raw = inputs.read_work_switch();
                self.work_switch.sample(work_raw, now_ms, self.debounce_ms);
            }
        }

        if now_ms >= self.pressure_next_due_ms {
            self.pressure_next_due_ms = now_ms + PRESSURE_PERIOD_MS;
            let raw = inputs.read_pressure_adc();
            self.pressure_raw_last = raw;
            let scaled = raw as f32 * PRESSURE_SCALE;
            self.pressure_filtered = (PRESSURE_IIR_ALPHA * scaled
                + (1.0 - PRESSURE_IIR_ALPHA) * self.pressure_filtered)
                .min(PRESSURE_SATURATE);
        }

        let count = inputs.encoder_pulse_count();
        if now_ms.wrapping_sub(self.encoder_window_start_ms) >= ENCODER_WINDOW_MS {
            self.encoder_pulses_in_window = count.wrapping_sub(self.last_encoder_count) as u16;
            self.last_encoder_count = count;
            self.encoder_window_start_ms = now_ms;
        }
    }
}
