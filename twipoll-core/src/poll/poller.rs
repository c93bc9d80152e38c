//! Polling loop
//!
//! Owns the sensor driver, the serial sink and the delay provider, and
//! evaluates exactly one state action per [`Poller::step`].
//!
//! Wire output:
//! - after wake-up: `0x00`, or the error code followed by `0x01`
//! - per good cycle: high byte, low byte, newline
//! - on a failed read: the error code, then one newline per step

use embedded_hal::delay::DelayNs;
use twipoll_hal::{SerialSink, TwiController};

use super::state::{Event, Phase, PollState};
use crate::config::PollerConfig;
use crate::error::ErrorCode;
use crate::sensor::Mpu6050;
use crate::twi::TwiMaster;

/// Sent once the sensor has been woken
pub const WAKEUP_SUCCESS: u8 = ErrorCode::OK_CODE;

/// Sent when the sensor could not be woken
pub const WAKEUP_FAILURE: u8 = 0x01;

/// One axis measurement as read from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementSample {
    pub high: u8,
    pub low: u8,
}

impl MeasurementSample {
    /// Reset both bytes to zero
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Signed 16-bit reading (the sensor is big-endian, two's complement)
    pub fn raw(&self) -> i16 {
        i16::from_be_bytes([self.high, self.low])
    }
}

/// Sensor polling state machine
pub struct Poller<C, S, D> {
    sensor: Mpu6050<C>,
    sink: S,
    delay: D,
    interval_ms: u32,
    newline: u8,
    phase: Phase,
    sample: MeasurementSample,
    completed_cycles: u32,
    last_error: Option<ErrorCode>,
}

impl<C, S, D> Poller<C, S, D>
where
    C: TwiController,
    S: SerialSink,
    D: DelayNs,
{
    /// Create a poller in the startup phase
    ///
    /// The configuration is expected to have passed
    /// [`PollerConfig::validate`].
    pub fn new(controller: C, sink: S, delay: D, config: &PollerConfig) -> Self {
        let master = TwiMaster::new(controller, config.bus_wait_polls);
        Self {
            sensor: Mpu6050::new(master, config.sensor),
            sink,
            delay,
            interval_ms: config.interval_ms,
            newline: config.newline,
            phase: Phase::Startup,
            sample: MeasurementSample::default(),
            completed_cycles: 0,
            last_error: None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sample of the cycle in progress
    pub fn sample(&self) -> MeasurementSample {
        self.sample
    }

    /// Number of samples fully sent
    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    /// Error that stopped the loop, if any
    pub fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    /// Get access to the sensor driver
    pub fn sensor(&self) -> &Mpu6050<C> {
        &self.sensor
    }

    /// Get mutable access to the sensor driver
    pub fn sensor_mut(&mut self) -> &mut Mpu6050<C> {
        &mut self.sensor
    }

    /// Get access to the serial sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get mutable access to the serial sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Get access to the delay provider
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Evaluate one transition and return the new phase
    pub fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Startup => self.startup(),
            Phase::Halted => Phase::Halted,
            Phase::Polling(state) => Phase::Polling(self.poll(state)),
        };
        self.phase
    }

    /// Step until the sensor could not be woken
    ///
    /// Returns only from [`Phase::Halted`]; a bus fault during polling
    /// keeps the loop in the error state forever.
    pub fn run_until_halted(&mut self) {
        while self.step() != Phase::Halted {}
    }

    fn startup(&mut self) -> Phase {
        self.sink.init();

        match self.sensor.wakeup(&mut self.sink) {
            Ok(()) => {
                info!("sensor awake, polling every {} ms", self.interval_ms);
                self.sink.send(WAKEUP_SUCCESS);
                Phase::Polling(PollState::Wait)
            }
            Err(code) => {
                error!("sensor wake-up failed: {:?}", code);
                self.last_error = Some(code);
                self.sink.send(WAKEUP_FAILURE);
                Phase::Halted
            }
        }
    }

    fn poll(&mut self, state: PollState) -> PollState {
        let event = match state {
            PollState::Wait => {
                self.delay.delay_ms(self.interval_ms);
                self.sample.clear();
                Event::DelayElapsed
            }
            PollState::ReadHigh => {
                let reg = self.sensor.config().axis_high_register;
                match self.sensor.read_register(reg, &mut self.sink) {
                    Ok(byte) => {
                        self.sample.high = byte;
                        Event::ReadSucceeded
                    }
                    Err(code) => Event::ReadFailed(code),
                }
            }
            PollState::ReadLow => {
                let reg = self.sensor.config().axis_low_register;
                match self.sensor.read_register(reg, &mut self.sink) {
                    Ok(byte) => {
                        self.sample.low = byte;
                        Event::ReadSucceeded
                    }
                    Err(code) => Event::ReadFailed(code),
                }
            }
            PollState::SendHigh => {
                self.sink.send(self.sample.high);
                Event::ByteSent
            }
            PollState::SendLow => {
                self.sink.send(self.sample.low);
                Event::ByteSent
            }
            PollState::SendNewline => {
                self.sink.send(self.newline);
                self.completed_cycles = self.completed_cycles.wrapping_add(1);
                trace!("sample {} sent: {}", self.completed_cycles, self.sample.raw());
                Event::ByteSent
            }
            PollState::Error => {
                self.sink.send(self.newline);
                Event::ByteSent
            }
        };

        if let Event::ReadFailed(code) = event {
            warn!("polling stopped in {:?}: {:?}", state, code);
            self.last_error = Some(code);
        }

        state.transition(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RecordingDelay, RecordingSink, SimController};
    use twipoll_hal::twi::status;

    type SimPoller = Poller<SimController, RecordingSink, RecordingDelay>;

    fn poller(sim: SimController) -> SimPoller {
        Poller::new(
            sim,
            RecordingSink::new(),
            RecordingDelay::new(),
            &PollerConfig::default(),
        )
    }

    /// Poller past a successful wake-up with a clean log and sink
    fn started(sim: SimController) -> SimPoller {
        let mut p = poller(sim);
        assert_eq!(p.step(), Phase::Polling(PollState::Wait));
        p.sensor_mut().master_mut().controller_mut().clear_ops();
        p.sink_mut().clear();
        p
    }

    fn sim(p: &SimPoller) -> &SimController {
        p.sensor().master().controller()
    }

    fn run_cycle(p: &mut SimPoller) {
        for _ in 0..6 {
            p.step();
        }
    }

    #[test]
    fn test_startup_success() {
        let mut p = poller(SimController::mpu6050());
        assert_eq!(p.phase(), Phase::Startup);

        assert_eq!(p.step(), Phase::Polling(PollState::Wait));
        assert_eq!(p.sink().init_calls(), 1);
        assert_eq!(p.sink().sent(), &[WAKEUP_SUCCESS]);
        assert_eq!(sim(&p).register(0x6B), 0x00);
        assert_eq!(p.last_error(), None);
    }

    #[test]
    fn test_startup_failure_halts() {
        let mut sim = SimController::mpu6050();
        sim.inject_status(0, status::BUS_ERROR);
        let mut p = poller(sim);

        assert_eq!(p.step(), Phase::Halted);
        assert_eq!(
            p.sink().sent(),
            &[ErrorCode::Start.code(), WAKEUP_FAILURE]
        );
        assert_eq!(p.last_error(), Some(ErrorCode::Start));
        assert_eq!(self::sim(&p).stops(), 1);

        // Halted never reaches Wait and never touches the bus or the sink again
        for _ in 0..10 {
            assert_eq!(p.step(), Phase::Halted);
        }
        assert_eq!(self::sim(&p).issued(), 1);
        assert_eq!(p.sink().sent().len(), 2);
        assert_eq!(p.delay().calls(), 0);
    }

    #[test]
    fn test_run_until_halted_returns_on_absent_sensor() {
        let mut p = poller(SimController::new(0x10));
        p.run_until_halted();
        assert_eq!(p.phase(), Phase::Halted);
        assert_eq!(p.last_error(), Some(ErrorCode::AddressAckWrite));
    }

    #[test]
    fn test_full_cycle() {
        let mut p = started(
            SimController::mpu6050()
                .with_register(0x3F, 0x3E)
                .with_register(0x40, 0x80),
        );

        run_cycle(&mut p);

        assert_eq!(p.phase(), Phase::Polling(PollState::Wait));
        assert_eq!(p.sink().sent(), &[0x3E, 0x80, 0x0A]);
        assert_eq!(p.completed_cycles(), 1);
        assert_eq!(p.sample().raw(), 0x3E80);
        assert_eq!(p.delay().total_ms(), 100);
        assert_eq!(sim(&p).stops(), 2);
        assert_eq!(sim(&p).repeated_starts(), 2);
    }

    #[test]
    fn test_consecutive_cycles_track_sensor() {
        let mut p = started(SimController::mpu6050().with_register(0x3F, 0x01));

        run_cycle(&mut p);
        p.sensor_mut()
            .master_mut()
            .controller_mut()
            .set_register(0x3F, 0x02);
        run_cycle(&mut p);

        assert_eq!(p.sink().sent(), &[0x01, 0x00, 0x0A, 0x02, 0x00, 0x0A]);
        assert_eq!(p.completed_cycles(), 2);
    }

    #[test]
    fn test_wait_clears_sample() {
        let mut p = started(
            SimController::mpu6050()
                .with_register(0x3F, 0xFF)
                .with_register(0x40, 0xFF),
        );
        run_cycle(&mut p);
        assert_eq!(p.sample().raw(), -1);

        p.step();
        assert_eq!(p.phase(), Phase::Polling(PollState::ReadHigh));
        assert_eq!(p.sample(), MeasurementSample::default());
    }

    #[test]
    fn test_read_low_nack_failure_enters_error() {
        let mut sim = SimController::mpu6050();
        // wake-up uses ops 0..=3; ReadHigh 4..=9; ReadLow 10..=15, final read at 15
        sim.inject_status(15, status::MR_DATA_ACK);
        let mut p = started(sim);

        p.step(); // Wait
        p.step(); // ReadHigh
        assert_eq!(p.step(), Phase::Polling(PollState::Error));
        assert_eq!(p.last_error(), Some(ErrorCode::DataNack));
        assert_eq!(p.sink().sent(), &[ErrorCode::DataNack.code()]);

        let issued = self::sim(&p).issued();
        let stops = self::sim(&p).stops();
        assert_eq!(stops, 2);

        for _ in 0..5 {
            assert_eq!(p.step(), Phase::Polling(PollState::Error));
        }
        assert_eq!(
            p.sink().sent(),
            &[ErrorCode::DataNack.code(), 0x0A, 0x0A, 0x0A, 0x0A, 0x0A]
        );
        assert_eq!(self::sim(&p).issued(), issued);
        assert_eq!(self::sim(&p).stops(), stops);
        assert_eq!(p.completed_cycles(), 0);
    }

    #[test]
    fn test_read_high_failure_enters_error() {
        let mut sim = SimController::mpu6050();
        // SLA+W of the ReadHigh transaction
        sim.inject_status(5, status::MT_SLA_NACK);
        let mut p = started(sim);

        p.step();
        assert_eq!(p.step(), Phase::Polling(PollState::Error));
        assert_eq!(p.last_error(), Some(ErrorCode::AddressAckWrite));

        // No ReadLow transaction follows
        p.step();
        assert_eq!(self::sim(&p).starts(), 1);
        assert_eq!(
            p.sink().sent(),
            &[ErrorCode::AddressAckWrite.code(), 0x0A]
        );
    }

    #[test]
    fn test_sensor_disappears_times_out() {
        let mut sim = SimController::mpu6050();
        sim.stall_from(4);
        let mut p = started(sim);

        p.step();
        assert_eq!(p.step(), Phase::Polling(PollState::Error));
        assert_eq!(p.last_error(), Some(ErrorCode::Timeout));
        assert_eq!(self::sim(&p).stops(), 1);
    }

    #[test]
    fn test_redundant_stop_between_cycles() {
        let mut p = started(
            SimController::mpu6050()
                .with_register(0x3F, 0x10)
                .with_register(0x40, 0x20),
        );
        run_cycle(&mut p);

        p.sensor_mut().master_mut().stop();
        run_cycle(&mut p);

        assert_eq!(p.phase(), Phase::Polling(PollState::Wait));
        assert_eq!(p.sink().sent(), &[0x10, 0x20, 0x0A, 0x10, 0x20, 0x0A]);
    }

    #[test]
    fn test_custom_interval_and_newline() {
        let config = PollerConfig {
            interval_ms: 250,
            newline: b'\r',
            ..PollerConfig::DEFAULT
        };
        let mut p = Poller::new(
            SimController::mpu6050(),
            RecordingSink::new(),
            RecordingDelay::new(),
            &config,
        );
        p.step();
        run_cycle(&mut p);
        assert_eq!(p.delay().total_ms(), 250);
        assert_eq!(p.sink().sent(), &[WAKEUP_SUCCESS, 0x00, 0x00, b'\r']);
    }
}
