//! Host stand-ins for the hardware, recording what the bootstrap does to them.
//!
//! Handles are cheap clones sharing state, so a test can keep one while the code under test
//! owns another.


use core::convert::Infallible;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    vec::Vec,
};

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::{
    Watchdog,
    boot::{Boot, RETURN_TRAP},
    state::BootToken,
    update::{DfuService, DfuState},
    vectors::{VECTOR_COUNT, VectorTable},
};

pub use serial::MockSerial;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    DisableInterrupts,
    RelocateVectors(usize),
    Refresh,
    TokenWrite(u32),
    Jump { stack_pointer: u32, entry: u32 },
    SerialBegin(u32),
    SerialEnd,
    DfuInit,
    DfuDisconnect,
    LedHigh,
    LedToggle,
}

/// Ordered log of hardware interactions, shared between mocks.
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn count(&self, event: Event) -> usize {
        self.0.borrow().iter().filter(|e| **e == event).count()
    }
}

/// Virtual time in microseconds, only advanced by [`MockDelay`].
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

pub fn vectors_with(stack_pointer: u32, entry: u32) -> VectorTable {
    let mut words = [0u32; VECTOR_COUNT];
    words[0] = stack_pointer;
    words[1] = entry;
    VectorTable::new(words)
}

#[derive(Clone)]
pub struct MockToken {
    trace: Trace,
    value: Rc<Cell<u32>>,
}

impl MockToken {
    pub fn new(trace: &Trace, value: u32) -> Self {
        Self {
            trace: trace.clone(),
            value: Rc::new(Cell::new(value)),
        }
    }
}

impl BootToken for MockToken {
    fn read(&self) -> u32 {
        self.value.get()
    }

    fn write(&mut self, value: u32) {
        self.trace.push(Event::TokenWrite(value));
        self.value.set(value);
    }
}

#[derive(Default)]
struct WatchdogState {
    refreshes: Cell<usize>,
    last: Cell<u64>,
    max_gap: Cell<u64>,
}

#[derive(Clone)]
pub struct MockWatchdog {
    trace: Trace,
    clock: Clock,
    state: Rc<WatchdogState>,
}

impl MockWatchdog {
    pub fn new(trace: &Trace) -> Self {
        Self::with_clock(trace, &Clock::new())
    }

    pub fn with_clock(trace: &Trace, clock: &Clock) -> Self {
        Self {
            trace: trace.clone(),
            clock: clock.clone(),
            state: Rc::default(),
        }
    }

    pub fn refreshes(&self) -> usize {
        self.state.refreshes.get()
    }

    /// Longest time between two consecutive refreshes so far.
    pub fn max_gap(&self) -> u64 {
        self.state.max_gap.get()
    }

    /// Whether a watchdog with the given period would have reset the device by now.
    pub fn expired(&self, period_us: u64) -> bool {
        self.clock.now() - self.state.last.get() > period_us
    }
}

impl Watchdog for MockWatchdog {
    fn refresh(&mut self) {
        self.trace.push(Event::Refresh);
        let now = self.clock.now();
        let gap = now - self.state.last.get();
        self.state.max_gap.set(self.state.max_gap.get().max(gap));
        self.state.last.set(now);
        self.state.refreshes.set(self.state.refreshes.get() + 1);
    }
}

/// Processor state at the moment of the branch into the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub stack_pointer: u32,
    pub entry: u32,
    pub link_register: u32,
    pub vector_table: Option<usize>,
    pub interrupts_enabled: bool,
    pub token: u32,
}

/// Processor which, instead of branching, unwinds with a [`Snapshot`] as panic payload.
pub struct MockCpu {
    trace: Trace,
    token: MockToken,
    interrupts_enabled: bool,
    vector_table: Option<usize>,
}

impl MockCpu {
    pub fn new(trace: &Trace, token: &MockToken) -> Self {
        Self {
            trace: trace.clone(),
            token: token.clone(),
            interrupts_enabled: true,
            vector_table: None,
        }
    }
}

impl Boot for MockCpu {
    fn disable_interrupts(&mut self) {
        self.trace.push(Event::DisableInterrupts);
        self.interrupts_enabled = false;
    }

    unsafe fn relocate_vectors(&mut self, table: &VectorTable) {
        self.trace.push(Event::RelocateVectors(table.address()));
        self.vector_table = Some(table.address());
    }

    unsafe fn jump(&mut self, stack_pointer: u32, entry: u32) -> ! {
        self.trace.push(Event::Jump {
            stack_pointer,
            entry,
        });
        std::panic::panic_any(Snapshot {
            stack_pointer,
            entry,
            link_register: RETURN_TRAP,
            vector_table: self.vector_table,
            interrupts_enabled: self.interrupts_enabled,
            token: self.token.read(),
        })
    }
}

/// DFU engine replaying a fixed sequence of states, then holding the last one.
pub struct MockDfu {
    trace: Trace,
    script: VecDeque<DfuState>,
    current: DfuState,
}

impl MockDfu {
    pub fn new(trace: &Trace, script: &[DfuState]) -> Self {
        Self {
            trace: trace.clone(),
            script: script.iter().copied().collect(),
            current: DfuState::Idle,
        }
    }
}

impl DfuService for MockDfu {
    fn init(&mut self) {
        self.trace.push(Event::DfuInit);
    }

    fn state(&mut self) -> DfuState {
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
        self.current
    }

    fn disconnect(&mut self) {
        self.trace.push(Event::DfuDisconnect);
    }
}

#[derive(Clone)]
pub struct MockLed {
    trace: Trace,
    high: Rc<Cell<bool>>,
}

impl MockLed {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            high: Rc::default(),
        }
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.trace.push(Event::LedHigh);
        self.high.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for MockLed {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.get())
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.trace.push(Event::LedToggle);
        self.high.set(!self.high.get());
        Ok(())
    }
}

/// Delay advancing the virtual [`Clock`] and yielding once to the executor.
pub struct MockDelay {
    clock: Clock,
}

impl MockDelay {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(u64::from(ns).div_ceil(1000));
        embassy_futures::yield_now().await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.clock.advance(u64::from(us));
        embassy_futures::yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(u64::from(ms) * 1000);
        embassy_futures::yield_now().await;
    }
}
