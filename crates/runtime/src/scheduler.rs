//! Deferred pump scheduling.
//!
//! "Run soon" decoupled from any host frame-callback facility: the default
//! scheduler posts a pump tick into the loop's own channel, so the tick runs
//! after everything already queued, deferred without recursion. Tests can
//! substitute their own scheduler and drive pumps by hand.

use bus::{EventSink, LoopEvent};

pub trait Scheduler {
    fn run_soon(&mut self);
}

pub struct BusScheduler {
    sink: EventSink,
}

impl BusScheduler {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }
}

impl Scheduler for BusScheduler {
    fn run_soon(&mut self) {
        self.sink.post(LoopEvent::Pump);
    }
}
