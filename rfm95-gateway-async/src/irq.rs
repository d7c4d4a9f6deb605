use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_sync::signal::Signal;
use embedded_hal_async::digital::Wait;
use sx127x_async::PinError;

/// A rising edge seen on the DIO0 line. Carries no data; the chip's
/// `RegIrqFlags` says what happened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IrqEvent;

/// Queue of pending interrupt events between the line and the gateway.
pub type IrqChannel<const N: usize> = Channel<CriticalSectionRawMutex, IrqEvent, N>;

/// Raised once to stop the receive loop.
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ()>;

/// Producer side of the interrupt queue.
///
/// Edges arriving while the gateway is still busy with a previous one are
/// queued, so the handler never runs re-entrantly.
pub struct IrqLine<'a, const N: usize> {
    events: Sender<'a, CriticalSectionRawMutex, IrqEvent, N>,
}

impl<'a, const N: usize> IrqLine<'a, N> {
    /// Creates a new `IrqLine` feeding `events`.
    pub fn new(events: Sender<'a, CriticalSectionRawMutex, IrqEvent, N>) -> Self {
        Self { events }
    }

    /// Enqueues one event from a synchronous edge callback.
    ///
    /// Never blocks: with the queue full the edge is dropped and logged.
    pub fn notify(&self) {
        if self.events.try_send(IrqEvent).is_err() {
            log::warn!("lora::irq queue full, interrupt dropped");
        }
    }

    /// Forwards every rising edge of `pin` into the queue.
    ///
    /// Waits for room when the queue is full. Only returns if the pin fails.
    pub async fn forward<PIN: Wait>(
        &self,
        pin: &mut PIN,
    ) -> Result<Infallible, PinError<PIN::Error>> {
        loop {
            pin.wait_for_rising_edge()
                .await
                .map_err(PinError::Input)?;
            log::trace!("lora::irq rising edge");
            self.events.send(IrqEvent).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embedded_hal::digital::{self, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct LineFault;

    impl digital::Error for LineFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Produces `edges` rising edges, then fails.
    struct EdgePin {
        edges: usize,
    }

    impl digital::ErrorType for EdgePin {
        type Error = LineFault;
    }

    impl Wait for EdgePin {
        async fn wait_for_high(&mut self) -> Result<(), LineFault> {
            Err(LineFault)
        }

        async fn wait_for_low(&mut self) -> Result<(), LineFault> {
            Err(LineFault)
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), LineFault> {
            if self.edges == 0 {
                return Err(LineFault);
            }
            self.edges -= 1;
            Ok(())
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), LineFault> {
            Err(LineFault)
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), LineFault> {
            self.wait_for_rising_edge().await
        }
    }

    #[test]
    fn every_edge_is_queued() {
        let events = IrqChannel::<4>::new();
        let line = IrqLine::new(events.sender());
        let mut pin = EdgePin { edges: 3 };

        let err = block_on(line.forward(&mut pin)).unwrap_err();

        assert!(matches!(err, PinError::Input(LineFault)));
        assert_eq!(events.len(), 3);
        assert_eq!(events.try_receive(), Ok(IrqEvent));
    }

    #[test]
    fn notify_drops_when_full() {
        let events = IrqChannel::<1>::new();
        let line = IrqLine::new(events.sender());

        line.notify();
        line.notify();

        assert_eq!(events.len(), 1);
        assert!(events.try_receive().is_ok());
        assert!(events.try_receive().is_err());
    }
}
