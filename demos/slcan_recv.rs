use slcan::{Bus, BusOptions, FdQuadruple, FdTiming, Timing};
use std::error::Error;

/// Opens the same CAN-FD channel as `slcan_send` and prints every
/// frame it receives, mirroring the source driver's receive-loop
/// example.
fn main() -> Result<(), Box<dyn Error>> {
    slcan::logging::install(log::LevelFilter::Info)?;

    let device = "COM14";
    let timing_fd = FdTiming::new(
        FdQuadruple { sjw: 1, tseg1: 44, tseg2: 15, brp: 1 },
        FdQuadruple { sjw: 1, tseg1: 8, tseg2: 3, brp: 1 },
    );

    let mut options = BusOptions::new(device);
    options.timing = Some(Timing::Fd(timing_fd));
    let mut bus = Bus::open(options)?;

    let mut count = 1;
    loop {
        let (message, _filtered) = bus.recv(None)?;
        if let Some(message) = message {
            log::info!("count:{count} recv: {message:?}");
            count += 1;
        }
    }
}
