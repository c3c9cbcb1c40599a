use slcan::{Bus, BusOptions, FdQuadruple, FdTiming, Message, Timing};
use std::error::Error;
use std::thread;
use std::time::Duration;

/// Opens a CAN-FD channel at 1 Mbit/s nominal / 5 Mbit/s data and
/// repeatedly sends a 64-byte FD frame once per second, mirroring the
/// source driver's send-loop example.
fn main() -> Result<(), Box<dyn Error>> {
    slcan::logging::install(log::LevelFilter::Info)?;

    let device = "COM13";
    let timing_fd = FdTiming::new(
        FdQuadruple { sjw: 1, tseg1: 44, tseg2: 15, brp: 1 },
        FdQuadruple { sjw: 1, tseg1: 8, tseg2: 3, brp: 1 },
    );

    let mut options = BusOptions::new(device);
    options.timing = Some(Timing::Fd(timing_fd));
    let mut bus = Bus::open(options)?;

    let can_id = 0x123;
    let data: Vec<u8> = (1..=64).collect();
    let message = Message::new_fd(can_id, false, false, data);

    let mut count = 1;
    loop {
        bus.send(&message, None)?;
        log::info!("count:{count} sent: {message:?}");
        count += 1;
        thread::sleep(Duration::from_secs(1));
    }
}
