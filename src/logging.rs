//! An optional, explicitly-installed pretty console logger.
//!
//! Library code only ever emits events through the `log` facade; it
//! never installs a logger itself. Applications (including the demos
//! in this repository) call [`install`] once, at startup, if they want
//! colored, timestamped console output.

use colored::Color;
use fern::colors::ColoredLevelConfig;

/// Installs a colored, timestamped logger on stdout at the given
/// maximum level. Safe to call at most once per process; a second call
/// returns the error from the underlying `log` crate rather than
/// panicking.
pub fn install(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let colors_line = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::White)
        .debug(Color::Green)
        .trace(Color::Blue);

    fern::Dispatch::new()
        .level(level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}{}[{}][{}] {}",
                format_args!("\x1B[{}m", colors_line.get_color(&record.level()).to_fg_str()),
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply()
}
