use crate::{args::Args, MainError};
use log::{warn, Level, LevelFilter};
use simplelog::{
    format_description, Color, ColorChoice, CombinedLogger, ConfigBuilder, LevelPadding,
    TermLogger, TerminalMode, WriteLogger,
};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};
use time::{Date, OffsetDateTime};

// Use the same format as simple_logger
const TIMESTAMP_FORMAT_OFFSET: &[simplelog::FormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

const FILE_DATE_FORMAT: &[simplelog::FormatItem<'_>] =
    format_description!("[year][month][day]");

/// A writer that appends to one log file per calendar day.
///
/// The file is named after the date (e.g. `log_20240229`) and is only opened
/// on the first write. All writes on the same day share the same handle;
/// the first write on a new day opens a new file and leaves the old one
/// untouched. The directory is created on demand.
pub struct DailyLogFile {
    directory: PathBuf,
    current: Option<(Date, File)>,
}

impl DailyLogFile {
    /// Creates a daily rotating writer under the given directory.
    pub fn new(directory: PathBuf) -> Self {
        DailyLogFile {
            directory,
            current: None,
        }
    }

    fn path_for(&self, date: Date) -> io::Result<PathBuf> {
        let formatted = date
            .format(FILE_DATE_FORMAT)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        Ok(self.directory.join(format!("log_{formatted}")))
    }

    fn writer_for(&mut self, date: Date) -> io::Result<&mut File> {
        let reopen = !matches!(&self.current, Some((current, _)) if *current == date);
        if reopen {
            fs::create_dir_all(&self.directory)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(date)?)?;
            self.current = Some((date, file));
        }

        match &mut self.current {
            Some((_, file)) => Ok(file),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "the log file is not open",
            )),
        }
    }

    fn today() -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

impl Write for DailyLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer_for(DailyLogFile::today())?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer_for(DailyLogFile::today())?.flush()
    }
}

pub fn init_logger(args: &Args, log_dir: PathBuf) -> Result<(), MainError> {
    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new()
        .set_level_color(Level::Debug, Some(Color::Magenta))
        .set_level_color(Level::Trace, None)
        .set_level_padding(LevelPadding::Right)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_time_format_custom(TIMESTAMP_FORMAT_OFFSET)
        .set_time_offset_to_local()
        .map_err(|_| MainError::FailedLoggerTimezones)?
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, config, DailyLogFile::new(log_dir)),
    ])?;

    if args.verbose > 3 {
        warn!("Okay, it's time to stop. It won't get more verbose than this.")
    }

    Ok(())
}
