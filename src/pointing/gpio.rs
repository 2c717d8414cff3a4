use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::PointingError;

/// A digital output line
pub trait OutputLine: Send {
    fn write(&mut self, high: bool) -> Result<(), PointingError>;

    fn release(&mut self) -> Result<(), PointingError> {
        Ok(())
    }
}

/// A pulse width modulated output, duty given in percent of the period
pub trait PwmOutput: Send {
    fn set_duty(&mut self, frequency_hz: u32, duty_percent: f64) -> Result<(), PointingError>;

    fn release(&mut self) -> Result<(), PointingError> {
        Ok(())
    }
}

/// Where output lines come from
pub trait GpioBackend {
    fn output(&self, pin: u32) -> Result<Box<dyn OutputLine>, PointingError>;

    fn pwm(&self, channel: u32) -> Result<Box<dyn PwmOutput>, PointingError>;

    /// Delay to honour between physical transitions
    fn settle(&self, delay: Duration) -> Duration {
        delay
    }
}

/// Scale a human-visible pause to the backend: skipped when transitions are
/// not delayed either
pub fn pause_for(settle: Duration, pause: Duration) -> Duration {
    if settle.is_zero() {
        Duration::ZERO
    } else {
        pause
    }
}

/// Yield to the runtime for `delay`; a zero delay returns at once
pub async fn wait(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Release a line on a failure path, where only the first error matters
pub fn release_quietly(result: Result<(), PointingError>) {
    if let Err(e) = result {
        log::warn!("Could not release line: {}", e);
    }
}

fn write_attr(path: &Path, value: &str) -> Result<(), PointingError> {
    fs::write(path, value).map_err(|source| PointingError::Line {
        path: path.to_path_buf(),
        source,
    })
}

/// Linux sysfs interface (`/sys/class/gpio`, `/sys/class/pwm/pwmchipN`)
#[derive(Debug, Clone)]
pub struct SysfsBackend {
    gpio_root: PathBuf,
    pwm_chip: PathBuf,
}

impl SysfsBackend {
    pub fn new(gpio_root: impl Into<PathBuf>, pwm_chip: impl Into<PathBuf>) -> Self {
        Self {
            gpio_root: gpio_root.into(),
            pwm_chip: pwm_chip.into(),
        }
    }

    /// First control file missing from the gpio root or the pwm chip
    pub fn missing(&self) -> Option<PathBuf> {
        [self.gpio_root.join("export"), self.pwm_chip.join("export")]
            .into_iter()
            .find(|path| !path.exists())
    }
}

impl GpioBackend for SysfsBackend {
    fn output(&self, pin: u32) -> Result<Box<dyn OutputLine>, PointingError> {
        let line = self.gpio_root.join(format!("gpio{}", pin));
        if !line.exists() {
            write_attr(&self.gpio_root.join("export"), &pin.to_string())?;
        }
        write_attr(&line.join("direction"), "out")?;
        Ok(Box::new(SysfsLine {
            root: self.gpio_root.clone(),
            line,
            pin,
        }))
    }

    fn pwm(&self, channel: u32) -> Result<Box<dyn PwmOutput>, PointingError> {
        let dir = self.pwm_chip.join(format!("pwm{}", channel));
        if !dir.exists() {
            write_attr(&self.pwm_chip.join("export"), &channel.to_string())?;
        }
        Ok(Box::new(SysfsPwm {
            chip: self.pwm_chip.clone(),
            dir,
            channel,
            period_ns: None,
        }))
    }
}

struct SysfsLine {
    root: PathBuf,
    line: PathBuf,
    pin: u32,
}

impl OutputLine for SysfsLine {
    fn write(&mut self, high: bool) -> Result<(), PointingError> {
        write_attr(&self.line.join("value"), if high { "1" } else { "0" })
    }

    fn release(&mut self) -> Result<(), PointingError> {
        write_attr(&self.root.join("unexport"), &self.pin.to_string())
    }
}

struct SysfsPwm {
    chip: PathBuf,
    dir: PathBuf,
    channel: u32,
    period_ns: Option<u64>,
}

impl PwmOutput for SysfsPwm {
    fn set_duty(&mut self, frequency_hz: u32, duty_percent: f64) -> Result<(), PointingError> {
        let period_ns = 1_000_000_000 / u64::from(frequency_hz.max(1));
        if self.period_ns != Some(period_ns) {
            // duty must never exceed the period, so clear it before resizing
            write_attr(&self.dir.join("duty_cycle"), "0")?;
            write_attr(&self.dir.join("period"), &period_ns.to_string())?;
            write_attr(&self.dir.join("enable"), "1")?;
            self.period_ns = Some(period_ns);
        }
        let duty_ns = (period_ns as f64 * duty_percent.clamp(0.0, 100.0) / 100.0) as u64;
        write_attr(&self.dir.join("duty_cycle"), &duty_ns.to_string())
    }

    fn release(&mut self) -> Result<(), PointingError> {
        if self.period_ns.is_some() {
            write_attr(&self.dir.join("enable"), "0")?;
        }
        write_attr(&self.chip.join("unexport"), &self.channel.to_string())
    }
}

/// Everything written to a simulated pin, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Level {
    Digital(bool),
    Duty(f64),
    Released,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Digital(high) => write!(f, "{}", if *high { "high" } else { "low" }),
            Level::Duty(percent) => write!(f, "duty {:.2}%", percent),
            Level::Released => write!(f, "released"),
        }
    }
}

#[cfg(test)]
pub type Trace = std::sync::Arc<std::sync::Mutex<Vec<(u32, Level)>>>;

/// In-memory lines for dry runs and tests. Transitions are only logged
/// (and kept in a shared trace under test); no delay is ever honoured.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    #[cfg(test)]
    trace: Trace,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn trace(&self) -> Trace {
        self.trace.clone()
    }

    fn line(&self, pin: u32) -> SimulatedLine {
        SimulatedLine {
            pin,
            #[cfg(test)]
            trace: self.trace.clone(),
        }
    }
}

struct SimulatedLine {
    pin: u32,
    #[cfg(test)]
    trace: Trace,
}

impl SimulatedLine {
    fn record(&self, level: Level) -> Result<(), PointingError> {
        log::trace!("gpio{} <- {}", self.pin, level);
        #[cfg(test)]
        self.trace
            .lock()
            .map_err(|_| std::io::Error::other("simulated gpio trace poisoned"))?
            .push((self.pin, level));
        Ok(())
    }
}

impl OutputLine for SimulatedLine {
    fn write(&mut self, high: bool) -> Result<(), PointingError> {
        self.record(Level::Digital(high))
    }

    fn release(&mut self) -> Result<(), PointingError> {
        self.record(Level::Released)
    }
}

impl PwmOutput for SimulatedLine {
    fn set_duty(&mut self, _frequency_hz: u32, duty_percent: f64) -> Result<(), PointingError> {
        self.record(Level::Duty(duty_percent))
    }

    fn release(&mut self) -> Result<(), PointingError> {
        self.record(Level::Released)
    }
}

impl GpioBackend for SimulatedBackend {
    fn output(&self, pin: u32) -> Result<Box<dyn OutputLine>, PointingError> {
        Ok(Box::new(self.line(pin)))
    }

    fn pwm(&self, channel: u32) -> Result<Box<dyn PwmOutput>, PointingError> {
        Ok(Box::new(self.line(channel)))
    }

    fn settle(&self, _delay: Duration) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn fake_sysfs() -> TempDir {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("gpio").join("gpio20")).unwrap();
        fs::create_dir_all(root.path().join("pwm").join("pwm0")).unwrap();
        fs::write(root.path().join("gpio").join("export"), "").unwrap();
        fs::write(root.path().join("pwm").join("export"), "").unwrap();
        root
    }

    #[test]
    fn sysfs_line_writes_value() {
        let dir = fake_sysfs();
        let root = dir.path();
        let backend = SysfsBackend::new(root.join("gpio"), root.join("pwm"));
        assert_eq!(backend.missing(), None);

        let mut line = backend.output(20).unwrap();
        line.write(true).unwrap();

        let gpio = root.join("gpio").join("gpio20");
        assert_eq!(fs::read_to_string(gpio.join("direction")).unwrap(), "out");
        assert_eq!(fs::read_to_string(gpio.join("value")).unwrap(), "1");

        line.release().unwrap();
        assert_eq!(
            fs::read_to_string(root.join("gpio").join("unexport")).unwrap(),
            "20"
        );
    }

    #[test]
    fn sysfs_pwm_sets_period_and_duty() {
        let dir = fake_sysfs();
        let root = dir.path();
        let backend = SysfsBackend::new(root.join("gpio"), root.join("pwm"));

        let mut pwm = backend.pwm(0).unwrap();
        pwm.set_duty(50, 7.5).unwrap();

        let channel = root.join("pwm").join("pwm0");
        assert_eq!(fs::read_to_string(channel.join("period")).unwrap(), "20000000");
        assert_eq!(fs::read_to_string(channel.join("duty_cycle")).unwrap(), "1500000");
        assert_eq!(fs::read_to_string(channel.join("enable")).unwrap(), "1");
    }

    #[test]
    fn missing_sysfs_is_unavailable() {
        let backend = SysfsBackend::new("/nonexistent/gpio", "/nonexistent/pwm");
        assert_eq!(backend.missing(), Some(PathBuf::from("/nonexistent/gpio/export")));
    }

    #[test]
    fn missing_pwm_chip_is_reported() {
        let dir = fake_sysfs();
        fs::remove_file(dir.path().join("pwm").join("export")).unwrap();

        let backend = SysfsBackend::new(dir.path().join("gpio"), dir.path().join("pwm"));
        assert_eq!(backend.missing(), Some(dir.path().join("pwm").join("export")));
    }

    #[test]
    fn simulated_lines_share_a_trace() {
        let backend = SimulatedBackend::new();
        let mut a = backend.output(1).unwrap();
        let mut b = backend.pwm(2).unwrap();
        a.write(true).unwrap();
        b.set_duty(50, 3.2).unwrap();
        a.release().unwrap();

        assert_eq!(
            *backend.trace().lock().unwrap(),
            vec![
                (1, Level::Digital(true)),
                (2, Level::Duty(3.2)),
                (1, Level::Released)
            ]
        );
        assert_eq!(backend.settle(Duration::from_millis(5)), Duration::ZERO);
    }
}
