//! Вспомогательные функции и утилиты

use std::time::{Duration, Instant};

/// Измеряет время выполнения функции
pub fn measure_time<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    (result, duration)
}

/// Секундомер с кругами: среднее и стандартное отклонение по кругам
#[derive(Debug, Clone)]
pub struct LapTimer {
    lap_start: Instant,
    laps: Vec<Duration>,
}

impl Default for LapTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl LapTimer {
    pub fn new() -> Self {
        Self {
            lap_start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Завершает текущий круг и начинает следующий
    pub fn next_lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now - self.lap_start;
        self.laps.push(lap);
        self.lap_start = now;
        lap
    }

    /// Перезапускает текущий круг, не записывая его
    pub fn restart_lap(&mut self) {
        self.lap_start = Instant::now();
    }

    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    pub fn total(&self) -> Duration {
        self.laps.iter().sum()
    }

    /// Среднее время круга
    pub fn lap_avg(&self) -> Duration {
        if self.laps.is_empty() {
            return Duration::ZERO;
        }
        self.total() / self.laps.len() as u32
    }

    /// Стандартное отклонение времени круга
    pub fn lap_std(&self) -> Duration {
        if self.laps.len() < 2 {
            return Duration::ZERO;
        }
        let avg = self.lap_avg().as_secs_f64();
        let variance = self
            .laps
            .iter()
            .map(|lap| (lap.as_secs_f64() - avg).powi(2))
            .sum::<f64>()
            / self.laps.len() as f64;
        Duration::from_secs_f64(variance.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_timer_reports_zero() {
        let timer = LapTimer::new();
        assert_eq!(timer.lap_avg(), Duration::ZERO);
        assert_eq!(timer.lap_std(), Duration::ZERO);
    }

    #[test]
    fn laps_are_recorded() {
        let mut timer = LapTimer::new();
        for _ in 0..3 {
            std::thread::sleep(Duration::from_millis(2));
            timer.next_lap();
        }
        assert_eq!(timer.laps().len(), 3);
        assert!(timer.lap_avg() >= Duration::from_millis(2));
        assert!(timer.total() >= Duration::from_millis(6));
    }

    #[test]
    fn measure_time_returns_value() {
        let (value, elapsed) = measure_time(|| 6 * 7);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_secs(1));
    }
}
