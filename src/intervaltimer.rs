use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub struct IntervalTimer {
    interval: Duration,
    next_tick: Instant,
    thread_name: String,
    measure_rate: bool,
    last_rate_print: Instant,
    ticks: u32,
}

impl IntervalTimer {
    pub fn new(interval: Duration, measure_rate: bool) -> IntervalTimer {
        let cur_thread = thread::current();
        let thread_name = if let Some(name) = cur_thread.name() {
            name
        } else {
            "unnamed"
        };

        IntervalTimer {
            interval,
            next_tick: Instant::now() + interval,
            thread_name: thread_name.to_string(),
            measure_rate,
            last_rate_print: Instant::now(),
            ticks: 0,
        }
    }

    /// Parks the current thread until the next tick is due.
    ///
    /// Returns `false` as soon as `running` is observed cleared, so whoever
    /// clears it should unpark this thread.
    pub fn sleep_until_next_tick(&mut self, running: &AtomicBool) -> bool {
        if self.measure_rate {
            self.update_rate();
        }

        let now = Instant::now();
        if self.next_tick <= now {
            log::debug!("{} skipped a tick", self.thread_name);
            self.next_tick = now + self.interval;
        }

        loop {
            if !running.load(Ordering::Acquire) {
                return false;
            }

            let now = Instant::now();
            if now >= self.next_tick {
                break;
            }
            thread::park_timeout(self.next_tick - now);
        }

        self.next_tick += self.interval;
        running.load(Ordering::Acquire)
    }

    fn update_rate(&mut self) {
        self.ticks += 1;

        if Instant::now() - self.last_rate_print > Duration::from_secs(1) {
            log::debug!("{} ticks/s: {}", self.thread_name, self.ticks);
            self.ticks = 0;
            self.last_rate_print = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn sleeps_roughly_one_interval() {
        let running = AtomicBool::new(true);
        let mut timer = IntervalTimer::new(Duration::from_millis(20), false);

        let start = Instant::now();
        assert!(timer.sleep_until_next_tick(&running));
        assert!(timer.sleep_until_next_tick(&running));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn returns_immediately_when_not_running() {
        let running = AtomicBool::new(false);
        let mut timer = IntervalTimer::new(Duration::from_secs(10), false);

        let start = Instant::now();
        assert!(!timer.sleep_until_next_tick(&running));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wakes_up_when_stopped_and_unparked() {
        let running = Arc::new(AtomicBool::new(true));
        let sleeper_running = Arc::clone(&running);
        let sleeper = thread::spawn(move || {
            let mut timer = IntervalTimer::new(Duration::from_secs(10), false);
            timer.sleep_until_next_tick(&sleeper_running)
        });

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        running.store(false, Ordering::Release);
        sleeper.thread().unpark();

        assert!(!sleeper.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
