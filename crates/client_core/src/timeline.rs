//! Cooperative timers polled against a [`Clock`](crate::clock::Clock) reading.
//!
//! Nothing here spawns tasks or sleeps: owners call `pop_due`/`ticks_until` from
//! their poll loop with the current time and apply whatever became due.

use std::{collections::VecDeque, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<A> {
    pub delay: Duration,
    pub action: A,
}

impl<A> Step<A> {
    pub fn after(delay: Duration, action: A) -> Self {
        Self { delay, action }
    }

    pub fn after_ms(delay_ms: u64, action: A) -> Self {
        Self::after(Duration::from_millis(delay_ms), action)
    }
}

/// Ordered one-shot steps. Each step's deadline is chained from the previous
/// step's deadline, so a late poll fires the backlog in order and never lets
/// a step start before its predecessor.
#[derive(Debug, Clone)]
pub struct Timeline<A> {
    steps: VecDeque<Step<A>>,
    anchor: Duration,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<A> Timeline<A> {
    pub fn idle() -> Self {
        Self {
            steps: VecDeque::new(),
            anchor: Duration::ZERO,
        }
    }

    pub fn start(steps: impl IntoIterator<Item = Step<A>>, now: Duration) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            anchor: now,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.steps.front().map(|step| self.anchor + step.delay)
    }

    /// Pops the next step if its deadline is at or before `now`, returning the deadline it was due at.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, A)> {
        let deadline = self.next_deadline()?;
        if deadline > now {
            return None;
        }
        let step = self.steps.pop_front()?;
        self.anchor = deadline;
        Some((deadline, step.action))
    }

    pub fn cancel(&mut self) {
        self.steps.clear();
    }
}

/// Fixed-period repeating timer.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Option<Duration>,
}

impl Ticker {
    pub fn stopped(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn start(period: Duration, now: Duration) -> Self {
        Self {
            period,
            next: Some(now + period),
        }
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.next
    }

    /// Consumes every tick scheduled at or before `now` and returns how many there were.
    pub fn ticks_until(&mut self, now: Duration) -> u32 {
        let Some(mut next) = self.next else {
            return 0;
        };
        if self.period.is_zero() {
            return 0;
        }

        let mut ticks = 0;
        while next <= now {
            ticks += 1;
            next += self.period;
        }
        self.next = Some(next);
        ticks
    }

    pub fn stop(&mut self) {
        self.next = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_chains_deadlines_from_previous_step() {
        let mut timeline = Timeline::start(
            vec![Step::after_ms(100, "a"), Step::after_ms(50, "b")],
            Duration::from_millis(1_000),
        );

        assert_eq!(timeline.pop_due(Duration::from_millis(1_099)), None);
        assert_eq!(
            timeline.pop_due(Duration::from_millis(1_100)),
            Some((Duration::from_millis(1_100), "a"))
        );
        assert_eq!(timeline.next_deadline(), Some(Duration::from_millis(1_150)));
    }

    #[test]
    fn late_poll_drains_backlog_in_order() {
        let mut timeline = Timeline::start(
            vec![
                Step::after_ms(10, 1),
                Step::after_ms(10, 2),
                Step::after_ms(10, 3),
            ],
            Duration::ZERO,
        );

        let now = Duration::from_millis(25);
        let mut fired = Vec::new();
        while let Some((_, action)) = timeline.pop_due(now) {
            fired.push(action);
        }
        assert_eq!(fired, vec![1, 2]);
        assert!(timeline.is_running());

        timeline.cancel();
        assert!(!timeline.is_running());
        assert_eq!(timeline.pop_due(Duration::from_secs(60)), None);
    }

    #[test]
    fn ticker_counts_elapsed_periods_once() {
        let mut ticker = Ticker::start(Duration::from_millis(100), Duration::ZERO);
        assert_eq!(ticker.ticks_until(Duration::from_millis(99)), 0);
        assert_eq!(ticker.ticks_until(Duration::from_millis(350)), 3);
        assert_eq!(ticker.ticks_until(Duration::from_millis(350)), 0);
        assert_eq!(ticker.next_deadline(), Some(Duration::from_millis(400)));

        ticker.stop();
        assert_eq!(ticker.ticks_until(Duration::from_secs(10)), 0);
    }
}
