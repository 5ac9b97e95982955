use embedded_time::duration::Milliseconds;
use embedded_time::Instant;

/// A duration, in milliseconds
pub type Millis = embedded_time::duration::Milliseconds<u64>;

/// Supertrait of [`embedded_time::Clock`] pinning the
/// type of "ticks" to u64
pub trait Clock: embedded_time::Clock<T = u64> {}
impl<C: embedded_time::Clock<T = u64>> Clock for C {}

/// Milliseconds elapsed since a clock's epoch.
///
/// The engine's timers and observation bookkeeping all speak this
/// unit rather than carrying `Instant<C>` (and with it the clock
/// type parameter) through every struct.
pub fn since_epoch<C: Clock>(instant: Instant<C>) -> Millis {
  Millis::try_from(instant.duration_since_epoch()).unwrap_or(Milliseconds(u64::MAX))
}

#[cfg(test)]
mod tests {
  use embedded_time::rate::Fraction;
  use embedded_time::Instant;

  use super::*;

  struct MillisClock;
  impl embedded_time::Clock for MillisClock {
    type T = u64;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1000);

    fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
      Ok(Instant::new(0))
    }
  }

  #[test]
  fn since_epoch_converts_ticks() {
    let instant = Instant::<MillisClock>::new(1500);
    assert_eq!(since_epoch(instant), Milliseconds::<u64>(1500));
  }
}
