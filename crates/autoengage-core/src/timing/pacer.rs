use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use autoengage_protocols::Page;

use super::{Clock, RandomSource};

/// Human-like pacing on top of an injectable clock and random source.
#[derive(Clone)]
pub struct HumanPacer {
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
}

impl HumanPacer {
    pub fn new(clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        Self { clock, rng }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn rng(&self) -> &Arc<dyn RandomSource> {
        &self.rng
    }

    /// Fixed delay.
    pub async fn wait(&self, ms: u64) {
        self.clock.sleep(Duration::from_millis(ms.max(1))).await;
    }

    /// Bounded random delay in `[min_ms, max_ms)`. Never zero.
    pub async fn delay(&self, min_ms: u64, max_ms: u64) {
        let d = self.rng.millis_between(min_ms, max_ms);
        self.clock.sleep(d.max(Duration::from_millis(1))).await;
    }

    /// Spend `[min_ms, max_ms)` in irregular 1.2-3.7s segments, fidgeting
    /// with the mouse (40%) and the scroll position (30%) after each one.
    ///
    /// Fidget failures are ignored.
    pub async fn human_pause(&self, page: &dyn Page, min_ms: u64, max_ms: u64) {
        let (lo, hi) = if max_ms < min_ms {
            (max_ms, min_ms)
        } else {
            (min_ms, max_ms)
        };
        let total = (self.rng.between(lo as f64, hi as f64).floor() as u64).max(1);
        let mut elapsed = 0u64;

        while elapsed < total {
            let segment = (total - elapsed).min(1200 + (self.rng.next_f64() * 2500.0).floor() as u64);
            self.clock.sleep(Duration::from_millis(segment)).await;
            elapsed += segment;

            if self.rng.chance(0.4) {
                let x = 200.0 + (self.rng.next_f64() * 800.0).floor();
                let y = 200.0 + (self.rng.next_f64() * 500.0).floor();
                if let Err(e) = page.mouse_move(x, y).await {
                    debug!(error = %e, "Pause mouse move failed");
                }
            }

            if self.rng.chance(0.3) {
                let delta = (self.rng.next_f64() - 0.5) * 300.0;
                if let Err(e) = page.scroll_by(delta).await {
                    debug!(error = %e, "Pause scroll failed");
                }
            }
        }
    }

    /// Type `text` into the focused element one character at a time.
    ///
    /// 500-1500ms before, 50-200ms per character with a 10% chance of an
    /// extra 200-1000ms hesitation, 500-2000ms after.
    pub async fn type_like_human(
        &self,
        page: &dyn Page,
        text: &str,
    ) -> Result<(), autoengage_protocols::PageError> {
        self.delay(500, 1500).await;
        self.type_chars(page, text).await?;
        self.delay(500, 2000).await;
        Ok(())
    }

    /// Per-character typing without the surrounding pauses.
    pub async fn type_chars(
        &self,
        page: &dyn Page,
        text: &str,
    ) -> Result<(), autoengage_protocols::PageError> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            page.type_text(ch.encode_utf8(&mut buf)).await?;
            self.delay(50, 200).await;
            if self.rng.chance(0.1) {
                self.delay(200, 1000).await;
            }
        }
        Ok(())
    }

    /// Type at a steady cadence, `per_char_ms` after every character.
    pub async fn type_steady(
        &self,
        page: &dyn Page,
        text: &str,
        per_char_ms: u64,
    ) -> Result<(), autoengage_protocols::PageError> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            page.type_text(ch.encode_utf8(&mut buf)).await?;
            self.wait(per_char_ms).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pacer_tests.rs"]
mod tests;
