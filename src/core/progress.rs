//! Page-level progress for pagination walks.
//!
//! A fixed-length bar when the server told us how many pages to expect, a
//! spinner otherwise. Purely an observer: walkers report, never wait on it.

use indicatif::{ProgressBar, ProgressStyle};

pub struct PageProgress {
    bar: Option<ProgressBar>,
    pages: u64,
}

impl PageProgress {
    /// # Arguments
    /// * `total_pages` - Expected page count, if the server reported one
    /// * `enabled` - Whether to draw anything at all
    pub fn new(total_pages: Option<u64>, enabled: bool) -> Self {
        let bar = enabled.then(|| match total_pages {
            Some(n) => {
                let bar = ProgressBar::new(n);
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.green} {pos} pages {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        });

        Self { bar, pages: 0 }
    }

    pub fn hidden() -> Self {
        Self::new(None, false)
    }

    /// Records one more page fetched.
    pub fn advance(&mut self) {
        self.pages += 1;
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
