//! Borrowed multi-channel waveform views.
//!
//! `ChannelView` interprets a flat row-major buffer as `n_channels` rows of
//! `n_samples` elements each. Templates, per-channel tables and the
//! continuous data all share this layout; only the meaning of a "channel"
//! differs (a `(template, station, component)` triple or a
//! `(station, component)` pair). Windows are zero-copy sub-slices of a row.

use crate::util::math::checked_len;
use crate::util::{MatchedFilterError, MatchedFilterResult};

/// Borrowed `[n_channels, n_samples]` view into a contiguous buffer.
#[derive(Copy, Clone, Debug)]
pub struct ChannelView<'a, T> {
    data: &'a [T],
    n_channels: usize,
    n_samples: usize,
}

impl<'a, T> ChannelView<'a, T> {
    /// Creates a view, requiring `data.len() == n_channels * n_samples`.
    ///
    /// `buffer` names the argument in the returned error.
    pub fn new(
        data: &'a [T],
        n_channels: usize,
        n_samples: usize,
        buffer: &'static str,
    ) -> MatchedFilterResult<Self> {
        let expected = checked_len(&[n_channels, n_samples], buffer)?;
        if data.len() != expected {
            return Err(MatchedFilterError::DimensionMismatch {
                buffer,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            n_channels,
            n_samples,
        })
    }

    /// Number of channels (rows).
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Samples per channel.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the samples of `channel`.
    pub fn channel(&self, channel: usize) -> Option<&'a [T]> {
        if channel >= self.n_channels {
            return None;
        }
        let start = channel * self.n_samples;
        self.data.get(start..start + self.n_samples)
    }

    /// Returns `len` samples of `channel` starting at `start`.
    ///
    /// `start` is signed so that negative moveout shifts can be expressed;
    /// windows that leave `[0, n_samples)` yield `None`.
    pub fn window(&self, channel: usize, start: i64, len: usize) -> Option<&'a [T]> {
        let start = usize::try_from(start).ok()?;
        let end = start.checked_add(len)?;
        if end > self.n_samples {
            return None;
        }
        self.channel(channel)?.get(start..end)
    }
}
