//! Per-channel byte storage.

use std::io::{self, Write};

/// One byte buffer per antenna channel, all of the same length.
///
/// Samples are opaque `sample_width`-byte groups; offsets are always computed in
/// samples and scaled here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBuffers {
    channels: Vec<Vec<u8>>,
    sample_width: usize,
}

impl ChannelBuffers {
    /// Allocate `channels` zeroed buffers of `samples_per_channel` samples each.
    pub fn new(channels: usize, sample_width: usize, samples_per_channel: usize) -> Self {
        Self {
            channels: vec![vec![0u8; samples_per_channel * sample_width]; channels],
            sample_width,
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Bytes per sample.
    pub fn sample_width(&self) -> usize {
        self.sample_width
    }

    /// Capacity of every channel, in samples.
    pub fn samples_per_channel(&self) -> usize {
        match self.channels.first() {
            Some(ch) if self.sample_width > 0 => ch.len() / self.sample_width,
            _ => 0,
        }
    }

    /// Capacity of every channel, in bytes.
    pub fn bytes_per_channel(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Raw bytes of one channel.
    pub fn channel(&self, ch: usize) -> &[u8] {
        &self.channels[ch]
    }

    /// Mutable raw bytes of one channel.
    pub fn channel_mut(&mut self, ch: usize) -> &mut [u8] {
        &mut self.channels[ch]
    }

    /// All channels, in order.
    pub fn as_slices(&self) -> &[Vec<u8>] {
        &self.channels
    }

    /// Copy `samples` samples from every channel of `block`, starting at sample
    /// `src_offset`, into sample position `dst_offset`.
    ///
    /// Channels missing from `block`, or shorter than requested, copy what they have.
    /// Writes never extend past the end of a channel.
    pub fn copy_from<C: AsRef<[u8]>>(
        &mut self,
        block: &[C],
        src_offset: usize,
        dst_offset: usize,
        samples: usize,
    ) {
        let width = self.sample_width;
        for (dst, src) in self.channels.iter_mut().zip(block) {
            let src = src.as_ref();
            let src_start = (src_offset * width).min(src.len());
            let dst_start = (dst_offset * width).min(dst.len());
            let len = (samples * width)
                .min(src.len() - src_start)
                .min(dst.len() - dst_start);
            dst[dst_start..dst_start + len].copy_from_slice(&src[src_start..src_start + len]);
        }
    }

    /// Write every channel back-to-back in channel order, no header.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for ch in &self.channels {
            out.write_all(ch)?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_reported_in_samples_and_bytes() {
        let bufs = ChannelBuffers::new(3, 8, 100);
        assert_eq!(bufs.channel_count(), 3);
        assert_eq!(bufs.samples_per_channel(), 100);
        assert_eq!(bufs.bytes_per_channel(), 800);
    }

    #[test]
    fn copy_from_uses_sample_offsets() {
        let mut bufs = ChannelBuffers::new(2, 4, 4);
        let block = vec![(0u8..16).collect::<Vec<u8>>(), (100u8..116).collect()];

        // samples 1..3 of the block land at samples 2..4
        bufs.copy_from(&block, 1, 2, 2);

        assert_eq!(&bufs.channel(0)[..8], &[0; 8]);
        assert_eq!(&bufs.channel(0)[8..], &block[0][4..12]);
        assert_eq!(&bufs.channel(1)[8..], &block[1][4..12]);
    }

    #[test]
    fn copy_from_clamps_at_channel_end() {
        let mut bufs = ChannelBuffers::new(1, 4, 2);
        let block = [vec![0xAB; 64]];
        bufs.copy_from(&block, 0, 1, 10);
        assert_eq!(bufs.channel(0), &[0, 0, 0, 0, 0xAB, 0xAB, 0xAB, 0xAB]);
    }

    #[test]
    fn write_to_is_channel_major() {
        let mut bufs = ChannelBuffers::new(2, 4, 1);
        bufs.channel_mut(0).copy_from_slice(&[1, 2, 3, 4]);
        bufs.channel_mut(1).copy_from_slice(&[5, 6, 7, 8]);

        let mut out = Vec::new();
        bufs.write_to(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
