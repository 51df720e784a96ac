// Purpose - the render boundary between the engine and whatever drives it

#[cfg(feature = "cpal")]
pub mod cpal_output;

/// Something an audio callback can pull mono samples from.
///
/// `render` is called on the real-time thread with whatever length the
/// platform chose. Implementations must fill the whole buffer and must not
/// allocate, block or fail.
pub trait AudioRenderer: Send {
    fn render(&mut self, buffer: &mut [f32]);
    fn sample_rate(&self) -> f32;
}

/// Drive a renderer without a device: `frames` samples in callbacks of
/// `block_size`.
pub fn render_offline<R: AudioRenderer + ?Sized>(
    renderer: &mut R,
    frames: usize,
    block_size: usize,
) -> Vec<f32> {
    let mut out = vec![0.0f32; frames];
    for block in out.chunks_mut(block_size.max(1)) {
        renderer.render(block);
    }
    out
}

/// Copy a mono block to every channel of an interleaved buffer.
pub fn interleave(mono: &[f32], out: &mut [f32], channels: usize) {
    let channels = channels.max(1);
    for (frame, &s) in out.chunks_mut(channels).zip(mono.iter()) {
        frame.fill(s);
    }
}
