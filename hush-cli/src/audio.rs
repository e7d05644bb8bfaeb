//! Microphone input for `/audio`.
//!
//! Built with the `capture` feature, the default input device is opened at
//! 48 kHz mono, encoded to 20 ms Opus frames and written to the local track.
//! Without it the track is still offered to peers but carries no sound.

#[cfg(feature = "capture")]
pub use mic::MicCapture;

#[cfg(not(feature = "capture"))]
pub struct MicCapture;

#[cfg(not(feature = "capture"))]
impl MicCapture {
    pub fn start(_media: hush_client::LocalMedia) -> anyhow::Result<Self> {
        anyhow::bail!("this build has no microphone support (rebuild with `--features capture`)")
    }
}

#[cfg(feature = "capture")]
mod mic {
    use anyhow::{Context, Result, bail};
    use bytes::Bytes;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{BufferSize, SampleRate, StreamConfig};
    use hush_client::LocalMedia;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tracing::{debug, warn};

    const SAMPLE_RATE: u32 = 48_000;
    const CHANNELS: u16 = 1;
    /// 20 ms at 48 kHz.
    const FRAME_SAMPLES: usize = 960;
    const FRAME: Duration = Duration::from_millis(20);
    const MAX_PACKET: usize = 4000;
    const OPUS_APPLICATION_VOIP: i32 = 2048;
    /// Chunks held between the device callback and the encoder; extra ones are dropped.
    const BUFFERED_CHUNKS: usize = 256;

    /// Running capture. Dropping it closes the device and stops the encoder.
    pub struct MicCapture {
        _stream: cpal::Stream,
    }

    impl MicCapture {
        pub fn start(media: LocalMedia) -> Result<Self> {
            let device = cpal::default_host()
                .default_input_device()
                .context("No input device available")?;
            let config = StreamConfig {
                channels: CHANNELS,
                sample_rate: SampleRate(SAMPLE_RATE),
                buffer_size: BufferSize::Default,
            };

            let (tx, rx) = mpsc::channel::<Vec<f32>>(BUFFERED_CHUNKS);
            let stream = device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let _ = tx.try_send(data.to_vec());
                    },
                    |err| warn!("Audio capture error: {}", err),
                    None,
                )
                .context("Failed to open the microphone at 48 kHz mono")?;
            stream.play().context("Failed to start the microphone")?;

            let encoder = OpusEncoder::new()?;
            tokio::spawn(encode_frames(rx, encoder, media));
            Ok(Self { _stream: stream })
        }
    }

    async fn encode_frames(
        mut chunks: mpsc::Receiver<Vec<f32>>,
        mut encoder: OpusEncoder,
        media: LocalMedia,
    ) {
        let mut pending = Vec::with_capacity(FRAME_SAMPLES * 2);
        while let Some(chunk) = chunks.recv().await {
            pending.extend_from_slice(&chunk);
            while pending.len() >= FRAME_SAMPLES {
                let frame: Vec<f32> = pending.drain(..FRAME_SAMPLES).collect();
                let packet = match encoder.encode(&frame) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("{:#}", e);
                        continue;
                    }
                };
                if let Err(e) = media.write_sample(Bytes::from(packet), FRAME).await {
                    warn!("Failed to write audio frame: {}", e);
                }
            }
        }
        debug!("Microphone closed");
    }

    struct OpusEncoder {
        raw: *mut libopus_sys::OpusEncoder,
    }

    // SAFETY: the encoder is owned by a single task and never shared.
    unsafe impl Send for OpusEncoder {}

    impl OpusEncoder {
        fn new() -> Result<Self> {
            let mut error: i32 = 0;
            let raw = unsafe {
                libopus_sys::opus_encoder_create(
                    SAMPLE_RATE as i32,
                    CHANNELS as i32,
                    OPUS_APPLICATION_VOIP,
                    &mut error,
                )
            };
            if raw.is_null() || error != 0 {
                bail!("Failed to create Opus encoder: error code {}", error);
            }
            Ok(Self { raw })
        }

        /// Encodes exactly one 20 ms frame.
        fn encode(&mut self, frame: &[f32]) -> Result<Vec<u8>> {
            if frame.len() != FRAME_SAMPLES {
                bail!("Opus frame needs {} samples, got {}", FRAME_SAMPLES, frame.len());
            }
            let mut packet = vec![0u8; MAX_PACKET];
            let len = unsafe {
                libopus_sys::opus_encode_float(
                    self.raw,
                    frame.as_ptr(),
                    FRAME_SAMPLES as i32,
                    packet.as_mut_ptr(),
                    packet.len() as i32,
                )
            };
            if len < 0 {
                bail!("Opus encoding failed: error code {}", len);
            }
            packet.truncate(len as usize);
            Ok(packet)
        }
    }

    impl Drop for OpusEncoder {
        fn drop(&mut self) {
            unsafe { libopus_sys::opus_encoder_destroy(self.raw) };
        }
    }

}
