use crate::SessionError;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const AUDIO_TRACK_ID: &str = "audio";
const AUDIO_STREAM_ID: &str = "hush";

/// The local audio capture, shared read-only by every session once started.
///
/// Whoever owns the capture device feeds encoded Opus frames through
/// [`LocalMedia::write_sample`]; every connection the track is attached to sends them.
#[derive(Clone)]
pub struct LocalMedia {
    track: Arc<TrackLocalStaticSample>,
}

impl LocalMedia {
    pub fn start() -> Self {
        let track = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            AUDIO_TRACK_ID.to_owned(),
            AUDIO_STREAM_ID.to_owned(),
        );
        Self {
            track: Arc::new(track),
        }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.track)
    }

    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<(), SessionError> {
        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.track.write_sample(&sample).await?;
        Ok(())
    }
}

impl PartialEq for LocalMedia {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.track, &other.track)
    }
}

impl fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMedia")
            .field("track", &AUDIO_TRACK_ID)
            .field("stream", &AUDIO_STREAM_ID)
            .finish()
    }
}
