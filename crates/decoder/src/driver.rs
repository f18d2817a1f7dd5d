//! Decoder driver loop

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{DecodedImage, VideoDecoder, VideoEvent};

/// Drain `events`, feeding `decoder` and handing decoded images to
/// `on_image`.
///
/// Decode errors are logged and never end the loop; the loop ends when
/// the event channel closes.
pub async fn run_decoder<D, F>(
    mut events: mpsc::Receiver<VideoEvent>,
    mut decoder: D,
    mut on_image: F,
) where
    D: VideoDecoder,
    F: FnMut(DecodedImage) + Send,
{
    while let Some(event) = events.recv().await {
        match event {
            VideoEvent::FormatDescription(format) => {
                if let Err(e) = decoder.initialize(format) {
                    warn!(error = %e, "decoder initialization failed");
                }
            }
            VideoEvent::EncodedFrame(frame) => match decoder.submit(frame) {
                Ok(image) => on_image(image),
                Err(e) => warn!(error = %e, "frame decode failed"),
            },
        }
    }
    debug!("video event channel closed, decoder driver exiting");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use super::*;
    use crate::{DecoderError, DecoderResult, FormatDescription};

    struct FakeDecoder {
        initialized: bool,
    }

    impl VideoDecoder for FakeDecoder {
        fn initialize(&mut self, format: FormatDescription) -> DecoderResult<()> {
            assert_eq!(format.nal_unit_header_length, 4);
            self.initialized = true;
            Ok(())
        }

        fn submit(&mut self, frame: Bytes) -> DecoderResult<DecodedImage> {
            if !self.initialized {
                return Err(DecoderError::NotInitialized);
            }
            Ok(DecodedImage {
                data: frame,
                width: 16,
                height: 16,
            })
        }
    }

    #[tokio::test]
    async fn initializes_then_decodes_and_reports_images() {
        let (tx, rx) = mpsc::channel(8);
        let images = Arc::new(AtomicUsize::new(0));
        let images_seen = images.clone();

        let driver = tokio::spawn(run_decoder(
            rx,
            FakeDecoder { initialized: false },
            move |_image| {
                images_seen.fetch_add(1, Ordering::SeqCst);
            },
        ));

        tx.send(VideoEvent::FormatDescription(FormatDescription::new(
            vec![Bytes::from_static(&[1, 2, 3])],
            4,
        )))
        .await
        .unwrap();
        tx.send(VideoEvent::EncodedFrame(Bytes::from_static(b"frame")))
            .await
            .unwrap();
        drop(tx);

        driver.await.unwrap();
        assert_eq!(images.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn decode_errors_are_non_fatal() {
        let (tx, rx) = mpsc::channel(8);
        let images = Arc::new(AtomicUsize::new(0));
        let images_seen = images.clone();

        let driver = tokio::spawn(run_decoder(
            rx,
            FakeDecoder { initialized: false },
            move |_image| {
                images_seen.fetch_add(1, Ordering::SeqCst);
            },
        ));

        // Frame before any format description fails to decode; the loop
        // must survive and decode the next frame after initialization.
        tx.send(VideoEvent::EncodedFrame(Bytes::from_static(b"early")))
            .await
            .unwrap();
        tx.send(VideoEvent::FormatDescription(FormatDescription::new(
            vec![],
            4,
        )))
        .await
        .unwrap();
        tx.send(VideoEvent::EncodedFrame(Bytes::from_static(b"late")))
            .await
            .unwrap();
        drop(tx);

        driver.await.unwrap();
        assert_eq!(images.load(Ordering::SeqCst), 1);
    }
}
