//! Async slide decoder: turns load requests into pristine RGBA buffers on
//! blocking threads, with a bounded number of decodes in flight.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::buffer::PixelBuffer;
use crate::error::Error;
use crate::events::{InvalidSlide, LoadSlide, SlideLoaded};

fn decode_rgba8(path: &Path) -> Result<PixelBuffer, Error> {
    let image = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(PixelBuffer::from_image(image.to_rgba8()))
}

/// Decode loop: accepts [`LoadSlide`] requests while under the in-flight
/// limit, emits [`SlideLoaded`] on success and [`InvalidSlide`] on failure.
pub async fn run(
    mut load_rx: Receiver<LoadSlide>,
    loaded_tx: Sender<SlideLoaded>,
    invalid_tx: Sender<InvalidSlide>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let mut in_flight: HashSet<usize> = HashSet::new();
    let mut tasks: JoinSet<(LoadSlide, Result<PixelBuffer, Error>)> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            Some(request) = load_rx.recv(), if in_flight.len() < max_in_flight => {
                if in_flight.insert(request.index) {
                    tasks.spawn(async move {
                        let path = request.path.clone();
                        let res = tokio::task::spawn_blocking(move || decode_rgba8(&path))
                            .await
                            .map_err(|join| Error::Io(std::io::Error::other(join)))
                            .and_then(|res| res);
                        (request, res)
                    });
                }
            }

            Some(join_res) = tasks.join_next() => {
                let Ok((request, res)) = join_res else {
                    continue;
                };
                in_flight.remove(&request.index);
                match res {
                    Ok(buffer) => {
                        debug!(slide = request.index, path = %request.path.display(), "decoded slide");
                        let event = SlideLoaded {
                            index: request.index,
                            buffer: Arc::new(buffer),
                        };
                        if loaded_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(slide = request.index, error = %err, "slide failed to decode");
                        let event = InvalidSlide {
                            index: request.index,
                            path: request.path,
                        };
                        if invalid_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
