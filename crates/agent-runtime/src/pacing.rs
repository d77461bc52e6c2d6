//! Reply Pacing
//!
//! Replays an already complete reply as word fragments at a fixed pace so a
//! chat UI can render it progressively. This is presentation only: the model
//! has finished generating before the first fragment is sent.

use std::time::Duration;

use futures::Stream;
use tokio_stream::StreamExt;

/// Pace used by the chat socket
pub const DEFAULT_FRAGMENT_DELAY: Duration = Duration::from_millis(50);

/// Split `text` on spaces into fragments that concatenate back to `text`;
/// every fragment after the first carries its leading space, and newlines
/// stay inside the fragment they appear in
pub fn fragments(text: &str) -> Vec<String> {
    text.split(' ')
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                word.to_owned()
            } else {
                format!(" {word}")
            }
        })
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Finite stream of [`fragments`] with `delay` between consecutive items
pub fn paced_fragments(text: &str, delay: Duration) -> impl Stream<Item = String> + Send + use<> {
    tokio_stream::iter(fragments(text)).throttle(delay)
}
