use std::io::Write;

use alloy::pubsub::Subscription;
use alloy::rpc::types::eth::Header;
use futures_util::{Stream, StreamExt};

use crate::error::PeekError;

/// Adapts the raw subscription into the event-loop input. Transport failures
/// surface as the stream ending, which the loop turns into a terminal error.
pub fn header_stream(
    subscription: Subscription<Header>,
) -> impl Stream<Item = Result<Header, PeekError>> + Unpin {
    subscription.into_stream().map(Ok)
}

/// The steady state of the process: wait for whichever arrives first, a new
/// header or an error. Headers are printed in arrival order and the loop goes
/// back to waiting; the first error is fatal and nothing queued behind it is
/// processed. Never returns `Ok`.
pub async fn run_header_loop<S, W>(mut headers: S, out: &mut W) -> Result<(), PeekError>
where
    S: Stream<Item = Result<Header, PeekError>> + Unpin,
    W: Write,
{
    while let Some(next) = headers.next().await {
        let header = next?;
        writeln!(out, "New block detected! Block number: {}", header.number)?;
        out.flush()?;
    }
    Err(PeekError::Stream(
        "transport closed the new-heads subscription".to_string(),
    ))
}
