use crate::message::{Activity, FormState, Message};
use futures_core::stream::Stream;
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream helpers for the streams a [`FormEngine`](crate::FormEngine) hands
/// out.
pub trait FormStreamExt: Stream {
    /// Yields items up to and including the first one `test` accepts, then
    /// ends.
    ///
    /// ```
    /// use formrx::{FormStreamExt, FormState};
    /// # async fn render(states: impl futures_core::Stream<Item = FormState>) {
    /// let until_done = states.stop_if(|state| state.is_complete());
    /// # }
    /// ```
    fn stop_if<F>(self, test: F) -> StopIf<Self, F>
    where
        F: FnMut(&Self::Item) -> bool,
        Self: Sized,
    {
        StopIf {
            stream: self,
            stopped: false,
            test,
        }
    }

    /// Ends after the first settled submission of a [`FormState`] stream.
    fn until_complete(self) -> StopIf<Self, fn(&FormState) -> bool>
    where
        Self: Stream<Item = FormState> + Sized,
    {
        self.stop_if(FormState::is_complete as fn(&FormState) -> bool)
    }
}

impl<T: ?Sized> FormStreamExt for T where T: Stream {}

/// Returns true for the activity that closes a submission round: loading
/// falling back to false, or a rejected submit (which never sets loading).
pub fn ends_round<T>(activity: &Activity<T>) -> bool {
    matches!(
        activity,
        Activity::Loading(false) | Activity::Message(Message::InvalidInput)
    )
}

/// Created by [`FormStreamExt::stop_if`].
#[pin_project(project = StopIfProj)]
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct StopIf<S, F> {
    #[pin]
    stream: S,
    stopped: bool,
    test: F,
}

impl<S, F> Stream for StopIf<S, F>
where
    S: Stream,
    F: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let StopIfProj {
            stream,
            stopped,
            test,
        } = self.project();

        if *stopped {
            return Poll::Ready(None);
        }
        match stream.poll_next(cx) {
            Poll::Ready(Some(item)) => {
                *stopped = test(&item);
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                *stopped = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
