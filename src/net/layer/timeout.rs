use std::convert::Infallible;
use std::time::Duration;
use std::task::{Context, Poll};
use std::pin::Pin;
use std::future::Future;

use tower::{Layer, Service};
use tokio::time::Sleep;
use pin_project::pin_project;

use crate::net::error;

/// the request ran past the configured limit. routes never fail on their
/// own so this is the only error the layer produces
#[derive(Debug)]
pub struct Elapsed(Duration);

impl Elapsed {
    pub fn limit(&self) -> Duration {
        self.0
    }
}

impl From<Elapsed> for error::Error {
    fn from(err: Elapsed) -> Self {
        error::Error::api((
            error::GeneralKind::Timeout,
            format!("request took longer than {}ms to complete", err.limit().as_millis())
        ))
    }
}

#[pin_project]
pub struct TimeoutFuture<F> {
    #[pin]
    response: F,
    #[pin]
    sleep: Sleep,
    limit: Duration,
}

impl<F, Response> Future for TimeoutFuture<F>
where
    F: Future<Output = Result<Response, Infallible>>,
{
    type Output = Result<Response, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(result) = this.response.poll(cx) {
            return Poll::Ready(result.map_err(|never| match never {}));
        }

        match this.sleep.poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(Elapsed(*this.limit))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Timeout<S> {
    inner: S,
    timeout: Duration,
}

impl<S, Request> Service<Request> for Timeout<S>
where
    S: Service<Request, Error = Infallible>,
{
    type Response = S::Response;
    type Error = Elapsed;
    type Future = TimeoutFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(|never| match never {})
    }

    fn call(&mut self, request: Request) -> Self::Future {
        TimeoutFuture {
            response: self.inner.call(request),
            sleep: tokio::time::sleep(self.timeout),
            limit: self.timeout,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    pub fn new(timeout: Duration) -> Self {
        TimeoutLayer { timeout }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = Timeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Timeout {
            inner,
            timeout: self.timeout,
        }
    }
}
