use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use futures_util::{Stream, StreamExt};
use tokio_util::sync::DropGuard;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wrap encoded frames in a `text/event-stream` response.
///
/// `guard` lives inside the body stream, so dropping the body (client
/// disconnect) cancels the request's token.
pub fn build_sse_response<S>(frames: S, guard: DropGuard, request_id: &str) -> Response<Body>
where
    S: Stream<Item = String> + Send + 'static,
{
    let stream = async_stream::stream! {
        let _guard = guard;
        let mut frames = Box::pin(frames);
        while let Some(frame) = frames.next().await {
            yield Ok::<_, std::convert::Infallible>(frame);
        }
    };

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
