use http::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::StatusCode;

use super::protect::protect;
use super::{Fault, FaultKind, FaultLog};
use crate::context::{handler, Context, Handler};
use crate::error::Error;

/// Middleware that converts a panic in the rest of the chain into an error.
///
/// The downstream chain runs inside [`protect`]. On a panic, a fault record
/// is written to `log` and the handler returns [`Error::Panic`]. Without a
/// panic the downstream result is returned untouched and nothing is logged.
pub fn panic_handler<L>(log: L) -> Handler
where
    L: FaultLog + 'static,
{
    handler(move |ctx: &mut Context| match protect(|| ctx.next()) {
        Ok(result) => result,
        Err(panic) => {
            let err = Error::Panic(panic);
            log.log(&Fault::new(FaultKind::Panic, ctx, &err));
            Err(err)
        }
    })
}

/// Middleware that turns an error from the rest of the chain into a 500 response.
///
/// Any body already buffered is discarded. The response becomes
/// `500 Internal Server Error` with a `text/plain` body of the error text
/// followed by a newline, the fault is logged, and the error is consumed.
pub fn error_handler<L>(log: L) -> Handler
where
    L: FaultLog + 'static,
{
    handler(move |ctx: &mut Context| {
        let Err(err) = ctx.next() else {
            return Ok(());
        };

        let res = ctx.response_mut();
        res.clear_body();
        res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = res.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        res.write_str(&format!("{err}\n"));

        log.log(&Fault::new(FaultKind::Error, ctx, &err));
        Ok(())
    })
}
