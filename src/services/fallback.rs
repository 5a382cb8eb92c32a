use std::fmt::Display;
use std::future::Future;

/// How a failed primary call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Substitute the fallback value and carry on.
    Recoverable,
    /// Surface the error to the caller.
    Fatal,
}

/// Which branch produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Primary,
    Fallback,
}

/// Runs `primary`; on an error that `classify` deems recoverable, returns `fallback()` instead.
pub async fn with_fallback<T, E, P, F, C>(
    label: &str,
    primary: P,
    fallback: F,
    classify: C,
) -> Result<(T, Outcome), E>
where
    P: Future<Output = Result<T, E>>,
    F: FnOnce() -> T,
    C: Fn(&E) -> Recovery,
    E: Display,
{
    match primary.await {
        Ok(value) => Ok((value, Outcome::Primary)),
        Err(err) => match classify(&err) {
            Recovery::Recoverable => {
                log::warn!("{}: {}; using fallback", label, err);
                Ok((fallback(), Outcome::Fallback))
            }
            Recovery::Fatal => {
                log::error!("{}: {}", label, err);
                Err(err)
            }
        },
    }
}

/// Classifier for call sites where every failure degrades gracefully.
pub fn always_recoverable<E>(_: &E) -> Recovery {
    Recovery::Recoverable
}
