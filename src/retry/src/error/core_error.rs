// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::rpc::{Code, Status};
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The core error returned by the retry loops and the clients built on them.
///
/// The client libraries report errors from multiple sources. For example, the
/// service may return an error, the transport may be unable to create the
/// necessary connection to make a request, the request may timeout before a
/// response is received, or the retry policy may be exhausted.
///
/// Most applications will just return the error or log it, without any further
/// action. However, some applications may need to interrogate the error
/// details. This type offers a series of predicates to determine the error
/// kind. Errors that end a retry loop keep the last attempt's error as their
/// [source][std::error::Error::source].
///
/// # Example
/// ```
/// use google_cloud_retry::error::Error;
/// match example_function() {
///     Err(e) if e.is_exhausted() => { println!("too many failures: {e}"); },
///     Err(e) if e.is_timeout() => { println!("not enough time {e}"); },
///     Err(e) => { println!("some other error {e}"); },
///     Ok(_) => { println!("success, how boring"); },
/// }
///
/// fn example_function() -> Result<String, Error> {
///     // ... details omitted ...
///     # use google_cloud_retry::error::rpc::{Code, Status};
///     # Err(Error::service(Status::default().set_code(Code::NotFound).set_message("NOT FOUND")))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

/// Why a retry or polling loop gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoopTermination {
    /// The request is not idempotent, the loop never retries it.
    NonIdempotent,
    /// The last error cannot be fixed by trying again.
    Permanent,
    /// The retry policy does not allow more attempts.
    Exhausted,
    /// The polling policy does not allow more polls.
    PollingExhausted,
}

impl LoopTermination {
    /// The phrase used to annotate the error message.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NonIdempotent => "non-idempotent operation failed",
            Self::Permanent => "permanent failure",
            Self::Exhausted => "retry policy exhausted",
            Self::PollingExhausted => "polling policy exhausted",
        }
    }
}

impl std::fmt::Display for LoopTermination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

impl Error {
    /// Creates an error with the information returned by Google Cloud services.
    ///
    /// # Example
    /// ```
    /// use google_cloud_retry::error::Error;
    /// use google_cloud_retry::error::rpc::{Code, Status};
    /// let status = Status::default().set_code(Code::NotFound).set_message("NOT FOUND");
    /// let error = Error::service(status.clone());
    /// assert_eq!(error.status(), Some(&status));
    /// ```
    pub fn service(status: Status) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(status)),
            source: None,
        }
    }

    /// Creates an error representing a timeout.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use google_cloud_retry::error::Error;
    /// let error = Error::timeout("simulated timeout");
    /// assert!(error.is_timeout());
    /// assert!(error.source().is_some());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// The request could not be completed before its deadline.
    ///
    /// This is always a client-side generated error. Note that the request may
    /// or may not have started, and it may or may not complete in the service.
    /// The retry policies treat it as a `DEADLINE_EXCEEDED` error.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// A problem in the transport layer without a full response.
    ///
    /// Examples include: a broken connection after the request is sent, or a
    /// connection that could not be established.
    ///
    /// # Example
    /// ```
    /// use google_cloud_retry::error::Error;
    /// let error = Error::io("connection reset");
    /// assert!(error.is_io());
    /// ```
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Io,
            source: Some(source.into()),
        }
    }

    /// The transport failed before the service returned a status.
    ///
    /// # Troubleshooting
    ///
    /// This type of error is rare, but includes crashes and restarts on proxies
    /// and load balancers. The retry policies treat it as an `UNAVAILABLE`
    /// error, but it is only retried if the request is idempotent.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error representing a cancelled operation.
    ///
    /// Completion queue timers fail with this error when the queue shuts down.
    pub fn cancelled<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: Some(source.into()),
        }
    }

    /// The operation was cancelled before it completed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Creates an error that does not fit any other category.
    pub fn other<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Other,
            source: Some(source.into()),
        }
    }

    /// Creates the error returned when a retry or polling loop stops.
    ///
    /// The annotated status has the code of the last attempt and a message
    /// prefixed with the operation label and the termination reason.
    pub(crate) fn terminated(reason: LoopTermination, location: &str, last: Error) -> Self {
        let status = Status::new(
            last.code(),
            format!(
                "{location}: {}, last failure: {}",
                reason.reason(),
                last.message()
            ),
        );
        Self {
            kind: ErrorKind::Terminated(Box::new(Termination { reason, status })),
            source: Some(Box::new(last)),
        }
    }

    /// The retry or polling policy did not allow more attempts.
    ///
    /// This is always a client-side generated error, but it may be the result
    /// of multiple errors received from the service.
    ///
    /// # Troubleshooting
    ///
    /// The most common cause of this problem is a transient problem that lasts
    /// longer than your retry policy. If your application can tolerate longer
    /// recovery times then extend the retry policy.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self.termination(),
            Some(LoopTermination::Exhausted | LoopTermination::PollingExhausted)
        )
    }

    /// The retry loop stopped because the last error is not retryable.
    pub fn is_permanent(&self) -> bool {
        self.termination() == Some(LoopTermination::Permanent)
    }

    /// The retry loop stopped because the request is not idempotent.
    ///
    /// # Troubleshooting
    ///
    /// The request may or may not have completed in the service. Consider
    /// adding preconditions to make the request idempotent, or configure a
    /// policy that retries all requests if your application tolerates
    /// duplicate effects.
    pub fn is_non_idempotent(&self) -> bool {
        self.termination() == Some(LoopTermination::NonIdempotent)
    }

    /// If this error ended a retry or polling loop, the reason why.
    pub fn termination(&self) -> Option<LoopTermination> {
        match &self.kind {
            ErrorKind::Terminated(t) => Some(t.reason),
            _ => None,
        }
    }

    /// The [Status] payload associated with this error.
    ///
    /// For errors returned by a retry loop this is the annotated status: the
    /// code of the last attempt and a message including the operation label
    /// and the termination reason.
    ///
    /// # Examples
    /// ```
    /// use google_cloud_retry::error::{Error, rpc::{Code, Status}};
    /// let error = Error::service(Status::default().set_code(Code::NotFound));
    /// if let Some(status) = error.status() {
    ///     if status.code == Code::NotFound {
    ///         println!("cannot find the thing");
    ///     }
    /// }
    /// ```
    pub fn status(&self) -> Option<&Status> {
        match &self.kind {
            ErrorKind::Service(s) => Some(s.as_ref()),
            ErrorKind::Terminated(t) => Some(&t.status),
            _ => None,
        }
    }

    /// The status code used to classify this error.
    ///
    /// Errors that do not carry a status map to the closest code: I/O errors
    /// are `UNAVAILABLE`, timeouts are `DEADLINE_EXCEEDED`.
    pub fn code(&self) -> Code {
        match &self.kind {
            ErrorKind::Service(s) => s.code,
            ErrorKind::Terminated(t) => t.status.code,
            ErrorKind::Io => Code::Unavailable,
            ErrorKind::Timeout => Code::DeadlineExceeded,
            ErrorKind::Cancelled => Code::Cancelled,
            ErrorKind::Other => Code::Unknown,
        }
    }

    fn message(&self) -> String {
        match self.status() {
            Some(s) => s.message.clone(),
            None => self.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Service(s), _) => {
                write!(
                    f,
                    "the service reports an error with code {} described as: {}",
                    s.code, s.message
                )
            }
            (ErrorKind::Terminated(t), _) => {
                write!(
                    f,
                    "the request failed with code {} described as: {}",
                    t.status.code, t.status.message
                )
            }
            (ErrorKind::Timeout, Some(e)) => {
                write!(f, "the request exceeded the request deadline {e}")
            }
            (ErrorKind::Io, Some(e)) => write!(f, "the transport reports an error: {e}"),
            (ErrorKind::Cancelled, Some(e)) => write!(f, "the operation was cancelled: {e}"),
            (ErrorKind::Other, Some(e)) => {
                write!(f, "an unclassified problem making a request: {e}")
            }
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error))
    }
}

/// The type of error held by an [Error] instance.
#[derive(Debug)]
enum ErrorKind {
    Service(Box<Status>),
    Io,
    Timeout,
    Cancelled,
    Terminated(Box<Termination>),
    /// A uncategorized error.
    Other,
}

#[derive(Debug)]
struct Termination {
    reason: LoopTermination,
    status: Status,
}
